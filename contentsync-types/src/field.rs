//! Field kinds declared by table specs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of source field kinds the extractor understands.
///
/// Each kind also accepts the source API's own type name as an alias
/// (`rich_text`, `select`, `multi_select`, `checkbox`, `relation`), so table
/// definitions can be written in either vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Title,
    #[serde(alias = "rich_text")]
    Text,
    #[serde(alias = "select")]
    EnumSingle,
    #[serde(alias = "multi_select")]
    EnumMulti,
    Number,
    #[serde(alias = "checkbox")]
    Boolean,
    Date,
    Url,
    #[serde(alias = "relation")]
    RelationIds,
}

impl FieldKind {
    /// All kinds, in declaration order.
    pub const ALL: [FieldKind; 9] = [
        FieldKind::Title,
        FieldKind::Text,
        FieldKind::EnumSingle,
        FieldKind::EnumMulti,
        FieldKind::Number,
        FieldKind::Boolean,
        FieldKind::Date,
        FieldKind::Url,
        FieldKind::RelationIds,
    ];

    /// Canonical snake_case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Title => "title",
            FieldKind::Text => "text",
            FieldKind::EnumSingle => "enum_single",
            FieldKind::EnumMulti => "enum_multi",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Date => "date",
            FieldKind::Url => "url",
            FieldKind::RelationIds => "relation_ids",
        }
    }

    /// Key under which the source stores this kind's payload inside a
    /// property container.
    #[must_use]
    pub const fn source_key(&self) -> &'static str {
        match self {
            FieldKind::Title => "title",
            FieldKind::Text => "rich_text",
            FieldKind::EnumSingle => "select",
            FieldKind::EnumMulti => "multi_select",
            FieldKind::Number => "number",
            FieldKind::Boolean => "checkbox",
            FieldKind::Date => "date",
            FieldKind::Url => "url",
            FieldKind::RelationIds => "relation",
        }
    }

    /// Whether extraction yields a list of strings.
    #[must_use]
    pub const fn is_multi_valued(&self) -> bool {
        matches!(self, FieldKind::EnumMulti | FieldKind::RelationIds)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s || k.source_key() == s)
            .ok_or_else(|| crate::Error::UnknownFieldKind(s.to_string()))
    }
}
