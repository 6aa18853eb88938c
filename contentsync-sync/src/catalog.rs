//! Built-in table catalog for the website content cache.
//!
//! Each entry mirrors one source database. The runner uses this catalog unless
//! its configuration file declares `[[tables]]` of its own.

use crate::spec::TableSyncSpec;
use contentsync_types::FieldKind::{
    Boolean, Date, EnumMulti, EnumSingle, Number, Text, Title, Url,
};

pub const DEFAULT_AUTHOR: &str = "Kaidyn Brownlie";

pub fn blog_posts() -> TableSyncSpec {
    TableSyncSpec::new("content_blog_posts", "NOTION_BLOG_POSTS_DB_ID")
        .with_label("blog post")
        .column("title", "Title", Title)
        .column("slug", "Slug", Text)
        .column("excerpt", "Excerpt", Text)
        .column("content", "Content", Text)
        .column("category", "Category", EnumSingle)
        .column("tags", "Tags", EnumMulti)
        .column_or("author", "Author", Text, DEFAULT_AUTHOR)
        .column("publish_date", "Publish Date", Date)
        .column("read_time", "Read Time", Number)
        .column("featured", "Featured", Boolean)
        .column("image_url", "Image URL", Url)
        .column("meta_description", "Meta Description", Text)
}

pub fn services() -> TableSyncSpec {
    TableSyncSpec::new("content_services", "NOTION_SERVICES_DB_ID")
        .with_label("service")
        .column("name", "Name", Title)
        .column("slug", "Slug", Text)
        .column("short_description", "Short Description", Text)
        .column("full_description", "Full Description", Text)
        .column("service_category", "Service Category", EnumSingle)
        .column("features", "Features", EnumMulti)
        .column("process_steps", "Process Steps", Text)
        .column("pricing_info", "Pricing Info", Text)
        .column("icon", "Icon", Text)
        .column("image_url", "Image URL", Url)
        .column("meta_title", "Meta Title", Text)
        .column("meta_description", "Meta Description", Text)
        .column_or("display_order", "Display Order", Number, 0i64)
        .column("featured", "Featured", Boolean)
        .column("service_tags", "Service Tags", EnumMulti)
}

pub fn suburbs() -> TableSyncSpec {
    TableSyncSpec::new("content_suburbs", "NOTION_SUBURBS_DB_ID")
        .with_label("suburb")
        .column("name", "Name", Title)
        .column("slug", "Slug", Text)
        .column("postcode", "Postcode", Text)
        .column("region", "Region", EnumSingle)
        .column("description", "Description", Text)
        .column("local_seo_content", "Local SEO Content", Text)
        .column("services_available", "Services Available", EnumMulti)
        .column("distance_from_base", "Distance from Base", Number)
        .column_or("projects_completed", "Projects Completed", Number, 0i64)
        .column("meta_title", "Meta Title", Text)
        .column("meta_description", "Meta Description", Text)
}

pub fn case_studies() -> TableSyncSpec {
    TableSyncSpec::new("content_case_studies", "NOTION_CASE_STUDIES_DB_ID")
        .with_label("case study")
        .column("study_id", "Study ID", Title)
        .column("suburb", "Suburb", EnumSingle)
        .column("job_type", "Job Type", EnumSingle)
        .column("client_problem", "Client Problem", Text)
        .column("solution_provided", "Solution Provided", Text)
        .column("key_outcome", "Key Outcome", Text)
        .column("before_image", "Before Image", Url)
        .column("after_image", "After Image", Url)
        .column("testimonial", "Testimonial", Text)
        .column("project_date", "Project Date", Date)
        .column("featured", "Featured", Boolean)
        .column("slug", "Slug", Text)
        .column("meta_description", "Meta Description", Text)
}

pub fn testimonials() -> TableSyncSpec {
    TableSyncSpec::new("content_testimonials", "NOTION_TESTIMONIALS_DB_ID")
        .with_label("testimonial")
        .column("client_name", "Client Name", Title)
        .column("testimonial_text", "Testimonial Text", Text)
        .column("rating", "Rating", Number)
        .column("service_type", "Service Type", EnumSingle)
        .column("suburb", "Suburb", EnumSingle)
        .column("job_date", "Job Date", Date)
        .column("verified", "Verified", Boolean)
        .column("featured", "Featured", Boolean)
}

pub fn knowledge_base() -> TableSyncSpec {
    TableSyncSpec::new("content_knowledge_base", "NOTION_KNOWLEDGE_BASE_DB_ID")
        .with_label("FAQ")
        .column("question", "Question", Title)
        .column("answer", "Answer", Text)
        .column("category", "Category", EnumSingle)
        .column("related_services", "Related Services", EnumMulti)
        .column_or("display_order", "Display Order", Number, 0i64)
        .column("featured", "Featured", Boolean)
}

/// RAG knowledge files. `file_key` stays a plain column; rows are still keyed
/// by the source record id so repeated syncs stay idempotent when a file key
/// is renamed.
pub fn knowledge_files() -> TableSyncSpec {
    TableSyncSpec::new("knowledge_files", "NOTION_KNOWLEDGE_FILES_DB_ID")
        .with_label("knowledge file")
        .column("file_key", "File Key", Title)
        .column("title", "Title", Text)
        .column("category", "Category", EnumSingle)
        .column("content", "Content", Text)
        .column_or("version", "Version", Number, 1i64)
        .column("active", "Active", Boolean)
        .column("metadata", "Metadata", Text)
}

/// All built-in tables in sync order.
pub fn builtin_tables() -> Vec<TableSyncSpec> {
    vec![
        blog_posts(),
        services(),
        suburbs(),
        case_studies(),
        testimonials(),
        knowledge_base(),
        knowledge_files(),
    ]
}
