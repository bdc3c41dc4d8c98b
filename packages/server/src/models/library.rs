use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::library_resource;
use crate::models::shared::Pagination;

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LibraryQuery {
    /// Case-insensitive substring of title, description or tags.
    pub search: Option<String>,
    /// Exact category, e.g. `PDF`.
    pub category: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LibraryResourceResponse {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub tags: Vec<String>,
    #[schema(example = "PDF")]
    pub category: Option<String>,
    pub file_name: String,
    pub file_size: i64,
    pub uploaded_at: DateTime<Utc>,
}

impl From<library_resource::Model> for LibraryResourceResponse {
    fn from(m: library_resource::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            author: m.author,
            tags: split_tags(m.tags.as_deref()),
            category: m.category,
            file_name: m.file_name,
            file_size: m.file_size,
            uploaded_at: m.uploaded_at,
        }
    }
}

pub fn split_tags(stored: Option<&str>) -> Vec<String> {
    stored
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Normalise a comma-separated tag list for storage.
pub fn normalize_tags(raw: &str) -> Option<String> {
    let tags = split_tags(Some(raw));
    (!tags.is_empty()).then(|| tags.join(","))
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LibraryListResponse {
    pub data: Vec<LibraryResourceResponse>,
    /// Every distinct category in the catalog.
    pub categories: Vec<String>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ResearchRequest {
    #[schema(example = "How does the kidney filter blood?")]
    pub query: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ResearchResponse {
    pub response: String,
}
