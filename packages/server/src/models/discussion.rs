use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::shared::{validate_required, validate_title};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateDiscussionRequest {
    #[schema(example = "Question about osmosis")]
    pub title: String,
    pub content: String,
    /// Ignored unless the author teaches the course.
    #[serde(default)]
    pub is_pinned: bool,
}

pub fn validate_create_discussion(payload: &CreateDiscussionRequest) -> Result<(), AppError> {
    validate_title(&payload.title)?;
    validate_required("Content", &payload.content)
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateReplyRequest {
    pub content: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct PinRequest {
    pub is_pinned: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DiscussionResponse {
    pub id: i32,
    pub course_id: i32,
    pub author_id: i32,
    pub author_name: String,
    pub title: String,
    pub content: String,
    pub is_pinned: bool,
    pub reply_count: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ReplyResponse {
    pub id: i32,
    pub discussion_id: i32,
    pub author_id: i32,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DiscussionDetailResponse {
    pub discussion: DiscussionResponse,
    /// Oldest first.
    pub replies: Vec<ReplyResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DiscussionListResponse {
    pub data: Vec<DiscussionResponse>,
}
