use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::live_class;
use crate::error::AppError;
use crate::models::shared::{validate_text, validate_title};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct StartLiveClassRequest {
    #[schema(example = "Revision: Genetics")]
    pub title: String,
    pub description: Option<String>,
    #[schema(example = "https://meet.example.com/bio-genetics")]
    pub stream_url: String,
}

pub fn validate_start_live_class(payload: &StartLiveClassRequest) -> Result<(), AppError> {
    validate_title(&payload.title)?;
    validate_text("Stream URL", &payload.stream_url, 500)?;
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LiveClassResponse {
    pub id: i32,
    pub course_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub stream_url: String,
    pub is_active: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<live_class::Model> for LiveClassResponse {
    fn from(m: live_class::Model) -> Self {
        Self {
            id: m.id,
            course_id: m.course_id,
            title: m.title,
            description: m.description,
            stream_url: m.stream_url,
            is_active: m.is_active,
            started_at: m.started_at,
            ended_at: m.ended_at,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LiveClassListResponse {
    pub data: Vec<LiveClassResponse>,
}
