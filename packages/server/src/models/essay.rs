use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{essay, essay_submission};
use crate::error::AppError;
use crate::models::shared::{validate_required, validate_title};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateEssayRequest {
    #[schema(example = "Photosynthesis Essay")]
    pub title: String,
    pub question_text: String,
    #[serde(default)]
    pub allows_file_upload: bool,
    /// Default: 100.
    pub max_points: Option<i32>,
    /// Informational only.
    pub due_date: Option<DateTime<Utc>>,
}

pub fn validate_create_essay(payload: &CreateEssayRequest) -> Result<(), AppError> {
    validate_title(&payload.title)?;
    validate_required("Question text", &payload.question_text)?;
    if let Some(max) = payload.max_points
        && max < 1
    {
        return Err(AppError::Validation("max_points must be >= 1".into()));
    }
    Ok(())
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct GradeEssayRequest {
    #[schema(example = 85)]
    pub score: i32,
    pub feedback: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EssayResponse {
    pub id: i32,
    pub course_id: i32,
    pub title: String,
    pub question_text: String,
    pub allows_file_upload: bool,
    pub max_points: i32,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<essay::Model> for EssayResponse {
    fn from(m: essay::Model) -> Self {
        Self {
            id: m.id,
            course_id: m.course_id,
            title: m.title,
            question_text: m.question_text,
            allows_file_upload: m.allows_file_upload,
            max_points: m.max_points,
            due_date: m.due_date,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EssaySubmissionResponse {
    pub id: i32,
    pub essay_id: i32,
    pub student_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    pub text_content: Option<String>,
    pub uploaded_file: Option<String>,
    pub score: Option<i32>,
    pub feedback: Option<String>,
    pub graded: bool,
    pub graded_at: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
}

impl From<essay_submission::Model> for EssaySubmissionResponse {
    fn from(m: essay_submission::Model) -> Self {
        Self {
            id: m.id,
            essay_id: m.essay_id,
            student_id: m.student_id,
            student_name: None,
            text_content: m.text_content,
            uploaded_file: m.uploaded_file,
            score: m.score,
            feedback: m.feedback,
            graded: m.graded,
            graded_at: m.graded_at,
            submitted_at: m.submitted_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EssayDetailResponse {
    pub essay: EssayResponse,
    /// The calling student's submission, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_submission: Option<EssaySubmissionResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EssaySubmissionListResponse {
    pub data: Vec<EssaySubmissionResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EssayListResponse {
    pub data: Vec<EssayResponse>,
}
