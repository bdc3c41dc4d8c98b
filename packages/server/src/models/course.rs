use chrono::{DateTime, Utc};
use common::{EnrollmentStatus, TargetLevel};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::curriculum::ModuleTree;
use crate::models::discussion::DiscussionResponse;
use crate::models::essay::EssayResponse;
use crate::models::live_class::LiveClassResponse;
use crate::models::quiz::QuizResponse;
use crate::models::shared::{double_option, validate_required, validate_title};

pub const DEFAULT_MAX_STUDENTS: i32 = 50;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCourseRequest {
    #[schema(example = "A/L Biology 2025")]
    pub title: String,
    pub description: String,
    pub target_level: TargetLevel,
    /// Capacity (>= 1). Default: 50.
    #[schema(example = 50)]
    pub max_students: Option<i32>,
    /// Must reference a teacher account.
    pub teacher_id: i32,
}

pub fn validate_create_course(payload: &CreateCourseRequest) -> Result<(), AppError> {
    validate_title(&payload.title)?;
    validate_required("Description", &payload.description)?;
    validate_max_students(payload.max_students)?;
    Ok(())
}

/// PATCH body; absent fields are left unchanged.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub target_level: Option<TargetLevel>,
    pub max_students: Option<i32>,
    /// `null` unassigns the course.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub teacher_id: Option<Option<i32>>,
}

pub fn validate_update_course(payload: &UpdateCourseRequest) -> Result<(), AppError> {
    if let Some(ref title) = payload.title {
        validate_title(title)?;
    }
    if let Some(ref description) = payload.description {
        validate_required("Description", description)?;
    }
    validate_max_students(payload.max_students)?;
    Ok(())
}

fn validate_max_students(max: Option<i32>) -> Result<(), AppError> {
    if let Some(max) = max
        && max < 1
    {
        return Err(AppError::Validation("max_students must be >= 1".into()));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CourseResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub target_level: TargetLevel,
    pub max_students: i32,
    pub teacher_id: Option<i32>,
    #[schema(example = "Sunil Fernando")]
    pub teacher_name: Option<String>,
    /// Live count of approved enrollments.
    pub enrolled_count: u64,
    pub is_full: bool,
    /// Caller's own enrollment status (students only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_enrollment: Option<EnrollmentStatus>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CourseListResponse {
    pub data: Vec<CourseResponse>,
}

/// Everything a course page shows.
#[derive(Serialize, utoipa::ToSchema)]
pub struct CourseDetailResponse {
    pub course: CourseResponse,
    pub modules: Vec<ModuleTree>,
    pub quizzes: Vec<QuizResponse>,
    pub essays: Vec<EssayResponse>,
    /// Newest first.
    pub live_classes: Vec<LiveClassResponse>,
    /// Pinned first, then newest.
    pub discussions: Vec<DiscussionResponse>,
}
