use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::notification;
use crate::error::AppError;
use crate::models::shared::{validate_required, validate_title};

/// Either the literal `"all"` or a student's user ID.
#[derive(Deserialize, Debug, PartialEq, utoipa::ToSchema)]
#[serde(untagged)]
pub enum Recipient {
    Student(i32),
    Keyword(String),
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct AdminNotifyRequest {
    #[schema(example = "Term test timetable")]
    pub title: String,
    pub message: String,
    #[schema(example = "all")]
    pub recipient: Recipient,
}

/// Target of an admin broadcast, after validation.
#[derive(Debug, PartialEq)]
pub enum Audience {
    AllStudents,
    Student(i32),
}

pub fn validate_admin_notify(payload: &AdminNotifyRequest) -> Result<Audience, AppError> {
    validate_title(&payload.title)?;
    validate_required("Message", &payload.message)?;
    match &payload.recipient {
        Recipient::Student(id) => Ok(Audience::Student(*id)),
        Recipient::Keyword(k) if k.eq_ignore_ascii_case("all") => Ok(Audience::AllStudents),
        Recipient::Keyword(_) => Err(AppError::Validation(
            "recipient must be \"all\" or a student ID".into(),
        )),
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct TeacherNotifyRequest {
    pub title: String,
    pub message: String,
}

pub fn validate_teacher_notify(payload: &TeacherNotifyRequest) -> Result<(), AppError> {
    validate_title(&payload.title)?;
    validate_required("Message", &payload.message)
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct NotifyResponse {
    /// Number of notification rows created.
    pub recipients: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct NotificationResponse {
    pub id: i32,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<notification::Model> for NotificationResponse {
    fn from(m: notification::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            message: m.message,
            is_read: m.read_at.is_some(),
            read_at: m.read_at,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct NotificationListResponse {
    pub data: Vec<NotificationResponse>,
    pub unread_count: u64,
}
