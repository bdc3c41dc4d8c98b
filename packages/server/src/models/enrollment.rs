use chrono::{DateTime, Utc};
use common::EnrollmentStatus;
use serde::Serialize;

use crate::entity::enrollment;

#[derive(Serialize, utoipa::ToSchema)]
pub struct EnrollmentResponse {
    pub id: i32,
    pub student_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    pub course_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_title: Option<String>,
    pub status: EnrollmentStatus,
    pub requested_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl From<enrollment::Model> for EnrollmentResponse {
    fn from(m: enrollment::Model) -> Self {
        Self {
            id: m.id,
            student_id: m.student_id,
            student_name: None,
            course_id: m.course_id,
            course_title: None,
            status: m.status,
            requested_at: m.requested_at,
            responded_at: m.responded_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EnrollmentListResponse {
    pub data: Vec<EnrollmentResponse>,
}
