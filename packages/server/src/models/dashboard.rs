use serde::Serialize;

use crate::models::course::CourseResponse;
use crate::models::enrollment::EnrollmentResponse;
use crate::models::notification::NotificationResponse;

#[derive(Serialize, utoipa::ToSchema)]
pub struct TeacherDashboardResponse {
    pub courses: Vec<CourseResponse>,
    /// Approved enrollments across all own courses.
    pub total_students: u64,
    pub pending_requests: Vec<EnrollmentResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct StudentDashboardResponse {
    /// Courses with an approved enrollment.
    pub courses: Vec<CourseResponse>,
    /// Ten newest visible notifications.
    pub notifications: Vec<NotificationResponse>,
    pub unread_count: u64,
}
