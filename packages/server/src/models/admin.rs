use common::Role;
use serde::{Deserialize, Serialize};

use crate::models::auth::UserResponse;
use crate::models::enrollment::EnrollmentResponse;

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    /// Only return users with this role.
    pub role: Option<Role>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserListResponse {
    pub data: Vec<UserResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AdminDashboardResponse {
    pub total_users: u64,
    pub total_courses: u64,
    pub approved_enrollments: u64,
    /// Oldest first, at most 10.
    pub pending_enrollments: Vec<EnrollmentResponse>,
}
