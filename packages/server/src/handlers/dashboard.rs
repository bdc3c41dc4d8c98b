use axum::Json;
use axum::extract::State;
use common::{EnrollmentStatus, Role};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{course, enrollment};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::handlers::course::{course_responses, courses_taught_by};
use crate::handlers::enrollment::describe_enrollments;
use crate::handlers::notification::{unread_count, visible_notifications};
use crate::models::dashboard::{StudentDashboardResponse, TeacherDashboardResponse};
use crate::models::notification::NotificationResponse;
use crate::state::AppState;

const DASHBOARD_NOTIFICATION_LIMIT: u64 = 10;

#[utoipa::path(
    get,
    path = "/teacher",
    tag = "Dashboards",
    operation_id = "getTeacherDashboard",
    summary = "Get the teacher dashboard",
    description = "Teachers only. Own courses with live counts, the number of approved students \
        across them and every pending request, oldest first.",
    responses(
        (status = 200, description = "Dashboard", body = TeacherDashboardResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a teacher (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn teacher_dashboard(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<TeacherDashboardResponse>, AppError> {
    auth_user.require_role(Role::Teacher)?;

    let courses = courses_taught_by(&state.db, auth_user.user_id).await?;
    let course_ids: Vec<i32> = courses.iter().map(|c| c.id).collect();
    let courses = course_responses(&state.db, courses, &auth_user).await?;
    let total_students = courses.iter().map(|c| c.enrolled_count).sum();

    let pending = if course_ids.is_empty() {
        Vec::new()
    } else {
        enrollment::Entity::find()
            .filter(enrollment::Column::CourseId.is_in(course_ids))
            .filter(enrollment::Column::Status.eq(EnrollmentStatus::Pending))
            .order_by_asc(enrollment::Column::RequestedAt)
            .order_by_asc(enrollment::Column::Id)
            .all(&state.db)
            .await?
    };

    Ok(Json(TeacherDashboardResponse {
        courses,
        total_students,
        pending_requests: describe_enrollments(&state.db, pending).await?,
    }))
}

#[utoipa::path(
    get,
    path = "/student",
    tag = "Dashboards",
    operation_id = "getStudentDashboard",
    summary = "Get the student dashboard",
    description = "Students only. Courses with an approved enrollment, the ten newest visible \
        notifications and the unread count.",
    responses(
        (status = 200, description = "Dashboard", body = StudentDashboardResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a student (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn student_dashboard(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<StudentDashboardResponse>, AppError> {
    auth_user.require_role(Role::Student)?;

    let approved: Vec<i32> = enrollment::Entity::find()
        .filter(enrollment::Column::StudentId.eq(auth_user.user_id))
        .filter(enrollment::Column::Status.eq(EnrollmentStatus::Approved))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|e| e.course_id)
        .collect();

    let courses = if approved.is_empty() {
        Vec::new()
    } else {
        let rows = course::Entity::find()
            .filter(course::Column::Id.is_in(approved))
            .order_by_asc(course::Column::Title)
            .all(&state.db)
            .await?;
        course_responses(&state.db, rows, &auth_user).await?
    };

    let notifications = visible_notifications(auth_user.user_id)
        .limit(DASHBOARD_NOTIFICATION_LIMIT)
        .all(&state.db)
        .await?
        .into_iter()
        .map(NotificationResponse::from)
        .collect();

    Ok(Json(StudentDashboardResponse {
        courses,
        notifications,
        unread_count: unread_count(&state.db, auth_user.user_id).await?,
    }))
}
