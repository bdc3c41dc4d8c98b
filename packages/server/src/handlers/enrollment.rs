use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::enrollment_status::{RequestContext, RequestRefusal};
use common::{EnrollmentDecision, EnrollmentStatus, Role};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{course, enrollment, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::enrollment::{EnrollmentListResponse, EnrollmentResponse};
use crate::state::AppState;
use crate::utils::course::{
    approved_count, find_course, find_user, require_course_owner_or_admin,
};

#[utoipa::path(
    post,
    path = "/{id}/enroll",
    tag = "Enrollments",
    operation_id = "requestEnrollment",
    summary = "Request enrollment in a course",
    description = "Students only. Requires a completed payment, no earlier request for the same \
        course (whatever its outcome), and a free seat counted over approved enrollments. \
        The request starts as `pending`.",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 201, description = "Request created", body = EnrollmentResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 402, description = "Payment missing (PAYMENT_REQUIRED)", body = ErrorBody),
        (status = 403, description = "Not a student (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already requested (CONFLICT) or course full (COURSE_FULL)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(course_id, user_id = auth_user.user_id))]
pub async fn request_enrollment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_role(Role::Student)?;

    let txn = state.db.begin().await?;

    let course = find_course(&txn, course_id).await?;
    let student = find_user(&txn, auth_user.user_id).await?;

    let existing = enrollment::Entity::find()
        .filter(enrollment::Column::StudentId.eq(student.id))
        .filter(enrollment::Column::CourseId.eq(course.id))
        .one(&txn)
        .await?;

    // Capacity is a request-time check; two concurrent requests can both pass it.
    let ctx = RequestContext {
        has_paid: student.has_paid,
        existing: existing.map(|e| e.status),
        approved_count: approved_count(&txn, course.id).await?,
        max_students: u64::try_from(course.max_students).unwrap_or(0),
    };
    ctx.check().map_err(|refusal| match refusal {
        RequestRefusal::NotPaid => AppError::PaymentRequired,
        RequestRefusal::AlreadyRequested(status) => AppError::Conflict(format!(
            "You already have a {status} enrollment for this course"
        )),
        RequestRefusal::CourseFull => AppError::CourseFull,
    })?;

    let model = enrollment::ActiveModel {
        student_id: Set(student.id),
        course_id: Set(course.id),
        status: Set(EnrollmentStatus::Pending),
        requested_at: Set(chrono::Utc::now()),
        responded_at: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("You already have an enrollment for this course".into())
        }
        _ => AppError::from(e),
    })?;

    txn.commit().await?;

    tracing::info!(enrollment_id = model.id, "Enrollment requested");

    let mut response = EnrollmentResponse::from(model);
    response.student_name = Some(student.full_name());
    response.course_title = Some(course.title);
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/{id}/enrollments",
    tag = "Enrollments",
    operation_id = "listCourseEnrollments",
    summary = "List enrollments of a course",
    description = "Owning teacher or admin. Oldest request first.",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Enrollment list", body = EnrollmentListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(course_id))]
pub async fn list_course_enrollments(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
) -> Result<Json<EnrollmentListResponse>, AppError> {
    let course = find_course(&state.db, course_id).await?;
    require_course_owner_or_admin(&auth_user, &course)?;

    let rows = enrollment::Entity::find()
        .filter(enrollment::Column::CourseId.eq(course_id))
        .order_by_asc(enrollment::Column::RequestedAt)
        .order_by_asc(enrollment::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(EnrollmentListResponse {
        data: describe_enrollments(&state.db, rows).await?,
    }))
}

#[utoipa::path(
    post,
    path = "/{id}/approve",
    tag = "Enrollments",
    operation_id = "approveEnrollment",
    summary = "Approve a pending enrollment",
    description = "Owning teacher or admin. Only `pending` requests can be resolved; approved \
        and declined are final.",
    params(("id" = i32, Path, description = "Enrollment ID")),
    responses(
        (status = 200, description = "Enrollment approved", body = EnrollmentResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Enrollment not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already resolved (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn approve_enrollment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<EnrollmentResponse>, AppError> {
    resolve_enrollment(&state, &auth_user, id, EnrollmentDecision::Approve).await
}

#[utoipa::path(
    post,
    path = "/{id}/decline",
    tag = "Enrollments",
    operation_id = "declineEnrollment",
    summary = "Decline a pending enrollment",
    description = "Owning teacher or admin. A declined student cannot request the course again.",
    params(("id" = i32, Path, description = "Enrollment ID")),
    responses(
        (status = 200, description = "Enrollment declined", body = EnrollmentResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Enrollment not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already resolved (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn decline_enrollment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<EnrollmentResponse>, AppError> {
    resolve_enrollment(&state, &auth_user, id, EnrollmentDecision::Decline).await
}

async fn resolve_enrollment(
    state: &AppState,
    auth_user: &AuthUser,
    id: i32,
    decision: EnrollmentDecision,
) -> Result<Json<EnrollmentResponse>, AppError> {
    let txn = state.db.begin().await?;

    let existing = enrollment::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Enrollment not found".into()))?;
    let course = find_course(&txn, existing.course_id).await?;
    require_course_owner_or_admin(auth_user, &course)?;

    let next = existing
        .status
        .apply(decision)
        .map_err(|e| AppError::Conflict(e.to_string()))?;

    // Only status and responded_at change.
    let mut active: enrollment::ActiveModel = existing.into();
    active.status = Set(next);
    active.responded_at = Set(Some(chrono::Utc::now()));
    let model = active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(
        enrollment_id = model.id,
        course_id = model.course_id,
        status = %model.status,
        "Enrollment resolved"
    );

    let mut data = describe_enrollments(&state.db, vec![model]).await?;
    data.pop()
        .map(Json)
        .ok_or_else(|| AppError::Internal("enrollment response missing".into()))
}

/// Attach student names and course titles to enrollment rows.
pub(crate) async fn describe_enrollments<C: ConnectionTrait>(
    db: &C,
    rows: Vec<enrollment::Model>,
) -> Result<Vec<EnrollmentResponse>, AppError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let student_ids: Vec<i32> = rows.iter().map(|e| e.student_id).collect();
    let course_ids: Vec<i32> = rows.iter().map(|e| e.course_id).collect();

    let students: HashMap<i32, String> = user::Entity::find()
        .filter(user::Column::Id.is_in(student_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.full_name()))
        .collect();
    let courses: HashMap<i32, String> = course::Entity::find()
        .filter(course::Column::Id.is_in(course_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.title))
        .collect();

    Ok(rows
        .into_iter()
        .map(|e| {
            let mut r = EnrollmentResponse::from(e);
            r.student_name = students.get(&r.student_id).cloned();
            r.course_title = courses.get(&r.course_id).cloned();
            r
        })
        .collect())
}
