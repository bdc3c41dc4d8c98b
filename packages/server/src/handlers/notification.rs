use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{EnrollmentStatus, Role};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{enrollment, notification};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::notification::*;
use crate::state::AppState;
use crate::utils::course::{find_course, require_course_owner};

#[utoipa::path(
    post,
    path = "/{id}/notifications",
    tag = "Notifications",
    operation_id = "notifyCourseStudents",
    summary = "Notify the students of a course",
    description = "Owning teacher only. One notification is created for every student with an \
        approved enrollment; pending and declined requests are skipped.",
    params(("id" = i32, Path, description = "Course ID")),
    request_body = TeacherNotifyRequest,
    responses(
        (status = 201, description = "Notifications created", body = NotifyResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(course_id))]
pub async fn teacher_notify(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
    AppJson(payload): AppJson<TeacherNotifyRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_teacher_notify(&payload)?;

    let txn = state.db.begin().await?;

    let course = find_course(&txn, course_id).await?;
    require_course_owner(&auth_user, &course)?;

    let student_ids: Vec<i32> = enrollment::Entity::find()
        .filter(enrollment::Column::CourseId.eq(course_id))
        .filter(enrollment::Column::Status.eq(EnrollmentStatus::Approved))
        .all(&txn)
        .await?
        .into_iter()
        .map(|e| e.student_id)
        .collect();

    let recipients = fan_out(&txn, &student_ids, &payload.title, &payload.message).await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(NotifyResponse { recipients })))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Notifications",
    operation_id = "listMyNotifications",
    summary = "List the caller's notifications",
    description = "Students only. Visible notifications, newest first, with the unread count.",
    responses(
        (status = 200, description = "Notification list", body = NotificationListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a student (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_notifications(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<NotificationListResponse>, AppError> {
    auth_user.require_role(Role::Student)?;

    let data = visible_notifications(auth_user.user_id)
        .all(&state.db)
        .await?
        .into_iter()
        .map(NotificationResponse::from)
        .collect();
    let unread_count = unread_count(&state.db, auth_user.user_id).await?;

    Ok(Json(NotificationListResponse { data, unread_count }))
}

#[utoipa::path(
    post,
    path = "/{id}/read",
    tag = "Notifications",
    operation_id = "markNotificationRead",
    summary = "Mark a notification as read",
    description = "Students only, and only for their own notifications. Marking an already read \
        notification keeps the original timestamp.",
    params(("id" = i32, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification marked read", body = NotificationResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the recipient (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Notification not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn mark_read(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<NotificationResponse>, AppError> {
    auth_user.require_role(Role::Student)?;

    let txn = state.db.begin().await?;

    let existing = notification::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification not found".into()))?;
    if existing.recipient_id != auth_user.user_id {
        return Err(AppError::PermissionDenied);
    }
    if existing.read_at.is_some() {
        return Ok(Json(existing.into()));
    }

    let mut active: notification::ActiveModel = existing.into();
    active.read_at = Set(Some(chrono::Utc::now()));
    let model = active.update(&txn).await?;

    txn.commit().await?;

    Ok(Json(model.into()))
}

/// Rows per INSERT, keeping bound parameters well under SQLite's limit.
const FAN_OUT_BATCH: usize = 200;

/// Insert one notification per recipient. Returns the number of rows created.
pub(crate) async fn fan_out<C: ConnectionTrait>(
    db: &C,
    recipient_ids: &[i32],
    title: &str,
    message: &str,
) -> Result<u64, AppError> {
    if recipient_ids.is_empty() {
        tracing::warn!("Notification has no recipients");
        return Ok(0);
    }

    let now = chrono::Utc::now();
    for batch in recipient_ids.chunks(FAN_OUT_BATCH) {
        let rows = batch.iter().map(|&recipient_id| notification::ActiveModel {
            recipient_id: Set(recipient_id),
            title: Set(title.trim().to_string()),
            message: Set(message.trim().to_string()),
            is_visible: Set(true),
            created_at: Set(now),
            read_at: Set(None),
            ..Default::default()
        });
        notification::Entity::insert_many(rows).exec(db).await?;
    }

    let count = recipient_ids.len() as u64;
    tracing::info!(recipients = count, "Notifications sent");
    Ok(count)
}

/// Visible notifications of one recipient, newest first.
pub(crate) fn visible_notifications(recipient_id: i32) -> Select<notification::Entity> {
    notification::Entity::find()
        .filter(notification::Column::RecipientId.eq(recipient_id))
        .filter(notification::Column::IsVisible.eq(true))
        .order_by_desc(notification::Column::CreatedAt)
        .order_by_desc(notification::Column::Id)
}

pub(crate) async fn unread_count<C: ConnectionTrait>(
    db: &C,
    recipient_id: i32,
) -> Result<u64, AppError> {
    Ok(notification::Entity::find()
        .filter(notification::Column::RecipientId.eq(recipient_id))
        .filter(notification::Column::IsVisible.eq(true))
        .filter(notification::Column::ReadAt.is_null())
        .count(db)
        .await?)
}
