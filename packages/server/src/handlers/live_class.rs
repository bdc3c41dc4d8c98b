use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::live_class;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::live_class::*;
use crate::models::shared::non_blank;
use crate::state::AppState;
use crate::utils::course::{
    find_course, find_live_class, require_course_access, require_course_owner,
};

#[utoipa::path(
    post,
    path = "/{id}/live-classes",
    tag = "Live Classes",
    operation_id = "startLiveClass",
    summary = "Start a live class",
    description = "Owning teacher only. A course has at most one active live class; starting \
        another while one is running is refused.",
    params(("id" = i32, Path, description = "Course ID")),
    request_body = StartLiveClassRequest,
    responses(
        (status = 201, description = "Live class started", body = LiveClassResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Another class is active (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(course_id))]
pub async fn start_live_class(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
    AppJson(payload): AppJson<StartLiveClassRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_start_live_class(&payload)?;

    let txn = state.db.begin().await?;

    let course = find_course(&txn, course_id).await?;
    require_course_owner(&auth_user, &course)?;

    // Request-time check only; concurrent starts can race past it.
    let active = live_class::Entity::find()
        .filter(live_class::Column::CourseId.eq(course_id))
        .filter(live_class::Column::IsActive.eq(true))
        .count(&txn)
        .await?;
    if active > 0 {
        return Err(AppError::Conflict(
            "A live class is already active for this course".into(),
        ));
    }

    let now = chrono::Utc::now();
    let model = live_class::ActiveModel {
        course_id: Set(course_id),
        title: Set(payload.title.trim().to_string()),
        description: Set(non_blank(payload.description)),
        stream_url: Set(payload.stream_url.trim().to_string()),
        is_active: Set(true),
        started_at: Set(Some(now)),
        ended_at: Set(None),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(live_class_id = model.id, course_id, "Live class started");
    Ok((StatusCode::CREATED, Json(LiveClassResponse::from(model))))
}

#[utoipa::path(
    post,
    path = "/{id}/end",
    tag = "Live Classes",
    operation_id = "endLiveClass",
    summary = "End a live class",
    description = "Owning teacher only. Ending is one-way.",
    params(("id" = i32, Path, description = "Live class ID")),
    responses(
        (status = 200, description = "Live class ended", body = LiveClassResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Live class not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already ended (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn end_live_class(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<LiveClassResponse>, AppError> {
    let txn = state.db.begin().await?;

    let existing = find_live_class(&txn, id).await?;
    let course = find_course(&txn, existing.course_id).await?;
    require_course_owner(&auth_user, &course)?;

    if !existing.is_active {
        return Err(AppError::Conflict("Live class has already ended".into()));
    }

    let mut active: live_class::ActiveModel = existing.into();
    active.is_active = Set(false);
    active.ended_at = Set(Some(chrono::Utc::now()));
    let model = active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(live_class_id = id, "Live class ended");
    Ok(Json(model.into()))
}

#[utoipa::path(
    get,
    path = "/{id}/live-classes",
    tag = "Live Classes",
    operation_id = "listLiveClasses",
    summary = "List the live classes of a course",
    description = "Requires course access. Newest first.",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Live class list", body = LiveClassListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "No access to this course (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(course_id))]
pub async fn list_live_classes(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
) -> Result<Json<LiveClassListResponse>, AppError> {
    let course = find_course(&state.db, course_id).await?;
    require_course_access(&state.db, &auth_user, &course).await?;

    let data = live_class::Entity::find()
        .filter(live_class::Column::CourseId.eq(course_id))
        .order_by_desc(live_class::Column::CreatedAt)
        .order_by_desc(live_class::Column::Id)
        .all(&state.db)
        .await?
        .into_iter()
        .map(LiveClassResponse::from)
        .collect();

    Ok(Json(LiveClassListResponse { data }))
}
