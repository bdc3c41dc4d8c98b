use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{discussion, reply, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::discussion::*;
use crate::models::shared::validate_required;
use crate::state::AppState;
use crate::utils::course::{
    find_course, find_discussion, require_course_access, require_course_owner,
};

#[utoipa::path(
    post,
    path = "/{id}/discussions",
    tag = "Discussions",
    operation_id = "createDiscussion",
    summary = "Open a discussion thread",
    description = "Requires course access. `is_pinned` is only honoured when the author \
        teaches the course.",
    params(("id" = i32, Path, description = "Course ID")),
    request_body = CreateDiscussionRequest,
    responses(
        (status = 201, description = "Discussion created", body = DiscussionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "No access to this course (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(course_id))]
pub async fn create_discussion(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
    AppJson(payload): AppJson<CreateDiscussionRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_discussion(&payload)?;

    let txn = state.db.begin().await?;

    let course = find_course(&txn, course_id).await?;
    require_course_access(&txn, &auth_user, &course).await?;

    let is_pinned = payload.is_pinned && require_course_owner(&auth_user, &course).is_ok();

    let model = discussion::ActiveModel {
        course_id: Set(course_id),
        author_id: Set(auth_user.user_id),
        title: Set(payload.title.trim().to_string()),
        content: Set(payload.content.trim().to_string()),
        is_pinned: Set(is_pinned),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut data = discussion_responses(&txn, vec![model]).await?;
    txn.commit().await?;

    let created = data
        .pop()
        .ok_or_else(|| AppError::Internal("discussion response missing".into()))?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/{id}/discussions",
    tag = "Discussions",
    operation_id = "listDiscussions",
    summary = "List the discussions of a course",
    description = "Requires course access. Pinned threads first, then newest first.",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Discussion list", body = DiscussionListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "No access to this course (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(course_id))]
pub async fn list_discussions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
) -> Result<Json<DiscussionListResponse>, AppError> {
    let course = find_course(&state.db, course_id).await?;
    require_course_access(&state.db, &auth_user, &course).await?;

    let data = course_discussions(&state.db, course_id).await?;
    Ok(Json(DiscussionListResponse { data }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Discussions",
    operation_id = "getDiscussion",
    summary = "Get a discussion with its replies",
    description = "Requires access to the discussion's course. Replies are flat and oldest first.",
    params(("id" = i32, Path, description = "Discussion ID")),
    responses(
        (status = 200, description = "Discussion detail", body = DiscussionDetailResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "No access to this course (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Discussion not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_discussion(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DiscussionDetailResponse>, AppError> {
    let thread = find_discussion(&state.db, id).await?;
    let course = find_course(&state.db, thread.course_id).await?;
    require_course_access(&state.db, &auth_user, &course).await?;

    let rows = reply::Entity::find()
        .filter(reply::Column::DiscussionId.eq(id))
        .find_also_related(user::Entity)
        .order_by_asc(reply::Column::CreatedAt)
        .order_by_asc(reply::Column::Id)
        .all(&state.db)
        .await?;

    let replies = rows
        .into_iter()
        .map(|(r, author)| reply_response(r, author.as_ref()))
        .collect();

    let discussion = discussion_responses(&state.db, vec![thread])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("discussion response missing".into()))?;

    Ok(Json(DiscussionDetailResponse {
        discussion,
        replies,
    }))
}

#[utoipa::path(
    post,
    path = "/{id}/replies",
    tag = "Discussions",
    operation_id = "replyToDiscussion",
    summary = "Reply to a discussion",
    description = "Requires access to the discussion's course.",
    params(("id" = i32, Path, description = "Discussion ID")),
    request_body = CreateReplyRequest,
    responses(
        (status = 201, description = "Reply created", body = ReplyResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "No access to this course (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Discussion not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn create_reply(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<CreateReplyRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_required("Content", &payload.content)?;

    let txn = state.db.begin().await?;

    let thread = find_discussion(&txn, id).await?;
    let course = find_course(&txn, thread.course_id).await?;
    require_course_access(&txn, &auth_user, &course).await?;

    let model = reply::ActiveModel {
        discussion_id: Set(id),
        author_id: Set(auth_user.user_id),
        content: Set(payload.content.trim().to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let author = user::Entity::find_by_id(auth_user.user_id).one(&txn).await?;
    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(reply_response(model, author.as_ref())),
    ))
}

#[utoipa::path(
    put,
    path = "/{id}/pin",
    tag = "Discussions",
    operation_id = "setDiscussionPinned",
    summary = "Pin or unpin a discussion",
    description = "Owning teacher only.",
    params(("id" = i32, Path, description = "Discussion ID")),
    request_body = PinRequest,
    responses(
        (status = 200, description = "Pin flag updated", body = DiscussionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Discussion not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn set_pinned(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<PinRequest>,
) -> Result<Json<DiscussionResponse>, AppError> {
    let txn = state.db.begin().await?;

    let thread = find_discussion(&txn, id).await?;
    let course = find_course(&txn, thread.course_id).await?;
    require_course_owner(&auth_user, &course)?;

    let mut active: discussion::ActiveModel = thread.into();
    active.is_pinned = Set(payload.is_pinned);
    let model = active.update(&txn).await?;

    let mut data = discussion_responses(&txn, vec![model]).await?;
    txn.commit().await?;

    data.pop()
        .map(Json)
        .ok_or_else(|| AppError::Internal("discussion response missing".into()))
}

/// Discussions of a course, pinned first, then newest first.
pub(crate) async fn course_discussions<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
) -> Result<Vec<DiscussionResponse>, AppError> {
    let threads = discussion::Entity::find()
        .filter(discussion::Column::CourseId.eq(course_id))
        .order_by_desc(discussion::Column::IsPinned)
        .order_by_desc(discussion::Column::CreatedAt)
        .order_by_desc(discussion::Column::Id)
        .all(db)
        .await?;
    discussion_responses(db, threads).await
}

/// Attach author names and live reply counts, keeping the input order.
async fn discussion_responses<C: ConnectionTrait>(
    db: &C,
    threads: Vec<discussion::Model>,
) -> Result<Vec<DiscussionResponse>, AppError> {
    if threads.is_empty() {
        return Ok(Vec::new());
    }

    let author_ids: Vec<i32> = threads.iter().map(|d| d.author_id).collect();
    let authors: HashMap<i32, String> = user::Entity::find()
        .filter(user::Column::Id.is_in(author_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.full_name()))
        .collect();

    let mut data = Vec::with_capacity(threads.len());
    for d in threads {
        let reply_count = reply::Entity::find()
            .filter(reply::Column::DiscussionId.eq(d.id))
            .count(db)
            .await?;
        data.push(DiscussionResponse {
            author_name: authors.get(&d.author_id).cloned().unwrap_or_default(),
            id: d.id,
            course_id: d.course_id,
            author_id: d.author_id,
            title: d.title,
            content: d.content,
            is_pinned: d.is_pinned,
            reply_count,
            created_at: d.created_at,
        });
    }
    Ok(data)
}

fn reply_response(r: reply::Model, author: Option<&user::Model>) -> ReplyResponse {
    ReplyResponse {
        id: r.id,
        discussion_id: r.discussion_id,
        author_id: r.author_id,
        author_name: author.map(user::Model::full_name).unwrap_or_default(),
        content: r.content,
        created_at: r.created_at,
    }
}
