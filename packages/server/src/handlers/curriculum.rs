use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::storage::UploadArea;
use sea_orm::sea_query::{Query as SeaQuery, SelectStatement};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{lesson, module, topic};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::curriculum::*;
use crate::models::shared::non_blank;
use crate::state::AppState;
use crate::utils::course::{
    course_of_lesson, course_of_topic, find_course, find_lesson, find_module, find_topic,
    require_course_access, require_course_owner,
};

// ---- Modules ----

#[utoipa::path(
    post,
    path = "/{id}/modules",
    tag = "Curriculum",
    operation_id = "createModule",
    summary = "Add a module to a course",
    description = "Owning teacher only.",
    params(("id" = i32, Path, description = "Course ID")),
    request_body = CreateSectionRequest,
    responses(
        (status = 201, description = "Module created", body = ModuleResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(course_id))]
pub async fn create_module(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
    AppJson(payload): AppJson<CreateSectionRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_section(&payload)?;

    let course = find_course(&state.db, course_id).await?;
    require_course_owner(&auth_user, &course)?;

    let model = module::ActiveModel {
        course_id: Set(course.id),
        title: Set(payload.title.trim().to_string()),
        description: Set(non_blank(payload.description)),
        sort_order: Set(payload.order.unwrap_or(0)),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(ModuleResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Curriculum",
    operation_id = "updateModule",
    summary = "Update a module",
    description = "Owning teacher only. PATCH semantics.",
    params(("id" = i32, Path, description = "Module ID")),
    request_body = UpdateSectionRequest,
    responses(
        (status = 200, description = "Module updated", body = ModuleResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Module not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_module(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateSectionRequest>,
) -> Result<Json<ModuleResponse>, AppError> {
    validate_update_section(&payload)?;

    let txn = state.db.begin().await?;

    let existing = find_module(&txn, id).await?;
    let course = find_course(&txn, existing.course_id).await?;
    require_course_owner(&auth_user, &course)?;

    if payload == UpdateSectionRequest::default() {
        return Ok(Json(existing.into()));
    }

    let mut active: module::ActiveModel = existing.into();
    if let Some(ref title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(non_blank(description));
    }
    if let Some(order) = payload.order {
        active.sort_order = Set(order);
    }

    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Curriculum",
    operation_id = "deleteModule",
    summary = "Delete a module with its topics and lessons",
    description = "Owning teacher only.",
    params(("id" = i32, Path, description = "Module ID")),
    responses(
        (status = 204, description = "Module deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Module not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_module(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;

    let existing = find_module(&txn, id).await?;
    let course = find_course(&txn, existing.course_id).await?;
    require_course_owner(&auth_user, &course)?;

    delete_module_contents(
        &txn,
        SeaQuery::select()
            .column(module::Column::Id)
            .from(module::Entity)
            .and_where(module::Column::Id.eq(id))
            .to_owned(),
    )
    .await?;
    module::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- Topics ----

#[utoipa::path(
    post,
    path = "/{id}/topics",
    tag = "Curriculum",
    operation_id = "createTopic",
    summary = "Add a topic to a module",
    description = "Owning teacher only.",
    params(("id" = i32, Path, description = "Module ID")),
    request_body = CreateSectionRequest,
    responses(
        (status = 201, description = "Topic created", body = TopicResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Module not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(module_id))]
pub async fn create_topic(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(module_id): Path<i32>,
    AppJson(payload): AppJson<CreateSectionRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_section(&payload)?;

    let parent = find_module(&state.db, module_id).await?;
    let course = find_course(&state.db, parent.course_id).await?;
    require_course_owner(&auth_user, &course)?;

    let model = topic::ActiveModel {
        module_id: Set(parent.id),
        title: Set(payload.title.trim().to_string()),
        description: Set(non_blank(payload.description)),
        sort_order: Set(payload.order.unwrap_or(0)),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(TopicResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Curriculum",
    operation_id = "updateTopic",
    summary = "Update a topic",
    description = "Owning teacher only. PATCH semantics.",
    params(("id" = i32, Path, description = "Topic ID")),
    request_body = UpdateSectionRequest,
    responses(
        (status = 200, description = "Topic updated", body = TopicResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Topic not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_topic(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateSectionRequest>,
) -> Result<Json<TopicResponse>, AppError> {
    validate_update_section(&payload)?;

    let txn = state.db.begin().await?;

    let existing = find_topic(&txn, id).await?;
    let course = course_of_topic(&txn, &existing).await?;
    require_course_owner(&auth_user, &course)?;

    if payload == UpdateSectionRequest::default() {
        return Ok(Json(existing.into()));
    }

    let mut active: topic::ActiveModel = existing.into();
    if let Some(ref title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(non_blank(description));
    }
    if let Some(order) = payload.order {
        active.sort_order = Set(order);
    }

    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Curriculum",
    operation_id = "deleteTopic",
    summary = "Delete a topic with its lessons",
    description = "Owning teacher only.",
    params(("id" = i32, Path, description = "Topic ID")),
    responses(
        (status = 204, description = "Topic deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Topic not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_topic(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;

    let existing = find_topic(&txn, id).await?;
    let course = course_of_topic(&txn, &existing).await?;
    require_course_owner(&auth_user, &course)?;

    lesson::Entity::delete_many()
        .filter(lesson::Column::TopicId.eq(id))
        .exec(&txn)
        .await?;
    topic::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- Lessons ----

#[utoipa::path(
    post,
    path = "/{id}/lessons",
    tag = "Curriculum",
    operation_id = "createLesson",
    summary = "Add a lesson to a topic",
    description = "Owning teacher only. `video_file` and `image_files` are stored names returned \
        by the upload endpoint and must already exist.",
    params(("id" = i32, Path, description = "Topic ID")),
    request_body = CreateLessonRequest,
    responses(
        (status = 201, description = "Lesson created", body = LessonResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Topic not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(topic_id))]
pub async fn create_lesson(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(topic_id): Path<i32>,
    AppJson(payload): AppJson<CreateLessonRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_lesson(&payload)?;

    let parent = find_topic(&state.db, topic_id).await?;
    let course = course_of_topic(&state.db, &parent).await?;
    require_course_owner(&auth_user, &course)?;

    let video_file = non_blank(payload.video_file);
    require_uploaded(&state, video_file.iter().chain(payload.image_files.iter())).await?;

    let model = lesson::ActiveModel {
        topic_id: Set(parent.id),
        title: Set(payload.title.trim().to_string()),
        description: Set(non_blank(payload.description)),
        theory_text: Set(non_blank(payload.theory_text)),
        video_url: Set(non_blank(payload.video_url)),
        video_file: Set(video_file),
        image_files: Set(join_image_files(&payload.image_files)),
        is_lab_lesson: Set(payload.is_lab_lesson),
        sort_order: Set(payload.order.unwrap_or(0)),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(LessonResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Curriculum",
    operation_id = "viewLesson",
    summary = "View a lesson",
    description = "Admins see any lesson, teachers lessons of their own courses, students \
        lessons of courses they are approved in. Includes the course outline for navigation.",
    params(("id" = i32, Path, description = "Lesson ID")),
    responses(
        (status = 200, description = "Lesson", body = LessonViewResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "No access to this course (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Lesson not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn view_lesson(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<LessonViewResponse>, AppError> {
    let lesson = find_lesson(&state.db, id).await?;
    let course = course_of_lesson(&state.db, &lesson).await?;
    require_course_access(&state.db, &auth_user, &course).await?;

    let outline = course_outline(&state.db, course.id).await?;

    Ok(Json(LessonViewResponse {
        lesson: lesson.into(),
        course_id: course.id,
        course_title: course.title,
        outline,
    }))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Curriculum",
    operation_id = "updateLesson",
    summary = "Update a lesson",
    description = "Owning teacher only. PATCH semantics; `image_files` replaces the whole list.",
    params(("id" = i32, Path, description = "Lesson ID")),
    request_body = UpdateLessonRequest,
    responses(
        (status = 200, description = "Lesson updated", body = LessonResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Lesson not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_lesson(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateLessonRequest>,
) -> Result<Json<LessonResponse>, AppError> {
    validate_update_lesson(&payload)?;

    let existing = find_lesson(&state.db, id).await?;
    let course = course_of_lesson(&state.db, &existing).await?;
    require_course_owner(&auth_user, &course)?;

    if payload == UpdateLessonRequest::default() {
        return Ok(Json(existing.into()));
    }

    let video_file = payload.video_file.map(non_blank);
    require_uploaded(
        &state,
        video_file
            .iter()
            .flatten()
            .chain(payload.image_files.iter().flatten()),
    )
    .await?;

    let txn = state.db.begin().await?;

    let existing = find_lesson(&txn, id).await?;
    let mut active: lesson::ActiveModel = existing.into();
    if let Some(ref title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(non_blank(description));
    }
    if let Some(theory_text) = payload.theory_text {
        active.theory_text = Set(non_blank(theory_text));
    }
    if let Some(video_url) = payload.video_url {
        active.video_url = Set(non_blank(video_url));
    }
    if let Some(video_file) = video_file {
        active.video_file = Set(video_file);
    }
    if let Some(ref images) = payload.image_files {
        active.image_files = Set(join_image_files(images));
    }
    if let Some(is_lab) = payload.is_lab_lesson {
        active.is_lab_lesson = Set(is_lab);
    }
    if let Some(order) = payload.order {
        active.sort_order = Set(order);
    }

    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Curriculum",
    operation_id = "deleteLesson",
    summary = "Delete a lesson",
    description = "Owning teacher only. Uploaded media files are left in place.",
    params(("id" = i32, Path, description = "Lesson ID")),
    responses(
        (status = 204, description = "Lesson deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Lesson not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_lesson(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let existing = find_lesson(&state.db, id).await?;
    let course = course_of_lesson(&state.db, &existing).await?;
    require_course_owner(&auth_user, &course)?;

    lesson::Entity::delete_by_id(id).exec(&state.db).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Reject lesson media that was never uploaded.
async fn require_uploaded<'a>(
    state: &AppState,
    names: impl Iterator<Item = &'a String>,
) -> Result<(), AppError> {
    for name in names {
        if !state.uploads.exists(UploadArea::General, name).await? {
            return Err(AppError::Validation(format!(
                "Uploaded file '{name}' does not exist"
            )));
        }
    }
    Ok(())
}

/// Delete the topics and lessons under every module selected by `module_ids`.
/// The modules themselves are left to the caller.
pub(crate) async fn delete_module_contents<C: ConnectionTrait>(
    db: &C,
    module_ids: SelectStatement,
) -> Result<(), AppError> {
    lesson::Entity::delete_many()
        .filter(
            lesson::Column::TopicId.in_subquery(
                SeaQuery::select()
                    .column(topic::Column::Id)
                    .from(topic::Entity)
                    .and_where(topic::Column::ModuleId.in_subquery(module_ids.clone()))
                    .to_owned(),
            ),
        )
        .exec(db)
        .await?;
    topic::Entity::delete_many()
        .filter(topic::Column::ModuleId.in_subquery(module_ids))
        .exec(db)
        .await?;
    Ok(())
}

/// The full module -> topic -> lesson tree of a course, each level ordered by
/// `order` then ID.
pub(crate) async fn course_outline<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
) -> Result<Vec<ModuleTree>, AppError> {
    let modules = module::Entity::find()
        .filter(module::Column::CourseId.eq(course_id))
        .order_by_asc(module::Column::SortOrder)
        .order_by_asc(module::Column::Id)
        .all(db)
        .await?;
    if modules.is_empty() {
        return Ok(Vec::new());
    }

    let topics = topic::Entity::find()
        .filter(topic::Column::ModuleId.is_in(modules.iter().map(|m| m.id)))
        .order_by_asc(topic::Column::SortOrder)
        .order_by_asc(topic::Column::Id)
        .all(db)
        .await?;

    let lessons = if topics.is_empty() {
        Vec::new()
    } else {
        lesson::Entity::find()
            .filter(lesson::Column::TopicId.is_in(topics.iter().map(|t| t.id)))
            .order_by_asc(lesson::Column::SortOrder)
            .order_by_asc(lesson::Column::Id)
            .all(db)
            .await?
    };

    let mut lessons_by_topic: HashMap<i32, Vec<LessonResponse>> = HashMap::new();
    for l in lessons {
        lessons_by_topic
            .entry(l.topic_id)
            .or_default()
            .push(l.into());
    }

    let mut topics_by_module: HashMap<i32, Vec<TopicTree>> = HashMap::new();
    for t in topics {
        let lessons = lessons_by_topic.remove(&t.id).unwrap_or_default();
        topics_by_module.entry(t.module_id).or_default().push(TopicTree {
            topic: t.into(),
            lessons,
        });
    }

    Ok(modules
        .into_iter()
        .map(|m| ModuleTree {
            topics: topics_by_module.remove(&m.id).unwrap_or_default(),
            module: m.into(),
        })
        .collect())
}
