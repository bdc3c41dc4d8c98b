use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::Role;
use sea_orm::sea_query::Query as SeaQuery;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{
    course, discussion, enrollment, essay, essay_submission, live_class, module, quiz,
    quiz_answer, quiz_question, quiz_submission, reply, user,
};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::curriculum::{course_outline, delete_module_contents};
use crate::handlers::discussion::course_discussions;
use crate::models::course::*;
use crate::models::essay::EssayResponse;
use crate::models::live_class::LiveClassResponse;
use crate::models::quiz::QuizResponse;
use crate::state::AppState;
use crate::utils::course::{approved_count, find_course, require_course_access};

#[utoipa::path(
    post,
    path = "/",
    tag = "Courses",
    operation_id = "createCourse",
    summary = "Create a course",
    description = "Admin only. `teacher_id` must reference a teacher account.",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_course(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_role(Role::Admin)?;
    validate_create_course(&payload)?;

    require_teacher(&state.db, payload.teacher_id).await?;

    let model = course::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description.trim().to_string()),
        target_level: Set(payload.target_level),
        max_students: Set(payload.max_students.unwrap_or(DEFAULT_MAX_STUDENTS)),
        teacher_id: Set(Some(payload.teacher_id)),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    let response = course_response(&state.db, model, &auth_user).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Courses",
    operation_id = "listCourses",
    summary = "List courses",
    description = "Admins and students see every course, teachers only their own. Students also \
        get their own enrollment status per course.",
    responses(
        (status = 200, description = "Course list", body = CourseListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_courses(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<CourseListResponse>, AppError> {
    let courses = match auth_user.role {
        Role::Teacher => courses_taught_by(&state.db, auth_user.user_id).await?,
        Role::Admin | Role::Student => {
            course::Entity::find()
                .order_by_desc(course::Column::CreatedAt)
                .order_by_desc(course::Column::Id)
                .all(&state.db)
                .await?
        }
    };

    let data = course_responses(&state.db, courses, &auth_user).await?;
    Ok(Json(CourseListResponse { data }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Courses",
    operation_id = "getCourse",
    summary = "Get a course with its content",
    description = "Requires course access: the owning teacher, a student with an approved \
        enrollment, or an admin. Returns the curriculum tree and every assessment, live class \
        and discussion of the course.",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course detail", body = CourseDetailResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "No access to this course (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_course(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CourseDetailResponse>, AppError> {
    let course = find_course(&state.db, id).await?;
    require_course_access(&state.db, &auth_user, &course).await?;

    let modules = course_outline(&state.db, id).await?;

    let quizzes = quiz::Entity::find()
        .filter(quiz::Column::CourseId.eq(id))
        .order_by_asc(quiz::Column::Id)
        .all(&state.db)
        .await?
        .into_iter()
        .map(QuizResponse::from)
        .collect();

    let essays = essay::Entity::find()
        .filter(essay::Column::CourseId.eq(id))
        .order_by_asc(essay::Column::Id)
        .all(&state.db)
        .await?
        .into_iter()
        .map(EssayResponse::from)
        .collect();

    let live_classes = live_class::Entity::find()
        .filter(live_class::Column::CourseId.eq(id))
        .order_by_desc(live_class::Column::CreatedAt)
        .order_by_desc(live_class::Column::Id)
        .all(&state.db)
        .await?
        .into_iter()
        .map(LiveClassResponse::from)
        .collect();

    let discussions = course_discussions(&state.db, id).await?;

    Ok(Json(CourseDetailResponse {
        course: course_response(&state.db, course, &auth_user).await?,
        modules,
        quizzes,
        essays,
        live_classes,
        discussions,
    }))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Courses",
    operation_id = "updateCourse",
    summary = "Update a course",
    description = "Admin only. PATCH semantics; `teacher_id: null` leaves the course unassigned.",
    params(("id" = i32, Path, description = "Course ID")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Course updated", body = CourseResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_course(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateCourseRequest>,
) -> Result<Json<CourseResponse>, AppError> {
    auth_user.require_role(Role::Admin)?;
    validate_update_course(&payload)?;

    if payload == UpdateCourseRequest::default() {
        let existing = find_course(&state.db, id).await?;
        return Ok(Json(course_response(&state.db, existing, &auth_user).await?));
    }

    let txn = state.db.begin().await?;

    let existing = find_course(&txn, id).await?;
    let mut active: course::ActiveModel = existing.into();

    if let Some(ref title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(ref description) = payload.description {
        active.description = Set(description.trim().to_string());
    }
    if let Some(level) = payload.target_level {
        active.target_level = Set(level);
    }
    if let Some(max) = payload.max_students {
        active.max_students = Set(max);
    }
    if let Some(teacher_id) = payload.teacher_id {
        if let Some(teacher_id) = teacher_id {
            require_teacher(&txn, teacher_id).await?;
        }
        active.teacher_id = Set(teacher_id);
    }

    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(course_response(&state.db, model, &auth_user).await?))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Courses",
    operation_id = "deleteCourse",
    summary = "Delete a course and everything in it",
    description = "Admin only. Removes the curriculum, enrollments, quizzes with their \
        questions and submissions, essays with their submissions, live classes and \
        discussions with their replies in one transaction.",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_course(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_role(Role::Admin)?;

    let txn = state.db.begin().await?;

    find_course(&txn, id).await?;

    let quiz_ids = SeaQuery::select()
        .column(quiz::Column::Id)
        .from(quiz::Entity)
        .and_where(quiz::Column::CourseId.eq(id))
        .to_owned();
    let submission_ids = SeaQuery::select()
        .column(quiz_submission::Column::Id)
        .from(quiz_submission::Entity)
        .and_where(quiz_submission::Column::QuizId.in_subquery(quiz_ids.clone()))
        .to_owned();

    quiz_answer::Entity::delete_many()
        .filter(quiz_answer::Column::SubmissionId.in_subquery(submission_ids))
        .exec(&txn)
        .await?;
    quiz_submission::Entity::delete_many()
        .filter(quiz_submission::Column::QuizId.in_subquery(quiz_ids.clone()))
        .exec(&txn)
        .await?;
    quiz_question::Entity::delete_many()
        .filter(quiz_question::Column::QuizId.in_subquery(quiz_ids))
        .exec(&txn)
        .await?;
    quiz::Entity::delete_many()
        .filter(quiz::Column::CourseId.eq(id))
        .exec(&txn)
        .await?;

    essay_submission::Entity::delete_many()
        .filter(
            essay_submission::Column::EssayId.in_subquery(
                SeaQuery::select()
                    .column(essay::Column::Id)
                    .from(essay::Entity)
                    .and_where(essay::Column::CourseId.eq(id))
                    .to_owned(),
            ),
        )
        .exec(&txn)
        .await?;
    essay::Entity::delete_many()
        .filter(essay::Column::CourseId.eq(id))
        .exec(&txn)
        .await?;

    reply::Entity::delete_many()
        .filter(
            reply::Column::DiscussionId.in_subquery(
                SeaQuery::select()
                    .column(discussion::Column::Id)
                    .from(discussion::Entity)
                    .and_where(discussion::Column::CourseId.eq(id))
                    .to_owned(),
            ),
        )
        .exec(&txn)
        .await?;
    discussion::Entity::delete_many()
        .filter(discussion::Column::CourseId.eq(id))
        .exec(&txn)
        .await?;

    live_class::Entity::delete_many()
        .filter(live_class::Column::CourseId.eq(id))
        .exec(&txn)
        .await?;
    enrollment::Entity::delete_many()
        .filter(enrollment::Column::CourseId.eq(id))
        .exec(&txn)
        .await?;

    delete_module_contents(
        &txn,
        SeaQuery::select()
            .column(module::Column::Id)
            .from(module::Entity)
            .and_where(module::Column::CourseId.eq(id))
            .to_owned(),
    )
    .await?;
    module::Entity::delete_many()
        .filter(module::Column::CourseId.eq(id))
        .exec(&txn)
        .await?;

    course::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    tracing::info!(course_id = id, "Course deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn require_teacher<C: ConnectionTrait>(db: &C, teacher_id: i32) -> Result<(), AppError> {
    let teacher = user::Entity::find_by_id(teacher_id).one(db).await?;
    match teacher {
        Some(t) if t.role.is_teacher() => Ok(()),
        _ => Err(AppError::Validation(
            "teacher_id must reference a teacher account".into(),
        )),
    }
}

/// Build a single course view for `viewer`.
pub(crate) async fn course_response<C: ConnectionTrait>(
    db: &C,
    course: course::Model,
    viewer: &AuthUser,
) -> Result<CourseResponse, AppError> {
    let mut data = course_responses(db, vec![course], viewer).await?;
    data.pop()
        .ok_or_else(|| AppError::Internal("course response missing".into()))
}

/// Attach live enrollment counts, teacher names and, for students, their own
/// enrollment status.
pub(crate) async fn course_responses<C: ConnectionTrait>(
    db: &C,
    courses: Vec<course::Model>,
    viewer: &AuthUser,
) -> Result<Vec<CourseResponse>, AppError> {
    let teacher_ids: Vec<i32> = courses.iter().filter_map(|c| c.teacher_id).collect();
    let teachers: HashMap<i32, String> = if teacher_ids.is_empty() {
        HashMap::new()
    } else {
        user::Entity::find()
            .filter(user::Column::Id.is_in(teacher_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, u.full_name()))
            .collect()
    };

    let mine: HashMap<i32, common::EnrollmentStatus> = if viewer.role.is_student() {
        enrollment::Entity::find()
            .filter(enrollment::Column::StudentId.eq(viewer.user_id))
            .all(db)
            .await?
            .into_iter()
            .map(|e| (e.course_id, e.status))
            .collect()
    } else {
        HashMap::new()
    };

    let mut data = Vec::with_capacity(courses.len());
    for c in courses {
        let enrolled_count = approved_count(db, c.id).await?;
        let capacity = u64::try_from(c.max_students).unwrap_or(0);
        data.push(CourseResponse {
            id: c.id,
            teacher_name: c.teacher_id.and_then(|t| teachers.get(&t).cloned()),
            my_enrollment: mine.get(&c.id).copied(),
            title: c.title,
            description: c.description,
            target_level: c.target_level,
            max_students: c.max_students,
            teacher_id: c.teacher_id,
            enrolled_count,
            is_full: enrolled_count >= capacity,
            created_at: c.created_at,
        });
    }
    Ok(data)
}

/// Courses owned by a teacher, newest first.
pub(crate) async fn courses_taught_by<C: ConnectionTrait>(
    db: &C,
    teacher_id: i32,
) -> Result<Vec<course::Model>, AppError> {
    Ok(course::Entity::find()
        .filter(course::Column::TeacherId.eq(teacher_id))
        .order_by_desc(course::Column::CreatedAt)
        .order_by_desc(course::Column::Id)
        .all(db)
        .await?)
}
