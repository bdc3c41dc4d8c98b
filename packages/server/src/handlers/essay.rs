use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::Role;
use common::filename::{check_upload_name, timestamped_name};
use common::grading::check_essay_score;
use common::storage::UploadArea;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{essay, essay_submission, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::upload::{discard_upload, field_text, next_field, stream_field_to_store};
use crate::models::essay::*;
use crate::models::shared::non_blank;
use crate::state::AppState;
use crate::utils::course::{find_course, find_essay, require_course_access, require_course_owner};

const DEFAULT_MAX_POINTS: i32 = 100;

#[utoipa::path(
    post,
    path = "/{id}/essays",
    tag = "Essays",
    operation_id = "createEssay",
    summary = "Create an essay assignment",
    description = "Owning teacher only. `max_points` defaults to 100. `due_date` is shown to \
        students but not enforced.",
    params(("id" = i32, Path, description = "Course ID")),
    request_body = CreateEssayRequest,
    responses(
        (status = 201, description = "Essay created", body = EssayResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(course_id, title = %payload.title))]
pub async fn create_essay(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
    AppJson(payload): AppJson<CreateEssayRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_essay(&payload)?;

    let course = find_course(&state.db, course_id).await?;
    require_course_owner(&auth_user, &course)?;

    let model = essay::ActiveModel {
        course_id: Set(course.id),
        title: Set(payload.title.trim().to_string()),
        question_text: Set(payload.question_text.trim().to_string()),
        allows_file_upload: Set(payload.allows_file_upload),
        max_points: Set(payload.max_points.unwrap_or(DEFAULT_MAX_POINTS)),
        due_date: Set(payload.due_date),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(EssayResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/{id}/essays",
    tag = "Essays",
    operation_id = "listEssays",
    summary = "List the essays of a course",
    description = "Requires course access.",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Essay list", body = EssayListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "No access to this course (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(course_id))]
pub async fn list_essays(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
) -> Result<Json<EssayListResponse>, AppError> {
    let course = find_course(&state.db, course_id).await?;
    require_course_access(&state.db, &auth_user, &course).await?;

    let data = essay::Entity::find()
        .filter(essay::Column::CourseId.eq(course_id))
        .order_by_asc(essay::Column::Id)
        .all(&state.db)
        .await?
        .into_iter()
        .map(EssayResponse::from)
        .collect();

    Ok(Json(EssayListResponse { data }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Essays",
    operation_id = "getEssay",
    summary = "Get an essay assignment",
    description = "Requires course access. Students also get their own submission, if any.",
    params(("id" = i32, Path, description = "Essay ID")),
    responses(
        (status = 200, description = "Essay detail", body = EssayDetailResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "No access to this course (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Essay not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_essay(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<EssayDetailResponse>, AppError> {
    let essay = find_essay(&state.db, id).await?;
    let course = find_course(&state.db, essay.course_id).await?;
    require_course_access(&state.db, &auth_user, &course).await?;

    let my_submission = if auth_user.role.is_student() {
        find_submission(&state.db, id, auth_user.user_id)
            .await?
            .map(EssaySubmissionResponse::from)
    } else {
        None
    };

    Ok(Json(EssayDetailResponse {
        essay: essay.into(),
        my_submission,
    }))
}

#[utoipa::path(
    post,
    path = "/{id}/submit",
    tag = "Essays",
    operation_id = "submitEssay",
    summary = "Submit an essay",
    description = "Students with an approved enrollment, once per essay. Multipart fields: \
        `text_content` and, when the essay allows it, `file`. At least one must be non-empty.",
    params(("id" = i32, Path, description = "Essay ID")),
    request_body(content_type = "multipart/form-data", description = "`text_content` and/or `file`"),
    responses(
        (status = 201, description = "Submission stored", body = EssaySubmissionResponse),
        (status = 400, description = "Empty submission, file not allowed or bad file (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an enrolled student (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Essay not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already submitted (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(id, user_id = auth_user.user_id))]
pub async fn submit_essay(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_role(Role::Student)?;

    let essay = find_essay(&state.db, id).await?;
    let course = find_course(&state.db, essay.course_id).await?;
    require_course_access(&state.db, &auth_user, &course).await?;

    if find_submission(&state.db, id, auth_user.user_id).await?.is_some() {
        return Err(already_submitted());
    }

    let mut text_content: Option<String> = None;
    let mut uploaded_file: Option<String> = None;

    let parsed: Result<(), AppError> = async {
        while let Some(field) = next_field(&mut multipart).await? {
            match field.name() {
                Some("text_content") => text_content = non_blank(Some(field_text(field).await?)),
                Some("file") => {
                    // Browsers send an empty part when no file was picked.
                    let original = match field.file_name() {
                        Some(n) if !n.trim().is_empty() => n.to_string(),
                        _ => continue,
                    };
                    if !essay.allows_file_upload {
                        return Err(AppError::Validation(
                            "This essay does not accept file uploads".into(),
                        ));
                    }
                    if uploaded_file.is_some() {
                        return Err(AppError::Validation("Only one file may be uploaded".into()));
                    }
                    check_upload_name(&original, &state.config.uploads.allowed_extensions)
                        .map_err(|e| AppError::Validation(e.message().into()))?;
                    let name = timestamped_name(&original, chrono::Utc::now());
                    let size = stream_field_to_store(
                        field,
                        &*state.uploads,
                        UploadArea::General,
                        &name,
                        state.config.uploads.max_upload_size,
                    )
                    .await?;
                    if size == 0 {
                        discard_upload(&*state.uploads, UploadArea::General, &name).await;
                    } else {
                        uploaded_file = Some(name);
                    }
                }
                _ => {}
            }
        }

        if text_content.is_none() && uploaded_file.is_none() {
            return Err(AppError::Validation(
                "Submission must include text or a file".into(),
            ));
        }
        Ok(())
    }
    .await;

    if let Err(e) = parsed {
        if let Some(name) = &uploaded_file {
            discard_upload(&*state.uploads, UploadArea::General, name).await;
        }
        return Err(e);
    }

    let now = chrono::Utc::now();
    let result = essay_submission::ActiveModel {
        essay_id: Set(id),
        student_id: Set(auth_user.user_id),
        text_content: Set(text_content),
        uploaded_file: Set(uploaded_file.clone()),
        score: Set(None),
        feedback: Set(None),
        graded: Set(false),
        graded_at: Set(None),
        submitted_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await;

    let model = match result {
        Ok(model) => model,
        Err(e) => {
            if let Some(ref name) = uploaded_file {
                discard_upload(&*state.uploads, UploadArea::General, name).await;
            }
            return Err(match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => already_submitted(),
                _ => AppError::from(e),
            });
        }
    };

    tracing::info!(submission_id = model.id, essay_id = id, "Essay submitted");
    Ok((StatusCode::CREATED, Json(EssaySubmissionResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/{id}/submissions",
    tag = "Essays",
    operation_id = "listEssaySubmissions",
    summary = "List submissions of an essay",
    description = "Owning teacher only. Newest first.",
    params(("id" = i32, Path, description = "Essay ID")),
    responses(
        (status = 200, description = "Submission list", body = EssaySubmissionListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Essay not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn list_essay_submissions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<EssaySubmissionListResponse>, AppError> {
    let essay = find_essay(&state.db, id).await?;
    let course = find_course(&state.db, essay.course_id).await?;
    require_course_owner(&auth_user, &course)?;

    let data = essay_submission::Entity::find()
        .filter(essay_submission::Column::EssayId.eq(id))
        .find_also_related(user::Entity)
        .order_by_desc(essay_submission::Column::SubmittedAt)
        .order_by_desc(essay_submission::Column::Id)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|(s, student)| {
            let mut r = EssaySubmissionResponse::from(s);
            r.student_name = student.map(|u| u.full_name());
            r
        })
        .collect();

    Ok(Json(EssaySubmissionListResponse { data }))
}

#[utoipa::path(
    post,
    path = "/{id}/grade",
    tag = "Essays",
    operation_id = "gradeEssaySubmission",
    summary = "Grade an essay submission",
    description = "Owning teacher only. The score must be between 0 and the essay's \
        `max_points`. A submission is graded once.",
    params(("id" = i32, Path, description = "Essay submission ID")),
    request_body = GradeEssayRequest,
    responses(
        (status = 200, description = "Submission graded", body = EssaySubmissionResponse),
        (status = 400, description = "Score out of range (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Submission not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already graded (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn grade_essay(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<GradeEssayRequest>,
) -> Result<Json<EssaySubmissionResponse>, AppError> {
    let txn = state.db.begin().await?;

    let submission = essay_submission::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".into()))?;
    let essay = find_essay(&txn, submission.essay_id).await?;
    let course = find_course(&txn, essay.course_id).await?;
    require_course_owner(&auth_user, &course)?;

    check_essay_score(payload.score, essay.max_points)
        .map_err(|e| AppError::Validation(e.to_string()))?;
    if submission.graded {
        return Err(AppError::Conflict("Submission has already been graded".into()));
    }

    let mut active: essay_submission::ActiveModel = submission.into();
    active.score = Set(Some(payload.score));
    active.feedback = Set(non_blank(payload.feedback));
    active.graded = Set(true);
    active.graded_at = Set(Some(chrono::Utc::now()));
    let model = active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(
        submission_id = model.id,
        score = payload.score,
        max_points = essay.max_points,
        "Essay graded"
    );
    Ok(Json(model.into()))
}

fn already_submitted() -> AppError {
    AppError::Conflict("You have already submitted this essay".into())
}

async fn find_submission<C: ConnectionTrait>(
    db: &C,
    essay_id: i32,
    student_id: i32,
) -> Result<Option<essay_submission::Model>, AppError> {
    Ok(essay_submission::Entity::find()
        .filter(essay_submission::Column::EssayId.eq(essay_id))
        .filter(essay_submission::Column::StudentId.eq(student_id))
        .one(db)
        .await?)
}
