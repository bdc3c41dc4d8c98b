use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::Role;
use common::grading::{AnswerKey, grade_quiz};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{course, quiz, quiz_answer, quiz_question, quiz_submission, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::quiz::*;
use crate::models::shared::non_blank;
use crate::state::AppState;
use crate::utils::course::{find_course, find_quiz, require_course_access, require_course_owner};

#[utoipa::path(
    post,
    path = "/{id}/quizzes",
    tag = "Quizzes",
    operation_id = "createQuiz",
    summary = "Create a multiple-choice quiz",
    description = "Owning teacher only. At least one question; each has options A-D, a correct \
        option and a point value (default 1). The quiz's total points are the sum of the \
        question points.",
    params(("id" = i32, Path, description = "Course ID")),
    request_body = CreateQuizRequest,
    responses(
        (status = 201, description = "Quiz created", body = QuizDetailResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(course_id, title = %payload.title))]
pub async fn create_quiz(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
    AppJson(payload): AppJson<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let correct = validate_create_quiz(&payload)?;

    let course = find_course(&state.db, course_id).await?;
    require_course_owner(&auth_user, &course)?;

    let total_points: i32 = payload.questions.iter().map(QuestionRequest::points).sum();

    let txn = state.db.begin().await?;

    let quiz = quiz::ActiveModel {
        course_id: Set(course.id),
        title: Set(payload.title.trim().to_string()),
        description: Set(non_blank(payload.description.clone())),
        total_points: Set(total_points),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut questions = Vec::with_capacity(payload.questions.len());
    for (q, correct_option) in payload.questions.iter().zip(correct) {
        let model = question_model(quiz.id, q, correct_option).insert(&txn).await?;
        questions.push(QuestionResponse::new(model, true));
    }

    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(QuizDetailResponse {
            quiz: quiz.into(),
            questions,
            my_submission: None,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}/quizzes",
    tag = "Quizzes",
    operation_id = "listQuizzes",
    summary = "List the quizzes of a course",
    description = "Requires course access.",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Quiz list", body = QuizListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "No access to this course (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(course_id))]
pub async fn list_quizzes(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
) -> Result<Json<QuizListResponse>, AppError> {
    let course = find_course(&state.db, course_id).await?;
    require_course_access(&state.db, &auth_user, &course).await?;

    let data = quiz::Entity::find()
        .filter(quiz::Column::CourseId.eq(course_id))
        .order_by_asc(quiz::Column::Id)
        .all(&state.db)
        .await?
        .into_iter()
        .map(QuizResponse::from)
        .collect();

    Ok(Json(QuizListResponse { data }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Quizzes",
    operation_id = "getQuiz",
    summary = "Get a quiz with its questions",
    description = "Requires course access. Correct options are only shown to the owning teacher \
        and admins. Students also get their own submission, if any.",
    params(("id" = i32, Path, description = "Quiz ID")),
    responses(
        (status = 200, description = "Quiz detail", body = QuizDetailResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "No access to this course (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Quiz not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_quiz(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<QuizDetailResponse>, AppError> {
    let quiz = find_quiz(&state.db, id).await?;
    let course = find_course(&state.db, quiz.course_id).await?;
    require_course_access(&state.db, &auth_user, &course).await?;

    Ok(Json(quiz_detail(&state.db, &auth_user, &course, quiz).await?))
}

#[utoipa::path(
    post,
    path = "/{id}/questions",
    tag = "Quizzes",
    operation_id = "addQuizQuestion",
    summary = "Add a question to a quiz",
    description = "Owning teacher only. Adds the question's points to the quiz total. Refused \
        once any student has submitted, since existing scores would no longer add up.",
    params(("id" = i32, Path, description = "Quiz ID")),
    request_body = QuestionRequest,
    responses(
        (status = 201, description = "Question added", body = QuizDetailResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Quiz not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Quiz already has submissions (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn add_question(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<QuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let correct = validate_question(&payload)?;

    let txn = state.db.begin().await?;

    let quiz = find_quiz(&txn, id).await?;
    let course = find_course(&txn, quiz.course_id).await?;
    require_course_owner(&auth_user, &course)?;

    let submissions = quiz_submission::Entity::find()
        .filter(quiz_submission::Column::QuizId.eq(id))
        .count(&txn)
        .await?;
    if submissions > 0 {
        return Err(AppError::Conflict(
            "Cannot add questions to a quiz that has submissions".into(),
        ));
    }

    question_model(id, &payload, correct).insert(&txn).await?;

    let total_points = quiz.total_points + payload.points();
    let mut active: quiz::ActiveModel = quiz.into();
    active.total_points = Set(total_points);
    let quiz = active.update(&txn).await?;

    txn.commit().await?;

    let detail = quiz_detail(&state.db, &auth_user, &course, quiz).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

#[utoipa::path(
    post,
    path = "/{id}/submit",
    tag = "Quizzes",
    operation_id = "submitQuiz",
    summary = "Submit answers to a quiz",
    description = "Students with an approved enrollment, once per quiz. Each answered question \
        scores its full points when the option matches (case-insensitive) and 0 otherwise; \
        unanswered questions score 0. The submission and all its answers are stored atomically.",
    params(("id" = i32, Path, description = "Quiz ID")),
    request_body = SubmitQuizRequest,
    responses(
        (status = 201, description = "Submission graded", body = QuizSubmissionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an enrolled student (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Quiz not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already submitted (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, user_id = auth_user.user_id))]
pub async fn submit_quiz(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_role(Role::Student)?;

    let txn = state.db.begin().await?;

    let quiz = find_quiz(&txn, id).await?;
    let course = find_course(&txn, quiz.course_id).await?;
    require_course_access(&txn, &auth_user, &course).await?;

    if find_submission(&txn, id, auth_user.user_id).await?.is_some() {
        return Err(already_submitted());
    }

    let keys: Vec<AnswerKey> = quiz_question::Entity::find()
        .filter(quiz_question::Column::QuizId.eq(id))
        .order_by_asc(quiz_question::Column::Id)
        .all(&txn)
        .await?
        .into_iter()
        .map(|q| AnswerKey {
            question_id: q.id,
            correct: q.correct_option,
            points: q.points,
        })
        .collect();
    let question_ids: Vec<i32> = keys.iter().map(|k| k.question_id).collect();
    let sheet = parse_answer_sheet(&payload, &question_ids)?;
    let grade = grade_quiz(&keys, &sheet);

    let now = chrono::Utc::now();
    let submission = quiz_submission::ActiveModel {
        quiz_id: Set(id),
        student_id: Set(auth_user.user_id),
        total_score: Set(grade.total_score),
        graded: Set(true),
        graded_at: Set(Some(now)),
        submitted_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => already_submitted(),
        _ => AppError::from(e),
    })?;

    let mut answers = Vec::with_capacity(grade.answers.len());
    for a in &grade.answers {
        let model = quiz_answer::ActiveModel {
            submission_id: Set(submission.id),
            question_id: Set(a.question_id),
            selected_option: Set(a.selected),
            points_earned: Set(a.points_earned),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        answers.push(QuizAnswerResponse::from(model));
    }

    txn.commit().await?;

    tracing::info!(
        submission_id = submission.id,
        total_score = submission.total_score,
        max_score = quiz.total_points,
        "Quiz graded"
    );

    let mut response = QuizSubmissionResponse::new(submission, quiz.total_points);
    response.answers = answers;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/{id}/submissions",
    tag = "Quizzes",
    operation_id = "listQuizSubmissions",
    summary = "List submissions of a quiz",
    description = "Owning teacher only. Newest first.",
    params(("id" = i32, Path, description = "Quiz ID")),
    responses(
        (status = 200, description = "Submission list", body = QuizSubmissionListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Quiz not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn list_quiz_submissions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<QuizSubmissionListResponse>, AppError> {
    let quiz = find_quiz(&state.db, id).await?;
    let course = find_course(&state.db, quiz.course_id).await?;
    require_course_owner(&auth_user, &course)?;

    let rows = quiz_submission::Entity::find()
        .filter(quiz_submission::Column::QuizId.eq(id))
        .find_also_related(user::Entity)
        .order_by_desc(quiz_submission::Column::SubmittedAt)
        .order_by_desc(quiz_submission::Column::Id)
        .all(&state.db)
        .await?;

    let data = rows
        .into_iter()
        .map(|(s, student)| {
            let mut r = QuizSubmissionResponse::new(s, quiz.total_points);
            r.student_name = student.map(|u| u.full_name());
            r
        })
        .collect();

    Ok(Json(QuizSubmissionListResponse { data }))
}

fn already_submitted() -> AppError {
    AppError::Conflict("You have already submitted this quiz".into())
}

fn question_model(
    quiz_id: i32,
    q: &QuestionRequest,
    correct_option: common::AnswerOption,
) -> quiz_question::ActiveModel {
    quiz_question::ActiveModel {
        quiz_id: Set(quiz_id),
        question_text: Set(q.question_text.trim().to_string()),
        option_a: Set(q.option_a.trim().to_string()),
        option_b: Set(q.option_b.trim().to_string()),
        option_c: Set(q.option_c.trim().to_string()),
        option_d: Set(q.option_d.trim().to_string()),
        correct_option: Set(correct_option),
        points: Set(q.points()),
        ..Default::default()
    }
}

async fn find_submission<C: ConnectionTrait>(
    db: &C,
    quiz_id: i32,
    student_id: i32,
) -> Result<Option<quiz_submission::Model>, AppError> {
    Ok(quiz_submission::Entity::find()
        .filter(quiz_submission::Column::QuizId.eq(quiz_id))
        .filter(quiz_submission::Column::StudentId.eq(student_id))
        .one(db)
        .await?)
}

async fn quiz_detail<C: ConnectionTrait>(
    db: &C,
    viewer: &AuthUser,
    course: &course::Model,
    quiz: quiz::Model,
) -> Result<QuizDetailResponse, AppError> {
    let reveal = viewer.role.is_admin() || course.teacher_id == Some(viewer.user_id);

    let questions = quiz_question::Entity::find()
        .filter(quiz_question::Column::QuizId.eq(quiz.id))
        .order_by_asc(quiz_question::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|q| QuestionResponse::new(q, reveal))
        .collect();

    let my_submission = if viewer.role.is_student() {
        match find_submission(db, quiz.id, viewer.user_id).await? {
            Some(s) => {
                let answers = quiz_answer::Entity::find()
                    .filter(quiz_answer::Column::SubmissionId.eq(s.id))
                    .order_by_asc(quiz_answer::Column::QuestionId)
                    .all(db)
                    .await?
                    .into_iter()
                    .map(QuizAnswerResponse::from)
                    .collect();
                let mut r = QuizSubmissionResponse::new(s, quiz.total_points);
                r.answers = answers;
                Some(r)
            }
            None => None,
        }
    } else {
        None
    };

    Ok(QuizDetailResponse {
        quiz: quiz.into(),
        questions,
        my_submission,
    })
}
