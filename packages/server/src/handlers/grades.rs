use axum::Json;
use axum::extract::State;
use common::Role;
use common::grading::grade_percentage;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{essay, essay_submission, quiz, quiz_submission};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::grades::{EssayGradeItem, GradesResponse, QuizGradeItem};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Grades",
    operation_id = "getMyGrades",
    summary = "Get the caller's grade book",
    description = "Students only. Every quiz and essay submission, newest first, with the \
        overall quiz percentage and the percentage over graded essays.",
    responses(
        (status = 200, description = "Grade book", body = GradesResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a student (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn student_grades(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<GradesResponse>, AppError> {
    auth_user.require_role(Role::Student)?;

    let quiz_rows = quiz_submission::Entity::find()
        .filter(quiz_submission::Column::StudentId.eq(auth_user.user_id))
        .find_also_related(quiz::Entity)
        .order_by_desc(quiz_submission::Column::SubmittedAt)
        .order_by_desc(quiz_submission::Column::Id)
        .all(&state.db)
        .await?;

    let quizzes: Vec<QuizGradeItem> = quiz_rows
        .into_iter()
        .filter_map(|(s, q)| q.map(|q| (s, q)))
        .map(|(s, q)| QuizGradeItem {
            submission_id: s.id,
            quiz_id: q.id,
            quiz_title: q.title,
            course_id: q.course_id,
            total_score: s.total_score,
            max_score: q.total_points,
            percentage: grade_percentage(s.total_score.into(), q.total_points.into()),
            submitted_at: s.submitted_at,
        })
        .collect();

    let essay_rows = essay_submission::Entity::find()
        .filter(essay_submission::Column::StudentId.eq(auth_user.user_id))
        .find_also_related(essay::Entity)
        .order_by_desc(essay_submission::Column::SubmittedAt)
        .order_by_desc(essay_submission::Column::Id)
        .all(&state.db)
        .await?;

    let essays: Vec<EssayGradeItem> = essay_rows
        .into_iter()
        .filter_map(|(s, e)| e.map(|e| (s, e)))
        .map(|(s, e)| EssayGradeItem {
            submission_id: s.id,
            essay_id: e.id,
            essay_title: e.title,
            course_id: e.course_id,
            score: s.score,
            max_points: e.max_points,
            feedback: s.feedback,
            graded: s.graded,
            submitted_at: s.submitted_at,
        })
        .collect();

    let (quiz_score, quiz_max) = quizzes.iter().fold((0i64, 0i64), |(s, m), q| {
        (s + i64::from(q.total_score), m + i64::from(q.max_score))
    });
    let (essay_score, essay_max) = essays
        .iter()
        .filter(|e| e.graded)
        .fold((0i64, 0i64), |(s, m), e| {
            (
                s + i64::from(e.score.unwrap_or(0)),
                m + i64::from(e.max_points),
            )
        });

    Ok(Json(GradesResponse {
        quiz_percentage: grade_percentage(quiz_score, quiz_max),
        essay_percentage: grade_percentage(essay_score, essay_max),
        quizzes,
        essays,
    }))
}
