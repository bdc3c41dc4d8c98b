use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize, utoipa::ToSchema)]
pub struct QuizGradeItem {
    pub submission_id: i32,
    pub quiz_id: i32,
    pub quiz_title: String,
    pub course_id: i32,
    pub total_score: i32,
    pub max_score: i32,
    pub percentage: f64,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EssayGradeItem {
    pub submission_id: i32,
    pub essay_id: i32,
    pub essay_title: String,
    pub course_id: i32,
    /// `None` until graded.
    pub score: Option<i32>,
    pub max_points: i32,
    pub feedback: Option<String>,
    pub graded: bool,
    pub submitted_at: DateTime<Utc>,
}

/// A student's grade book.
#[derive(Serialize, utoipa::ToSchema)]
pub struct GradesResponse {
    pub quizzes: Vec<QuizGradeItem>,
    pub essays: Vec<EssayGradeItem>,
    /// Sum of quiz scores over sum of quiz maxima.
    #[schema(example = 72.5)]
    pub quiz_percentage: f64,
    /// Same, over graded essays only.
    #[schema(example = 80.0)]
    pub essay_percentage: f64,
}
