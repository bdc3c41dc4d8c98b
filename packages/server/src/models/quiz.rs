use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::AnswerOption;
use serde::{Deserialize, Serialize};

use crate::entity::{quiz, quiz_answer, quiz_question, quiz_submission};
use crate::error::AppError;
use crate::models::shared::{validate_required, validate_text, validate_title};

/// One multiple-choice question.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct QuestionRequest {
    #[schema(example = "Which organelle produces ATP?")]
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    /// `A`-`D`, case-insensitive.
    #[schema(example = "c")]
    pub correct_option: String,
    /// Default: 1.
    #[schema(example = 5)]
    pub points: Option<i32>,
}

impl QuestionRequest {
    pub fn points(&self) -> i32 {
        self.points.unwrap_or(1)
    }
}

/// Validate one question and return its parsed correct option.
pub fn validate_question(q: &QuestionRequest) -> Result<AnswerOption, AppError> {
    validate_required("Question text", &q.question_text)?;
    for (name, value) in [
        ("Option A", &q.option_a),
        ("Option B", &q.option_b),
        ("Option C", &q.option_c),
        ("Option D", &q.option_d),
    ] {
        validate_text(name, value, 500)?;
    }
    if !(1..=1000).contains(&q.points()) {
        return Err(AppError::Validation("Points must be 1-1000".into()));
    }
    q.correct_option
        .parse::<AnswerOption>()
        .map_err(|e| AppError::Validation(e.to_string()))
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateQuizRequest {
    #[schema(example = "Cell Structure Quiz")]
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<QuestionRequest>,
}

/// Returns the parsed correct option of each question, in order.
pub fn validate_create_quiz(payload: &CreateQuizRequest) -> Result<Vec<AnswerOption>, AppError> {
    validate_title(&payload.title)?;
    if payload.questions.is_empty() {
        return Err(AppError::Validation(
            "A quiz needs at least one question".into(),
        ));
    }
    if payload.questions.len() > 200 {
        return Err(AppError::Validation("Too many questions: max 200".into()));
    }
    payload
        .questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            validate_question(q).map_err(|e| match e {
                AppError::Validation(msg) => {
                    AppError::Validation(format!("Question {}: {msg}", i + 1))
                }
                other => other,
            })
        })
        .collect()
}

/// Answer sheet keyed by question ID.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SubmitQuizRequest {
    /// Question ID -> selected option (`A`-`D`, case-insensitive).
    /// Unanswered questions may be omitted.
    #[schema(example = json!({"1": "A", "2": "b"}))]
    pub answers: HashMap<i32, String>,
}

/// Parse the answer sheet, rejecting unknown questions and invalid options.
pub fn parse_answer_sheet(
    payload: &SubmitQuizRequest,
    question_ids: &[i32],
) -> Result<HashMap<i32, AnswerOption>, AppError> {
    payload
        .answers
        .iter()
        .map(|(&question_id, raw)| {
            if !question_ids.contains(&question_id) {
                return Err(AppError::Validation(format!(
                    "Question {question_id} is not part of this quiz"
                )));
            }
            let option = raw
                .parse::<AnswerOption>()
                .map_err(|e| AppError::Validation(e.to_string()))?;
            Ok((question_id, option))
        })
        .collect()
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct QuizResponse {
    pub id: i32,
    pub course_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub total_points: i32,
    pub created_at: DateTime<Utc>,
}

impl From<quiz::Model> for QuizResponse {
    fn from(m: quiz::Model) -> Self {
        Self {
            id: m.id,
            course_id: m.course_id,
            title: m.title,
            description: m.description,
            total_points: m.total_points,
            created_at: m.created_at,
        }
    }
}

/// A question as shown to the caller. `correct_option` is present only for
/// the owning teacher and admins.
#[derive(Serialize, utoipa::ToSchema)]
pub struct QuestionResponse {
    pub id: i32,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub points: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_option: Option<AnswerOption>,
}

impl QuestionResponse {
    pub fn new(m: quiz_question::Model, reveal_answer: bool) -> Self {
        Self {
            id: m.id,
            question_text: m.question_text,
            option_a: m.option_a,
            option_b: m.option_b,
            option_c: m.option_c,
            option_d: m.option_d,
            points: m.points,
            correct_option: reveal_answer.then_some(m.correct_option),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct QuizAnswerResponse {
    pub question_id: i32,
    pub selected_option: AnswerOption,
    pub points_earned: i32,
}

impl From<quiz_answer::Model> for QuizAnswerResponse {
    fn from(m: quiz_answer::Model) -> Self {
        Self {
            question_id: m.question_id,
            selected_option: m.selected_option,
            points_earned: m.points_earned,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct QuizSubmissionResponse {
    pub id: i32,
    pub quiz_id: i32,
    pub student_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    pub total_score: i32,
    pub max_score: i32,
    /// Rounded to two decimals.
    #[schema(example = 33.33)]
    pub percentage: f64,
    pub graded: bool,
    pub graded_at: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub answers: Vec<QuizAnswerResponse>,
}

impl QuizSubmissionResponse {
    pub fn new(m: quiz_submission::Model, max_score: i32) -> Self {
        Self {
            id: m.id,
            quiz_id: m.quiz_id,
            student_id: m.student_id,
            student_name: None,
            total_score: m.total_score,
            max_score,
            percentage: common::grading::grade_percentage(
                i64::from(m.total_score),
                i64::from(max_score),
            ),
            graded: m.graded,
            graded_at: m.graded_at,
            submitted_at: m.submitted_at,
            answers: Vec::new(),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct QuizDetailResponse {
    pub quiz: QuizResponse,
    pub questions: Vec<QuestionResponse>,
    /// The calling student's submission, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_submission: Option<QuizSubmissionResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct QuizListResponse {
    pub data: Vec<QuizResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct QuizSubmissionListResponse {
    pub data: Vec<QuizSubmissionResponse>,
}
