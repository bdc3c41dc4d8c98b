#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// One of the four options of a multiple-choice question.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(1))")
)]
pub enum AnswerOption {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "A"))]
    A,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "B"))]
    B,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "C"))]
    C,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "D"))]
    D,
}

impl AnswerOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

impl fmt::Display for AnswerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid option '{invalid}'. Valid values: A, B, C, D")]
pub struct ParseOptionError {
    invalid: String,
}

/// Case-insensitive; surrounding whitespace is ignored.
impl FromStr for AnswerOption {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            _ => Err(ParseOptionError {
                invalid: s.to_string(),
            }),
        }
    }
}

/// The part of a stored question needed to grade it.
#[derive(Debug, Clone, Copy)]
pub struct AnswerKey {
    pub question_id: i32,
    pub correct: AnswerOption,
    pub points: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradedAnswer {
    pub question_id: i32,
    pub selected: AnswerOption,
    pub points_earned: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizGrade {
    pub answers: Vec<GradedAnswer>,
    pub total_score: i32,
}

/// Points earned for one answer: all or nothing.
pub fn score_answer(selected: AnswerOption, key: &AnswerKey) -> i32 {
    if selected == key.correct { key.points } else { 0 }
}

/// Grade a submitted answer sheet against the quiz's keys.
///
/// Unanswered questions produce no answer row and contribute 0. The total is
/// always the sum of the produced rows.
pub fn grade_quiz(keys: &[AnswerKey], sheet: &HashMap<i32, AnswerOption>) -> QuizGrade {
    let answers: Vec<GradedAnswer> = keys
        .iter()
        .filter_map(|key| {
            sheet.get(&key.question_id).map(|&selected| GradedAnswer {
                question_id: key.question_id,
                selected,
                points_earned: score_answer(selected, key),
            })
        })
        .collect();
    let total_score = answers.iter().map(|a| a.points_earned).sum();
    QuizGrade {
        answers,
        total_score,
    }
}

/// Percentage rounded to two decimals; 0 when nothing was attainable.
pub fn grade_percentage(score: i64, max_score: i64) -> f64 {
    if max_score == 0 {
        return 0.0;
    }
    let pct = score as f64 / max_score as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Score must be between 0 and {max_points}")]
pub struct ScoreOutOfRange {
    pub max_points: i32,
}

pub fn check_essay_score(score: i32, max_points: i32) -> Result<(), ScoreOutOfRange> {
    if (0..=max_points).contains(&score) {
        Ok(())
    } else {
        Err(ScoreOutOfRange { max_points })
    }
}
