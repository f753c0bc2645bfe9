// src/models/submission.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::assignment::Label;

/// A-F classification of a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LetterGrade {
    A,
    B,
    C,
    D,
    F,
}

impl LetterGrade {
    pub fn as_str(self) -> &'static str {
        match self {
            LetterGrade::A => "A",
            LetterGrade::B => "B",
            LetterGrade::C => "C",
            LetterGrade::D => "D",
            LetterGrade::F => "F",
        }
    }
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LetterGrade {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(LetterGrade::A),
            "B" => Ok(LetterGrade::B),
            "C" => Ok(LetterGrade::C),
            "D" => Ok(LetterGrade::D),
            "F" => Ok(LetterGrade::F),
            other => Err(AppError::InternalServerError(format!(
                "Stored letter grade '{}' is not A-F",
                other
            ))),
        }
    }
}

/// Grading outcome of one question, stored with the submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub is_correct: bool,
    pub points_awarded: u32,
    pub points_possible: u32,
}

/// The single recorded attempt of one student at one assignment.
///
/// `answers[i]` is `None` when question `i` was left blank and the attempt
/// did not substitute a placeholder label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub student_id: i64,
    pub assignment_id: i64,
    pub answers: Vec<Option<Label>>,
    pub results: Vec<QuestionResult>,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub score: u32,
    pub max_score: u32,
    pub percentage: u8,
    pub letter_grade: LetterGrade,
    pub time_spent_seconds: u32,
    pub submitted_at: DateTime<Utc>,
}

/// A graded submission that has not been assigned an id yet.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub student_id: i64,
    pub assignment_id: i64,
    /// `Assignment::questions_version` of the key this was graded against.
    pub questions_version: i64,
    pub answers: Vec<Option<Label>>,
    pub results: Vec<QuestionResult>,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub score: u32,
    pub max_score: u32,
    pub percentage: u8,
    pub letter_grade: LetterGrade,
    pub time_spent_seconds: u32,
}

impl NewSubmission {
    pub fn into_submission(self, id: i64, submitted_at: DateTime<Utc>) -> Submission {
        Submission {
            id,
            student_id: self.student_id,
            assignment_id: self.assignment_id,
            answers: self.answers,
            results: self.results,
            correct_answers: self.correct_answers,
            total_questions: self.total_questions,
            score: self.score,
            max_score: self.max_score,
            percentage: self.percentage,
            letter_grade: self.letter_grade,
            time_spent_seconds: self.time_spent_seconds,
            submitted_at,
        }
    }
}

/// Typed submit command, as issued by an attempt or parsed from a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitAssignment {
    pub assignment_id: i64,
    pub student_id: i64,
    pub answers: Vec<Option<Label>>,
    pub time_spent_seconds: u32,
}

/// DTO for submitting an attempt over HTTP.
#[derive(Debug, Deserialize, Serialize)]
pub struct SubmitAssignmentRequest {
    /// One entry per question, in order. `null` marks an unanswered question.
    pub answers: Vec<Option<String>>,
    pub time_spent_seconds: u32,
}

impl SubmitAssignmentRequest {
    /// Parses raw labels, reporting the first unknown one by question index.
    pub fn into_command(self, assignment_id: i64, student_id: i64) -> Result<SubmitAssignment, AppError> {
        let answers = self
            .answers
            .iter()
            .enumerate()
            .map(|(i, raw)| match raw {
                None => Ok(None),
                Some(raw) => raw.parse::<Label>().map(Some).map_err(|_| {
                    AppError::Validation(format!("Unknown label '{}' for question {}", raw, i))
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SubmitAssignment {
            assignment_id,
            student_id,
            answers,
            time_spent_seconds: self.time_spent_seconds,
        })
    }
}
