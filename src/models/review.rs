// src/models/review.rs

use serde::{Deserialize, Serialize};

use crate::models::assignment::{AssignmentSummary, Label};
use crate::models::submission::Submission;

/// Option text keyed by its label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewOption {
    pub label: Label,
    pub text: String,
}

/// Side-by-side view of one question: the key against the student's choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionReview {
    pub index: usize,
    pub question_text: String,
    pub instruction: Option<String>,
    pub options: Vec<ReviewOption>,
    pub correct_label: Label,
    /// `None` when the question was recorded without an answer.
    pub student_label: Option<Label>,
    pub is_correct: bool,
    pub points_earned: u32,
    pub points_possible: u32,
}

/// Full review of a stored submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub assignment: AssignmentSummary,
    pub submission: Submission,
    pub per_question: Vec<QuestionReview>,
}
