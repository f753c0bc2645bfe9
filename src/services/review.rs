// src/services/review.rs

use crate::{
    error::AppError,
    models::{
        assignment::{Assignment, Label},
        review::{QuestionReview, Review, ReviewOption},
        submission::Submission,
    },
};

/// Who is looking at a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// A student, allowed to see only their own submissions.
    Student { student_id: i64 },
    Staff,
}

impl Audience {
    pub fn can_view(&self, submission: &Submission) -> bool {
        match self {
            Audience::Student { student_id } => *student_id == submission.student_id,
            Audience::Staff => true,
        }
    }
}

/// Joins a stored submission with its assignment's questions.
///
/// Correctness comes from the submission's stored results, never from
/// re-grading, so the view always agrees with the recorded grade.
pub fn reconstruct(
    audience: Audience,
    assignment: &Assignment,
    submission: Submission,
) -> Result<Review, AppError> {
    if !audience.can_view(&submission) {
        return Err(AppError::Forbidden(
            "You can only review your own submissions".to_string(),
        ));
    }
    if submission.assignment_id != assignment.id {
        return Err(AppError::InternalServerError(format!(
            "Submission {} belongs to assignment {}, not {}",
            submission.id, submission.assignment_id, assignment.id
        )));
    }
    if submission.results.len() != assignment.questions.len() {
        return Err(AppError::InternalServerError(format!(
            "Submission {} has {} results but assignment {} has {} questions",
            submission.id,
            submission.results.len(),
            assignment.id,
            assignment.questions.len()
        )));
    }

    let per_question = assignment
        .questions
        .iter()
        .zip(&submission.results)
        .map(|(question, result)| QuestionReview {
            index: question.index,
            question_text: question.text.clone(),
            instruction: question.instruction.clone(),
            options: Label::ALL
                .iter()
                .map(|&label| ReviewOption {
                    label,
                    text: question.option(label).to_string(),
                })
                .collect(),
            correct_label: question.correct,
            student_label: submission.answers.get(question.index).copied().flatten(),
            is_correct: result.is_correct,
            points_earned: result.points_awarded,
            points_possible: result.points_possible,
        })
        .collect();

    Ok(Review {
        assignment: assignment.summary(),
        submission,
        per_question,
    })
}
