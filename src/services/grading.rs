// src/services/grading.rs

//! Deterministic grading of a full answer sequence against an answer key.

use crate::{
    error::AppError,
    models::{
        assignment::{Label, Question},
        submission::{LetterGrade, QuestionResult},
    },
};

/// Outcome of grading one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeReport {
    pub results: Vec<QuestionResult>,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub score: u32,
    pub max_score: u32,
    pub percentage: u8,
    pub letter_grade: LetterGrade,
}

/// Grades `answers` against `questions`, position by position.
///
/// A `None` answer is never correct. Fails with `InvalidAssignment` when
/// there are no questions and with `Validation` when the lengths differ.
pub fn grade(questions: &[Question], answers: &[Option<Label>]) -> Result<GradeReport, AppError> {
    if questions.is_empty() {
        return Err(AppError::InvalidAssignment(
            "Assignment has no questions and cannot be graded".to_string(),
        ));
    }
    if answers.len() != questions.len() {
        return Err(AppError::Validation(format!(
            "Expected {} answers, got {}",
            questions.len(),
            answers.len()
        )));
    }

    let results: Vec<QuestionResult> = questions
        .iter()
        .zip(answers)
        .map(|(question, answer)| {
            let is_correct = *answer == Some(question.correct);
            QuestionResult {
                is_correct,
                points_awarded: if is_correct { question.points } else { 0 },
                points_possible: question.points,
            }
        })
        .collect();

    let correct_answers = results.iter().filter(|r| r.is_correct).count() as u32;
    let total_questions = questions.len() as u32;
    let percentage = percentage(correct_answers, total_questions);

    Ok(GradeReport {
        correct_answers,
        total_questions,
        score: results.iter().map(|r| r.points_awarded).sum(),
        max_score: results.iter().map(|r| r.points_possible).sum(),
        percentage,
        letter_grade: letter_grade(percentage),
        results,
    })
}

/// round(100 * correct / total), halves rounded up. `total` must be non-zero.
pub fn percentage(correct: u32, total: u32) -> u8 {
    debug_assert!(total > 0 && correct <= total);
    let (correct, total) = (u64::from(correct), u64::from(total));
    ((200 * correct + total) / (2 * total)) as u8
}

pub fn letter_grade(percentage: u8) -> LetterGrade {
    match percentage {
        90.. => LetterGrade::A,
        80..=89 => LetterGrade::B,
        70..=79 => LetterGrade::C,
        60..=69 => LetterGrade::D,
        _ => LetterGrade::F,
    }
}
