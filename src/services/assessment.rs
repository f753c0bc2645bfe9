// src/services/assessment.rs

use std::sync::Arc;

use crate::{
    error::AppError,
    models::{
        assignment::{Assignment, AssignmentPaper, AssignmentSummary, NewAssignment, Question},
        review::Review,
        statistics::AssignmentStatistics,
        submission::{NewSubmission, Submission, SubmitAssignment},
    },
    services::{
        grading,
        review::{self, Audience},
        statistics,
    },
    storage::Storage,
};

/// The request/response contracts of the assessment subsystem.
#[derive(Clone)]
pub struct AssessmentService {
    storage: Arc<dyn Storage>,
}

impl AssessmentService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    async fn assignment(&self, id: i64) -> Result<Assignment, AppError> {
        self.storage
            .get_assignment(id)
            .await?
            .ok_or(AppError::NotFound(format!("Assignment {} not found", id)))
    }

    /// Active assignments, without their questions.
    pub async fn list_assignments(&self) -> Result<Vec<AssignmentSummary>, AppError> {
        let assignments = self.storage.list_assignments(true).await?;
        Ok(assignments.iter().map(Assignment::summary).collect())
    }

    /// GetAssignmentQuestions. Unknown and inactive assignments are NotFound.
    pub async fn get_assignment_questions(&self, assignment_id: i64) -> Result<Vec<Question>, AppError> {
        let assignment = self.assignment(assignment_id).await?;
        if !assignment.is_active {
            return Err(AppError::NotFound(format!(
                "Assignment {} is not active",
                assignment_id
            )));
        }
        Ok(assignment.questions)
    }

    /// The student-facing paper: title, time limit and questions without the key.
    pub async fn get_assignment_paper(&self, assignment_id: i64) -> Result<AssignmentPaper, AppError> {
        let assignment = self.assignment(assignment_id).await?;
        if !assignment.is_active {
            return Err(AppError::NotFound(format!(
                "Assignment {} is not active",
                assignment_id
            )));
        }
        Ok(assignment.paper())
    }

    /// SubmitAssignment. Grades once and records the result at most once.
    pub async fn submit_assignment(&self, command: SubmitAssignment) -> Result<Submission, AppError> {
        let assignment = self.assignment(command.assignment_id).await?;

        if command.answers.len() != assignment.questions.len() {
            return Err(AppError::Validation(format!(
                "Expected {} answers, got {}",
                assignment.questions.len(),
                command.answers.len()
            )));
        }

        let report = grading::grade(&assignment.questions, &command.answers)?;

        let new = NewSubmission {
            student_id: command.student_id,
            assignment_id: command.assignment_id,
            questions_version: assignment.questions_version,
            answers: command.answers,
            results: report.results,
            correct_answers: report.correct_answers,
            total_questions: report.total_questions,
            score: report.score,
            max_score: report.max_score,
            percentage: report.percentage,
            letter_grade: report.letter_grade,
            time_spent_seconds: command.time_spent_seconds,
        };

        match self.storage.insert_submission(new).await {
            Ok(submission) => {
                tracing::info!(
                    submission_id = submission.id,
                    student_id = submission.student_id,
                    assignment_id = submission.assignment_id,
                    percentage = submission.percentage,
                    grade = %submission.letter_grade,
                    "Submission recorded"
                );
                Ok(submission)
            }
            Err(AppError::AlreadySubmitted(msg)) => {
                tracing::warn!(
                    student_id = command.student_id,
                    assignment_id = command.assignment_id,
                    "Rejected duplicate submission"
                );
                Err(AppError::AlreadySubmitted(msg))
            }
            Err(AppError::Conflict(msg)) => {
                tracing::warn!(
                    student_id = command.student_id,
                    assignment_id = command.assignment_id,
                    "Questions changed while grading, submission not recorded"
                );
                Err(AppError::Conflict(msg))
            }
            Err(e) => Err(e),
        }
    }

    /// GetAssignmentStatistics. Zeroed when nobody has submitted.
    pub async fn get_assignment_statistics(
        &self,
        assignment_id: i64,
    ) -> Result<AssignmentStatistics, AppError> {
        self.assignment(assignment_id).await?;
        let submissions = self
            .storage
            .list_submissions_for_assignment(assignment_id)
            .await?;
        Ok(statistics::aggregate(assignment_id, &submissions))
    }

    /// GetSubmissionsForAssignment.
    pub async fn get_submissions_for_assignment(
        &self,
        assignment_id: i64,
    ) -> Result<Vec<Submission>, AppError> {
        self.assignment(assignment_id).await?;
        self.storage.list_submissions_for_assignment(assignment_id).await
    }

    /// GetReview, shaped for the caller.
    pub async fn get_review(&self, submission_id: i64, audience: Audience) -> Result<Review, AppError> {
        let submission = self
            .storage
            .get_submission(submission_id)
            .await?
            .ok_or(AppError::NotFound(format!("Submission {} not found", submission_id)))?;
        let assignment = self.assignment(submission.assignment_id).await?;
        review::reconstruct(audience, &assignment, submission)
    }

    /// GetStudentResults.
    pub async fn get_student_results(&self, student_id: i64) -> Result<Vec<Submission>, AppError> {
        self.storage.list_submissions_for_student(student_id).await
    }

    pub async fn create_assignment(&self, new: NewAssignment) -> Result<Assignment, AppError> {
        if new.questions.is_empty() {
            return Err(AppError::InvalidAssignment(
                "An assignment needs at least one question".to_string(),
            ));
        }
        let assignment = self.storage.create_assignment(new).await?;
        tracing::info!(
            assignment_id = assignment.id,
            questions = assignment.questions.len(),
            "Assignment created"
        );
        Ok(assignment)
    }

    /// Replaces questions; refused once submissions reference the assignment.
    pub async fn replace_questions(
        &self,
        assignment_id: i64,
        questions: Vec<Question>,
    ) -> Result<Assignment, AppError> {
        if questions.is_empty() {
            return Err(AppError::InvalidAssignment(
                "An assignment needs at least one question".to_string(),
            ));
        }
        match self.storage.replace_questions(assignment_id, questions).await {
            Ok(assignment) => {
                tracing::info!(assignment_id, "Assignment questions replaced");
                Ok(assignment)
            }
            Err(AppError::Conflict(msg)) => {
                tracing::warn!(assignment_id, "Refused to edit questions of a submitted assignment");
                Err(AppError::Conflict(msg))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn set_assignment_active(
        &self,
        assignment_id: i64,
        is_active: bool,
    ) -> Result<Assignment, AppError> {
        self.storage.set_assignment_active(assignment_id, is_active).await
    }
}
