// src/session/api.rs

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        assignment::AssignmentPaper,
        submission::{Submission, SubmitAssignment},
    },
    services::AssessmentService,
};

/// The contracts an attempt calls across its two suspension points.
#[async_trait]
pub trait AssessmentApi: Send + Sync {
    async fn assignment_paper(&self, assignment_id: i64) -> Result<AssignmentPaper, AppError>;
    async fn submit_assignment(&self, command: SubmitAssignment) -> Result<Submission, AppError>;
    async fn student_results(&self, student_id: i64) -> Result<Vec<Submission>, AppError>;
}

/// In-process binding, used when the attempt runs next to the service.
#[async_trait]
impl AssessmentApi for AssessmentService {
    async fn assignment_paper(&self, assignment_id: i64) -> Result<AssignmentPaper, AppError> {
        self.get_assignment_paper(assignment_id).await
    }

    async fn submit_assignment(&self, command: SubmitAssignment) -> Result<Submission, AppError> {
        AssessmentService::submit_assignment(self, command).await
    }

    async fn student_results(&self, student_id: i64) -> Result<Vec<Submission>, AppError> {
        self.get_student_results(student_id).await
    }
}
