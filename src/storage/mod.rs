// src/storage/mod.rs

use std::sync::Arc;

use crate::{
    config::Config,
    error::AppError,
    models::{
        assignment::{Assignment, NewAssignment, Question},
        submission::{NewSubmission, Submission},
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStorage;
pub use postgres::PgStorage;

/// Repository contract for assignments and submissions.
///
/// `insert_submission` owns the at-most-once rule: a second insert for the
/// same (student, assignment) pair fails with `AlreadySubmitted`. It also
/// fails with `Conflict` when the assignment's `questions_version` no longer
/// matches the one the submission was graded against.
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    async fn get_assignment(&self, id: i64) -> Result<Option<Assignment>, AppError>;
    async fn list_assignments(&self, only_active: bool) -> Result<Vec<Assignment>, AppError>;
    async fn create_assignment(&self, assignment: NewAssignment) -> Result<Assignment, AppError>;

    /// Replaces the question sequence. Fails with `Conflict` once any
    /// submission references the assignment, `NotFound` if it does not exist.
    async fn replace_questions(
        &self,
        assignment_id: i64,
        questions: Vec<Question>,
    ) -> Result<Assignment, AppError>;

    async fn set_assignment_active(
        &self,
        assignment_id: i64,
        is_active: bool,
    ) -> Result<Assignment, AppError>;

    async fn insert_submission(&self, submission: NewSubmission) -> Result<Submission, AppError>;
    async fn get_submission(&self, id: i64) -> Result<Option<Submission>, AppError>;
    async fn list_submissions_for_assignment(
        &self,
        assignment_id: i64,
    ) -> Result<Vec<Submission>, AppError>;
    async fn list_submissions_for_student(&self, student_id: i64)
    -> Result<Vec<Submission>, AppError>;
}

/// Picks the backend from configuration: Postgres when a URL is set.
pub async fn create_storage(config: &Config) -> Result<Arc<dyn Storage>, AppError> {
    match &config.database_url {
        Some(url) => {
            let storage = PgStorage::connect(url).await?;
            Ok(Arc::new(storage))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage (data is not persisted)");
            Ok(Arc::new(MemoryStorage::new()))
        }
    }
}
