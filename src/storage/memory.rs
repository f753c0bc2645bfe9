// src/storage/memory.rs

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use tokio::sync::RwLock;

use super::Storage;
use crate::{
    error::AppError,
    models::{
        assignment::{Assignment, NewAssignment, Question},
        submission::{NewSubmission, Submission},
    },
};

#[derive(Default)]
struct Tables {
    next_assignment_id: i64,
    next_submission_id: i64,
    assignments: BTreeMap<i64, Assignment>,
    submissions: BTreeMap<i64, Submission>,
    /// (student_id, assignment_id) -> submission id
    by_student_assignment: HashMap<(i64, i64), i64>,
}

/// Process-local backend. Every write happens under one lock, which makes
/// the uniqueness check and the insert a single step.
#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn get_assignment(&self, id: i64) -> Result<Option<Assignment>, AppError> {
        Ok(self.tables.read().await.assignments.get(&id).cloned())
    }

    async fn list_assignments(&self, only_active: bool) -> Result<Vec<Assignment>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .assignments
            .values()
            .filter(|a| !only_active || a.is_active)
            .cloned()
            .collect())
    }

    async fn create_assignment(&self, new: NewAssignment) -> Result<Assignment, AppError> {
        let mut tables = self.tables.write().await;
        tables.next_assignment_id += 1;
        let assignment = Assignment {
            id: tables.next_assignment_id,
            title: new.title,
            description: new.description,
            time_limit_minutes: new.time_limit_minutes,
            questions: new.questions,
            questions_version: 1,
            is_active: new.is_active,
            created_by: new.created_by,
            created_at: Utc::now(),
        };
        tables.assignments.insert(assignment.id, assignment.clone());
        Ok(assignment)
    }

    async fn replace_questions(
        &self,
        assignment_id: i64,
        questions: Vec<Question>,
    ) -> Result<Assignment, AppError> {
        let mut tables = self.tables.write().await;
        let locked = tables
            .submissions
            .values()
            .any(|s| s.assignment_id == assignment_id);
        let assignment = tables
            .assignments
            .get_mut(&assignment_id)
            .ok_or(AppError::NotFound("Assignment not found".to_string()))?;
        if locked {
            return Err(AppError::Conflict(
                "Questions cannot change once submissions exist".to_string(),
            ));
        }
        assignment.questions = questions;
        assignment.questions_version += 1;
        Ok(assignment.clone())
    }

    async fn set_assignment_active(
        &self,
        assignment_id: i64,
        is_active: bool,
    ) -> Result<Assignment, AppError> {
        let mut tables = self.tables.write().await;
        let assignment = tables
            .assignments
            .get_mut(&assignment_id)
            .ok_or(AppError::NotFound("Assignment not found".to_string()))?;
        assignment.is_active = is_active;
        Ok(assignment.clone())
    }

    async fn insert_submission(&self, new: NewSubmission) -> Result<Submission, AppError> {
        let mut tables = self.tables.write().await;
        let key = (new.student_id, new.assignment_id);
        if tables.by_student_assignment.contains_key(&key) {
            return Err(AppError::AlreadySubmitted(
                "A submission already exists for this assignment".to_string(),
            ));
        }
        let current = tables
            .assignments
            .get(&new.assignment_id)
            .map(|a| a.questions_version)
            .ok_or(AppError::NotFound("Assignment not found".to_string()))?;
        if current != new.questions_version {
            return Err(AppError::Conflict(
                "Assignment questions changed, reload and submit again".to_string(),
            ));
        }
        tables.next_submission_id += 1;
        let submission = new.into_submission(tables.next_submission_id, Utc::now());
        tables.by_student_assignment.insert(key, submission.id);
        tables.submissions.insert(submission.id, submission.clone());
        Ok(submission)
    }

    async fn get_submission(&self, id: i64) -> Result<Option<Submission>, AppError> {
        Ok(self.tables.read().await.submissions.get(&id).cloned())
    }

    async fn list_submissions_for_assignment(
        &self,
        assignment_id: i64,
    ) -> Result<Vec<Submission>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .submissions
            .values()
            .filter(|s| s.assignment_id == assignment_id)
            .cloned()
            .collect())
    }

    async fn list_submissions_for_student(
        &self,
        student_id: i64,
    ) -> Result<Vec<Submission>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .submissions
            .values()
            .filter(|s| s.student_id == student_id)
            .cloned()
            .collect())
    }
}
