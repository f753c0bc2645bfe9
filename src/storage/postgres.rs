// src/storage/postgres.rs

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, postgres::PgPoolOptions, types::Json};

use super::Storage;
use crate::{
    error::AppError,
    models::{
        assignment::{Assignment, Label, NewAssignment, Question},
        submission::{NewSubmission, QuestionResult, Submission},
    },
};

const ASSIGNMENT_COLUMNS: &str = "id, title, description, time_limit_minutes, questions, \
    questions_version, is_active, created_by, created_at";

const SUBMISSION_COLUMNS: &str = "id, student_id, assignment_id, answers, results, \
    correct_answers, total_questions, score, max_score, percentage, letter_grade, \
    time_spent_seconds, submitted_at";

/// Row shape of the `assignments` table. Questions are embedded as JSONB.
#[derive(FromRow)]
struct AssignmentRow {
    id: i64,
    title: String,
    description: String,
    time_limit_minutes: i32,
    questions: Json<Vec<Question>>,
    questions_version: i64,
    is_active: bool,
    created_by: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<AssignmentRow> for Assignment {
    type Error = AppError;

    fn try_from(row: AssignmentRow) -> Result<Self, Self::Error> {
        Ok(Assignment {
            id: row.id,
            title: row.title,
            description: row.description,
            time_limit_minutes: to_unsigned(row.time_limit_minutes, "time_limit_minutes")?,
            questions: row.questions.0,
            questions_version: row.questions_version,
            is_active: row.is_active,
            created_by: row.created_by,
            created_at: row.created_at,
        })
    }
}

/// Row shape of the `submissions` table.
#[derive(FromRow)]
struct SubmissionRow {
    id: i64,
    student_id: i64,
    assignment_id: i64,
    answers: Json<Vec<Option<Label>>>,
    results: Json<Vec<QuestionResult>>,
    correct_answers: i32,
    total_questions: i32,
    score: i32,
    max_score: i32,
    percentage: i16,
    letter_grade: String,
    time_spent_seconds: i32,
    submitted_at: DateTime<Utc>,
}

impl TryFrom<SubmissionRow> for Submission {
    type Error = AppError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        Ok(Submission {
            id: row.id,
            student_id: row.student_id,
            assignment_id: row.assignment_id,
            answers: row.answers.0,
            results: row.results.0,
            correct_answers: to_unsigned(row.correct_answers, "correct_answers")?,
            total_questions: to_unsigned(row.total_questions, "total_questions")?,
            score: to_unsigned(row.score, "score")?,
            max_score: to_unsigned(row.max_score, "max_score")?,
            percentage: u8::try_from(row.percentage).map_err(|_| {
                AppError::InternalServerError(format!("Stored percentage {} is out of range", row.percentage))
            })?,
            letter_grade: row.letter_grade.parse()?,
            time_spent_seconds: to_unsigned(row.time_spent_seconds, "time_spent_seconds")?,
            submitted_at: row.submitted_at,
        })
    }
}

fn to_unsigned(value: i32, column: &str) -> Result<u32, AppError> {
    u32::try_from(value)
        .map_err(|_| AppError::InternalServerError(format!("Column {} holds negative value {}", column, value)))
}

fn to_signed(value: u32, field: &str) -> Result<i32, AppError> {
    i32::try_from(value).map_err(|_| AppError::Validation(format!("{} is too large", field)))
}

/// Postgres backend. The schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects with retry and applies pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let mut retry_count = 0;
        let pool = loop {
            match PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(3))
                .connect(database_url)
                .await
            {
                Ok(pool) => break pool,
                Err(e) => {
                    retry_count += 1;
                    if retry_count > 5 {
                        return Err(AppError::TransientIo(format!(
                            "Failed to connect to database after 5 retries: {}",
                            e
                        )));
                    }
                    tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        };
        tracing::info!("Database connected...");

        tracing::info!("Running migrations...");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::InternalServerError(format!("Failed to run migrations: {}", e)))?;
        tracing::info!("Migrations applied successfully.");

        Ok(Self::new(pool))
    }

    async fn fetch_assignment(&self, id: i64) -> Result<Option<Assignment>, AppError> {
        let row: Option<AssignmentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM assignments WHERE id = $1",
            ASSIGNMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Assignment::try_from).transpose()
    }

    async fn fetch_submissions(&self, filter_column: &str, value: i64) -> Result<Vec<Submission>, AppError> {
        let rows: Vec<SubmissionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM submissions WHERE {} = $1 ORDER BY id",
            SUBMISSION_COLUMNS, filter_column
        ))
        .bind(value)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list submissions by {}: {:?}", filter_column, e);
            AppError::from(e)
        })?;

        rows.into_iter().map(Submission::try_from).collect()
    }
}

#[async_trait::async_trait]
impl Storage for PgStorage {
    async fn get_assignment(&self, id: i64) -> Result<Option<Assignment>, AppError> {
        self.fetch_assignment(id).await
    }

    async fn list_assignments(&self, only_active: bool) -> Result<Vec<Assignment>, AppError> {
        let rows: Vec<AssignmentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM assignments WHERE ($1 = FALSE OR is_active) ORDER BY id",
            ASSIGNMENT_COLUMNS
        ))
        .bind(only_active)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Assignment::try_from).collect()
    }

    async fn create_assignment(&self, new: NewAssignment) -> Result<Assignment, AppError> {
        let row: AssignmentRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO assignments (title, description, time_limit_minutes, questions, is_active, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            ASSIGNMENT_COLUMNS
        ))
        .bind(&new.title)
        .bind(&new.description)
        .bind(to_signed(new.time_limit_minutes, "time_limit_minutes")?)
        .bind(Json(&new.questions))
        .bind(new.is_active)
        .bind(new.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create assignment: {:?}", e);
            AppError::from(e)
        })?;

        row.try_into()
    }

    async fn replace_questions(
        &self,
        assignment_id: i64,
        questions: Vec<Question>,
    ) -> Result<Assignment, AppError> {
        let mut tx = self.pool.begin().await?;

        // FOR UPDATE waits out any insert holding FOR SHARE, so the
        // existence check below sees its submission once it commits.
        let locked: Option<i64> =
            sqlx::query_scalar("SELECT id FROM assignments WHERE id = $1 FOR UPDATE")
                .bind(assignment_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(AppError::NotFound("Assignment not found".to_string()));
        }

        let submitted: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM submissions WHERE assignment_id = $1)",
        )
        .bind(assignment_id)
        .fetch_one(&mut *tx)
        .await?;
        if submitted {
            return Err(AppError::Conflict(
                "Questions cannot change once submissions exist".to_string(),
            ));
        }

        let row: AssignmentRow = sqlx::query_as(&format!(
            r#"
            UPDATE assignments
            SET questions = $2, questions_version = questions_version + 1
            WHERE id = $1
            RETURNING {}
            "#,
            ASSIGNMENT_COLUMNS
        ))
        .bind(assignment_id)
        .bind(Json(&questions))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        row.try_into()
    }

    async fn set_assignment_active(
        &self,
        assignment_id: i64,
        is_active: bool,
    ) -> Result<Assignment, AppError> {
        let row: Option<AssignmentRow> = sqlx::query_as(&format!(
            "UPDATE assignments SET is_active = $2 WHERE id = $1 RETURNING {}",
            ASSIGNMENT_COLUMNS
        ))
        .bind(assignment_id)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(AppError::NotFound("Assignment not found".to_string()))?
            .try_into()
    }

    async fn insert_submission(&self, new: NewSubmission) -> Result<Submission, AppError> {
        let mut tx = self.pool.begin().await?;

        // FOR SHARE holds off question replacement until this insert commits.
        let current: Option<i64> = sqlx::query_scalar(
            "SELECT questions_version FROM assignments WHERE id = $1 FOR SHARE",
        )
        .bind(new.assignment_id)
        .fetch_optional(&mut *tx)
        .await?;
        match current {
            None => return Err(AppError::NotFound("Assignment not found".to_string())),
            Some(version) if version != new.questions_version => {
                return Err(AppError::Conflict(
                    "Assignment questions changed, reload and submit again".to_string(),
                ));
            }
            Some(_) => {}
        }

        // UNIQUE (student_id, assignment_id) turns a duplicate into a unique
        // violation, which `From<sqlx::Error>` maps to AlreadySubmitted.
        let row: SubmissionRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO submissions (
                student_id, assignment_id, answers, results, correct_answers, total_questions,
                score, max_score, percentage, letter_grade, time_spent_seconds
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            SUBMISSION_COLUMNS
        ))
        .bind(new.student_id)
        .bind(new.assignment_id)
        .bind(Json(&new.answers))
        .bind(Json(&new.results))
        .bind(to_signed(new.correct_answers, "correct_answers")?)
        .bind(to_signed(new.total_questions, "total_questions")?)
        .bind(to_signed(new.score, "score")?)
        .bind(to_signed(new.max_score, "max_score")?)
        .bind(i16::from(new.percentage))
        .bind(new.letter_grade.as_str())
        .bind(to_signed(new.time_spent_seconds, "time_spent_seconds")?)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            let err = AppError::from(e);
            if !matches!(err, AppError::AlreadySubmitted(_)) {
                tracing::error!("Failed to insert submission: {}", err);
            }
            err
        })?;

        tx.commit().await?;

        row.try_into()
    }

    async fn get_submission(&self, id: i64) -> Result<Option<Submission>, AppError> {
        let row: Option<SubmissionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM submissions WHERE id = $1",
            SUBMISSION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Submission::try_from).transpose()
    }

    async fn list_submissions_for_assignment(
        &self,
        assignment_id: i64,
    ) -> Result<Vec<Submission>, AppError> {
        self.fetch_submissions("assignment_id", assignment_id).await
    }

    async fn list_submissions_for_student(
        &self,
        student_id: i64,
    ) -> Result<Vec<Submission>, AppError> {
        self.fetch_submissions("student_id", student_id).await
    }
}
