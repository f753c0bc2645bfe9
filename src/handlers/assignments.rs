// src/handlers/assignments.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::submission::SubmitAssignmentRequest,
    services::AssessmentService,
    utils::jwt::{Claims, Role},
};

/// Lists active assignments without their questions.
pub async fn list_assignments(
    State(service): State<AssessmentService>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(service.list_assignments().await?))
}

/// Returns the paper for a timed attempt.
///
/// The answer key is stripped; unknown or inactive assignments are 404.
pub async fn get_assignment_questions(
    State(service): State<AssessmentService>,
    Path(assignment_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(service.get_assignment_paper(assignment_id).await?))
}

/// Records the calling student's one submission for an assignment.
///
/// * 400 when the answer count or a label is wrong.
/// * 409 with code `already_submitted` when a submission already exists.
pub async fn submit_assignment(
    State(service): State<AssessmentService>,
    Extension(claims): Extension<Claims>,
    Path(assignment_id): Path<i64>,
    Json(req): Json<SubmitAssignmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if claims.role != Role::Student {
        return Err(AppError::Forbidden(
            "Only students can submit assignments".to_string(),
        ));
    }
    let student_id = claims.user_id()?;
    let command = req.into_command(assignment_id, student_id)?;

    let submission = service.submit_assignment(command).await?;

    Ok((StatusCode::CREATED, Json(submission)))
}

/// Lists every submission for an assignment. Staff only.
pub async fn list_submissions(
    State(service): State<AssessmentService>,
    Extension(claims): Extension<Claims>,
    Path(assignment_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !claims.is_staff() {
        return Err(AppError::Forbidden(
            "Only staff can list all submissions".to_string(),
        ));
    }
    Ok(Json(service.get_submissions_for_assignment(assignment_id).await?))
}

/// Cohort statistics, recomputed from the current submissions.
pub async fn get_statistics(
    State(service): State<AssessmentService>,
    Path(assignment_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(service.get_assignment_statistics(assignment_id).await?))
}
