// src/handlers/results.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{error::AppError, services::AssessmentService, utils::jwt::Claims};

/// Per-question review of one submission, shaped for the caller's role.
pub async fn get_review(
    State(service): State<AssessmentService>,
    Extension(claims): Extension<Claims>,
    Path(submission_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let audience = claims.audience()?;
    Ok(Json(service.get_review(submission_id, audience).await?))
}

/// All submissions of one student. Students may only read their own.
pub async fn get_student_results(
    State(service): State<AssessmentService>,
    Extension(claims): Extension<Claims>,
    Path(student_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !claims.is_staff() && claims.user_id()? != student_id {
        return Err(AppError::Forbidden(
            "You can only view your own results".to_string(),
        ));
    }
    Ok(Json(service.get_student_results(student_id).await?))
}
