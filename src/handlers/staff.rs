// src/handlers/staff.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::assignment::{
        CreateAssignmentRequest, NewAssignment, ReplaceQuestionsRequest, SetActiveRequest,
        build_questions,
    },
    services::AssessmentService,
    utils::jwt::Claims,
};

/// Creates an assignment with its questions.
/// Staff only.
pub async fn create_assignment(
    State(service): State<AssessmentService>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateAssignmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let new = NewAssignment {
        title: payload.title,
        description: payload.description.unwrap_or_default(),
        time_limit_minutes: payload.time_limit_minutes,
        questions: build_questions(payload.questions)?,
        is_active: payload.is_active.unwrap_or(true),
        created_by: claims.user_id()?,
    };

    let assignment = service.create_assignment(new).await?;

    Ok((StatusCode::CREATED, Json(assignment)))
}

/// Replaces the question sequence.
/// Staff only. 409 once any student has submitted.
pub async fn replace_questions(
    State(service): State<AssessmentService>,
    Path(assignment_id): Path<i64>,
    Json(payload): Json<ReplaceQuestionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let questions = build_questions(payload.questions)?;
    let assignment = service.replace_questions(assignment_id, questions).await?;

    Ok(Json(assignment))
}

/// Opens or closes an assignment to new attempts.
/// Staff only.
pub async fn set_active(
    State(service): State<AssessmentService>,
    Path(assignment_id): Path<i64>,
    Json(payload): Json<SetActiveRequest>,
) -> Result<impl IntoResponse, AppError> {
    let assignment = service
        .set_assignment_active(assignment_id, payload.is_active)
        .await?;

    Ok(Json(assignment.summary()))
}
