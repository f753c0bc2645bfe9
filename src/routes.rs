// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{assignments, results, staff},
    state::AppState,
    utils::jwt::{auth_middleware, staff_middleware},
};

/// Assembles the main application router.
///
/// * Every route requires a bearer token.
/// * Authoring routes additionally require the staff role.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let assignment_routes = Router::new()
        .route("/", get(assignments::list_assignments))
        .route("/{id}/questions", get(assignments::get_assignment_questions))
        .route(
            "/{id}/submissions",
            post(assignments::submit_assignment).get(assignments::list_submissions),
        )
        .route("/{id}/statistics", get(assignments::get_statistics));

    let result_routes = Router::new()
        .route("/submissions/{id}/review", get(results::get_review))
        .route("/students/{id}/results", get(results::get_student_results));

    let staff_routes = Router::new()
        .route("/assignments", post(staff::create_assignment))
        .route("/assignments/{id}/questions", put(staff::replace_questions))
        .route("/assignments/{id}/active", put(staff::set_active))
        // Auth first, then the staff check
        .layer(middleware::from_fn(staff_middleware));

    let api = Router::new()
        .nest("/assignments", assignment_routes)
        .nest("/staff", staff_routes)
        .merge(result_routes)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api", api)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
