pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::dialogue::handlers as qa;
use crate::scheduling::handlers as scheduling;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Q&A
        .route("/qa/create-session", post(qa::handle_create_session))
        .route("/qa/ask", post(qa::handle_ask))
        // Scheduling
        .route(
            "/scheduling/get-availability",
            get(scheduling::handle_get_availability),
        )
        .route(
            "/scheduling/book-interview",
            post(scheduling::handle_book_interview),
        )
        .with_state(state)
}
