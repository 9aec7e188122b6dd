//! Application router configuration.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;

use crate::{
    AppState,
    category::get_categories_endpoint,
    csv_import::import_transactions_endpoint,
    endpoints,
    logging::logging_middleware,
    transaction::{create_transaction_endpoint, get_transactions_endpoint},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(endpoints::IMPORT, post(import_transactions_endpoint))
        .route(endpoints::CATEGORIES, get(get_categories_endpoint))
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "status": "error", "message": "Not found" })),
    )
        .into_response()
}
