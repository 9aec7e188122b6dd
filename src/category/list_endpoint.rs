//! Endpoint for listing categories.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{AppState, Error, category::get_all_categories};

/// The state needed for listing categories.
#[derive(Debug, Clone)]
pub struct CategoriesState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoriesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Route handler that returns all categories as JSON.
pub async fn get_categories_endpoint(State(state): State<CategoriesState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_all_categories(&connection) {
        Ok(categories) => Json(categories).into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod get_categories_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{body, extract::State, http::StatusCode};
    use rusqlite::Connection;

    use crate::category::{
        Category, CategoryTitle, create_category, create_category_table,
        list_endpoint::{CategoriesState, get_categories_endpoint},
    };

    #[tokio::test]
    async fn returns_categories_as_json() {
        let connection = Connection::open_in_memory().unwrap();
        create_category_table(&connection).expect("Could not create category table");
        let want = vec![
            create_category(CategoryTitle::new_unchecked("Housing"), &connection)
                .expect("Could not create test category"),
        ];
        let state = CategoriesState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_categories_endpoint(State(state)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Could not read response body");
        let got: Vec<Category> = serde_json::from_slice(&bytes).expect("Could not parse JSON");
        assert_eq!(got, want);
    }
}
