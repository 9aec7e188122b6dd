//! Cashbook is a backend for tracking personal income and spending.
//!
//! This library provides a JSON API for recording transactions, reporting the
//! running balance and bulk-importing transactions from CSV files.

#![warn(missing_docs)]

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::signal;

mod app_state;
mod category;
mod csv_import;
mod database_id;
mod db;
mod endpoints;
mod logging;
mod routing;
mod transaction;

pub use app_state::AppState;
pub use category::{
    Category, CategoryPool, CategoryTitle, create_category, find_or_create_category,
    get_all_categories, get_categories_by_titles, get_category_by_title, missing_titles,
    reconcile_categories,
};
pub use csv_import::{
    CsvTransaction, import_transactions_file, import_transactions_files, parse_transactions_csv,
};
pub use database_id::{CategoryId, DatabaseId, TransactionId};
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use routing::build_router;
pub use transaction::{
    Balance, CreateTransactionRequest, NewTransaction, Transaction, TransactionType,
    TransactionsResponse, count_transactions, create_transaction, get_all_transactions,
    get_balance, insert_transaction, insert_transactions,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An outcome transaction was requested for more money than the current
    /// balance holds.
    #[error("insufficient funds: the balance is {balance} but the outcome is {value}")]
    InsufficientFunds {
        /// The net balance at the time of the request.
        balance: Decimal,
        /// The value of the rejected outcome.
        value: Decimal,
    },

    /// The sum of the stored transactions, or of the stored transactions and
    /// a new one, is too large to be represented.
    #[error("the balance is too large to be calculated")]
    BalanceOverflow,

    /// An empty string was used as a transaction title.
    #[error("Transaction title cannot be empty")]
    EmptyTransactionTitle,

    /// An empty string was used as a category title.
    #[error("Category title cannot be empty")]
    EmptyCategoryTitle,

    /// A string other than "income" or "outcome" was used as a transaction type.
    #[error("\"{0}\" is not a valid transaction type, expected \"income\" or \"outcome\"")]
    InvalidTransactionType(String),

    /// The category ID used to create a transaction did not match a valid category.
    #[error("the category ID {0} does not refer to a valid category")]
    InvalidCategory(CategoryId),

    /// An imported row referenced a category that is neither in the database
    /// nor was created during the import.
    #[error("could not resolve the category \"{0}\"")]
    UnresolvedCategory(String),

    /// The CSV had issues that prevented it from being parsed.
    #[error("Could not parse the CSV file: {0}")]
    InvalidCSV(String),

    /// The multipart form did not contain a CSV file.
    #[error("File is not a CSV")]
    NotCSV,

    /// The multipart form could not be parsed as a list of CSV files.
    #[error("Could not parse multipart form: {0}")]
    MultipartError(String),

    /// A file could not be read, written or deleted.
    ///
    /// Callers should pass in the path of the file and the original error as a string.
    #[error("could not access the file {0:?}: {1}")]
    FileError(PathBuf, String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// The JSON body sent to the client when a request fails.
#[derive(Debug, Serialize)]
struct ErrorBody {
    status: &'static str,
    message: String,
}

impl ErrorBody {
    fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = match self {
            Error::InsufficientFunds { .. }
            | Error::BalanceOverflow
            | Error::EmptyTransactionTitle
            | Error::EmptyCategoryTitle
            | Error::InvalidTransactionType(_)
            | Error::InvalidCategory(_)
            | Error::InvalidCSV(_)
            | Error::NotCSV
            | Error::MultipartError(_) => StatusCode::BAD_REQUEST,
            Error::NotFound => StatusCode::NOT_FOUND,
            // Any errors that are not handled above are not intended to be shown to the client.
            _ => {
                tracing::error!("An unexpected error occurred: {}", self);

                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody::new(
                        "An unexpected error occurred, check the server logs for more details.",
                    )),
                )
                    .into_response();
            }
        };

        (status_code, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod error_response_tests {
    use std::path::PathBuf;

    use axum::{body, http::StatusCode, response::IntoResponse};
    use rust_decimal::Decimal;
    use serde_json::Value;

    use crate::Error;

    async fn into_json(error: Error) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Could not read response body");
        let json = serde_json::from_slice(&bytes).expect("Response body is not JSON");

        (status, json)
    }

    #[tokio::test]
    async fn insufficient_funds_is_bad_request() {
        let (status, json) = into_json(Error::InsufficientFunds {
            balance: Decimal::new(100, 0),
            value: Decimal::new(250, 0),
        })
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["status"], "error");
        assert_eq!(
            json["message"],
            "insufficient funds: the balance is 100 but the outcome is 250"
        );
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let (status, _) = into_json(Error::NotFound).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let (status, json) = into_json(Error::FileError(
            PathBuf::from("/secret/upload.csv"),
            "permission denied".to_owned(),
        ))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let message = json["message"].as_str().expect("message is not a string");
        assert!(
            !message.contains("/secret"),
            "internal error message leaked a path: {message}"
        );
    }
}
