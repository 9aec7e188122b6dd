//! Endpoint for listing transactions together with the balance.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    transaction::{Balance, Transaction, get_all_transactions, get_balance},
};

/// The state needed for listing transactions.
#[derive(Debug, Clone)]
pub struct TransactionsState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The body of the response for listing transactions.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionsResponse {
    /// Every stored transaction, oldest first.
    pub transactions: Vec<Transaction>,
    /// The balance over `transactions`.
    pub balance: Balance,
}

/// Route handler that returns every transaction and the balance.
pub async fn get_transactions_endpoint(State(state): State<TransactionsState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let transactions = match get_all_transactions(&connection) {
        Ok(transactions) => transactions,
        Err(error) => return error.into_response(),
    };

    match get_balance(&connection) {
        Ok(balance) => Json(TransactionsResponse {
            transactions,
            balance,
        })
        .into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod get_transactions_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{body, extract::State, http::StatusCode};
    use rusqlite::Connection;
    use rust_decimal::Decimal;

    use crate::{
        db::initialize,
        transaction::{
            Balance, CreateTransactionRequest, TransactionType, TransactionsResponse,
            create_transaction,
            list_endpoint::{TransactionsState, get_transactions_endpoint},
        },
    };

    #[tokio::test]
    async fn returns_transactions_and_balance() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let salary = create_transaction(
            CreateTransactionRequest {
                title: "Salary".to_owned(),
                value: Decimal::from(5000),
                transaction_type: TransactionType::Income,
                category: "Salary".to_owned(),
            },
            &connection,
        )
        .expect("Could not create test transaction");
        let rent = create_transaction(
            CreateTransactionRequest {
                title: "Rent".to_owned(),
                value: Decimal::from(1200),
                transaction_type: TransactionType::Outcome,
                category: "Housing".to_owned(),
            },
            &connection,
        )
        .expect("Could not create test transaction");
        let state = TransactionsState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_transactions_endpoint(State(state)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Could not read response body");
        let got: TransactionsResponse =
            serde_json::from_slice(&bytes).expect("Could not parse response");
        assert_eq!(
            got,
            TransactionsResponse {
                transactions: vec![salary, rent],
                balance: Balance {
                    income: Decimal::from(5000),
                    outcome: Decimal::from(1200),
                    total: Decimal::from(3800),
                },
            }
        );
    }
}
