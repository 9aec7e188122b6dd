//! Transaction management for the finance tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `NewTransaction` for creating transactions
//! - Database functions for storing and querying transactions
//! - The balance aggregator and the balance-checked create flow
//! - Route handlers for the transaction endpoints

mod balance;
mod core;
mod create;
mod create_endpoint;
mod list_endpoint;

pub use balance::{Balance, get_balance};
pub use self::core::{
    NewTransaction, Transaction, TransactionType, count_transactions, create_transaction_table,
    get_all_transactions, insert_transaction, insert_transactions,
};
pub use create::{CreateTransactionRequest, create_transaction};
pub use create_endpoint::create_transaction_endpoint;
pub use list_endpoint::{TransactionsResponse, get_transactions_endpoint};
