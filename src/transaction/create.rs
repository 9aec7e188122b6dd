//! Records a single transaction, refusing outcomes the balance cannot cover.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    category::{CategoryTitle, find_or_create_category},
    transaction::{Transaction, TransactionType, get_balance, insert_transaction},
};

/// The data needed to record a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    /// A short description of what the transaction was for.
    pub title: String,
    /// The amount of money earned or spent.
    pub value: Decimal,
    /// Whether the transaction is income or outcome.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The title of the category, created if no category has this title yet.
    pub category: String,
}

/// Record the transaction described by `request`.
///
/// The balance check, the category lookup and the insert all happen inside a
/// single `BEGIN IMMEDIATE` SQLite transaction, so no other writer can change
/// the balance between the check and the insert. Nothing is written if any
/// step fails.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyTransactionTitle] if the title is empty,
/// - [Error::EmptyCategoryTitle] if the category title is empty,
/// - [Error::InsufficientFunds] if an outcome is larger than the current balance,
/// - [Error::BalanceOverflow] if the balance would become too large to represent,
/// - or [Error::SqlError] if there is some SQL error.
pub fn create_transaction(
    request: CreateTransactionRequest,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(Error::EmptyTransactionTitle);
    }

    let category_title = CategoryTitle::new(&request.category)?;

    let tx = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let balance = get_balance(&tx)?;
    if request.transaction_type == TransactionType::Outcome && request.value > balance.total {
        tracing::debug!(
            "Rejected outcome of {} with a balance of {}",
            request.value,
            balance.total
        );
        return Err(Error::InsufficientFunds {
            balance: balance.total,
            value: request.value,
        });
    }
    balance.with_transaction(request.transaction_type, request.value)?;

    let category = find_or_create_category(category_title, &tx)?;
    let transaction = insert_transaction(
        Transaction::build(title, request.transaction_type, request.value, category.id),
        &tx,
    )?;

    tx.commit()?;

    tracing::info!(
        "Created {} transaction {} \"{}\" for {} in category \"{}\"",
        transaction.transaction_type,
        transaction.id,
        transaction.title,
        transaction.value,
        category.title
    );

    Ok(transaction)
}
