//! Computes the net balance over all stored transactions.

use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    transaction::{TransactionType, core::get_decimal},
};

/// The sums of all income and outcome transactions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// The sum of all income transactions.
    pub income: Decimal,
    /// The sum of all outcome transactions.
    pub outcome: Decimal,
    /// Income minus outcome.
    pub total: Decimal,
}

impl Balance {
    /// Fold `(type, value)` pairs into a balance.
    ///
    /// # Errors
    /// This function will return an [Error::BalanceOverflow] if any of the
    /// sums cannot be represented as a [Decimal].
    pub fn from_transactions<I>(transactions: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (TransactionType, Decimal)>,
    {
        transactions
            .into_iter()
            .try_fold(Self::default(), |balance, (transaction_type, value)| {
                balance.with_transaction(transaction_type, value)
            })
    }

    /// The balance after adding a transaction of `value` to it.
    ///
    /// # Errors
    /// This function will return an [Error::BalanceOverflow] if any of the
    /// sums cannot be represented as a [Decimal].
    pub fn with_transaction(
        self,
        transaction_type: TransactionType,
        value: Decimal,
    ) -> Result<Self, Error> {
        let (income, outcome) = match transaction_type {
            TransactionType::Income => (self.income.checked_add(value), Some(self.outcome)),
            TransactionType::Outcome => (Some(self.income), self.outcome.checked_add(value)),
        };

        let (Some(income), Some(outcome)) = (income, outcome) else {
            return Err(Error::BalanceOverflow);
        };
        let total = income.checked_sub(outcome).ok_or(Error::BalanceOverflow)?;

        Ok(Self {
            income,
            outcome,
            total,
        })
    }
}

/// Calculate the balance over every transaction in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::BalanceOverflow] if the stored values do not fit in a [Decimal] when summed,
/// - or [Error::SqlError] if there is some SQL error.
pub fn get_balance(connection: &Connection) -> Result<Balance, Error> {
    let mut stmt = connection.prepare("SELECT type, value FROM \"transaction\";")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, get_decimal(row, 1)?)))?
        .collect::<Result<Vec<(TransactionType, Decimal)>, rusqlite::Error>>()?;

    Balance::from_transactions(rows)
}
