//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::{CategoryId, TransactionId},
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether a transaction brought money in or sent money out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money that was earned, e.g. a salary payment.
    Income,
    /// Money that was spent, e.g. rent.
    Outcome,
}

impl TransactionType {
    /// The string used for this type in the database, JSON and CSV files.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Outcome => "outcome",
        }
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "outcome" => Ok(TransactionType::Outcome),
            _ => Err(Error::InvalidTransactionType(s.to_owned())),
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// A single recorded income or outcome event.
///
/// To create a new `Transaction`, use [Transaction::build] and [insert_transaction].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// A short description of what the transaction was for.
    pub title: String,
    /// Whether the transaction is income or outcome.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The amount of money earned or spent, non-negative by convention.
    pub value: Decimal,
    /// The ID of the category the transaction belongs to.
    pub category_id: CategoryId,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the transaction was last updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [NewTransaction] for discoverability.
    pub fn build(
        title: &str,
        transaction_type: TransactionType,
        value: Decimal,
        category_id: CategoryId,
    ) -> NewTransaction {
        NewTransaction {
            title: title.to_owned(),
            transaction_type,
            value,
            category_id,
        }
    }
}

/// A transaction that has not been stored in the database yet.
#[derive(Debug, PartialEq, Clone)]
pub struct NewTransaction {
    /// A short description of what the transaction was for.
    ///
    /// # Examples
    /// - `"Salary"`
    /// - `"Rent - March"`
    pub title: String,

    /// Whether the transaction is income or outcome.
    pub transaction_type: TransactionType,

    /// The amount of money earned or spent.
    ///
    /// Unlike bank statements, the sign does not encode the direction of the
    /// transaction, `transaction_type` does.
    pub value: Decimal,

    /// The category of the transaction, e.g. "Salary", "Housing".
    pub category_id: CategoryId,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const INSERT_TRANSACTION_QUERY: &str = "INSERT INTO \"transaction\"
     (title, type, value, category_id, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?5)
     RETURNING id, title, type, value, category_id, created_at, updated_at";

/// Store a new transaction in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCategory] if the category ID does not refer to a real category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn insert_transaction(
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let mut stmt = connection.prepare(INSERT_TRANSACTION_QUERY)?;

    insert_with_statement(&mut stmt, new_transaction, OffsetDateTime::now_utc())
}

/// Store many transactions in the database, reusing a single prepared statement.
///
/// **Note**: If you want transactional integrity (all or nothing), pass in a
/// transaction for `connection`.
///
/// # Errors
/// Stops at the first transaction that fails to insert and returns the same
/// errors as [insert_transaction].
pub fn insert_transactions(
    new_transactions: Vec<NewTransaction>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let now = OffsetDateTime::now_utc();
    let mut stmt = connection.prepare(INSERT_TRANSACTION_QUERY)?;

    new_transactions
        .into_iter()
        .map(|new_transaction| insert_with_statement(&mut stmt, new_transaction, now))
        .collect()
}

fn insert_with_statement(
    stmt: &mut rusqlite::Statement<'_>,
    new_transaction: NewTransaction,
    now: OffsetDateTime,
) -> Result<Transaction, Error> {
    let category_id = new_transaction.category_id;

    stmt.query_row(
        (
            new_transaction.title,
            new_transaction.transaction_type,
            new_transaction.value.to_string(),
            category_id,
            now,
        ),
        map_transaction_row,
    )
    .map_err(|error| match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
            },
            _,
        ) => Error::InvalidCategory(category_id),
        error => error.into(),
    })
}

/// Retrieve every transaction in the database, oldest first.
pub fn get_all_transactions(connection: &Connection) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, title, type, value, category_id, created_at, updated_at
             FROM \"transaction\" ORDER BY id ASC",
        )?
        .query_map([], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// Values are stored as text so that no decimal precision is lost.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('income', 'outcome')),
                value TEXT NOT NULL,
                category_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(category_id) REFERENCES category(id)
                    ON UPDATE CASCADE ON DELETE RESTRICT
                );

        CREATE INDEX IF NOT EXISTS idx_transaction_category ON \"transaction\"(category_id);",
    )?;

    Ok(())
}

/// Read a decimal stored as text from the column at `index`.
pub(crate) fn get_decimal(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let raw_value: String = row.get(index)?;

    raw_value.parse().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
    })
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let title = row.get(1)?;
    let transaction_type = row.get(2)?;
    let value = get_decimal(row, 3)?;
    let category_id = row.get(4)?;
    let created_at = row.get(5)?;
    let updated_at = row.get(6)?;

    Ok(Transaction {
        id,
        title,
        transaction_type,
        value,
        category_id,
        created_at,
        updated_at,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod transaction_type_tests {
    use crate::{Error, transaction::TransactionType};

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("income".parse(), Ok(TransactionType::Income));
        assert_eq!(" Outcome ".parse(), Ok(TransactionType::Outcome));
        assert_eq!("INCOME".parse(), Ok(TransactionType::Income));
    }

    #[test]
    fn rejects_unknown_type() {
        let got = "expense".parse::<TransactionType>();

        assert_eq!(got, Err(Error::InvalidTransactionType("expense".to_owned())));
    }

    #[test]
    fn serializes_as_lowercase() {
        let json = serde_json::to_string(&TransactionType::Outcome).unwrap();

        assert_eq!(json, "\"outcome\"");
    }
}

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;

    use crate::{
        Error,
        category::{CategoryTitle, create_category},
        db::initialize,
        transaction::{
            Transaction, TransactionType, count_transactions, get_all_transactions,
            insert_transaction, insert_transactions,
        },
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn create_test_category(conn: &Connection) -> i64 {
        create_category(CategoryTitle::new_unchecked("Food"), conn)
            .expect("Could not create test category")
            .id
    }

    #[test]
    fn insert_succeeds() {
        let conn = get_test_connection();
        let category_id = create_test_category(&conn);
        let value = Decimal::new(1999, 2);

        let result = insert_transaction(
            Transaction::build("Pizza", TransactionType::Outcome, value, category_id),
            &conn,
        );

        match result {
            Ok(transaction) => {
                assert_eq!(transaction.title, "Pizza");
                assert_eq!(transaction.transaction_type, TransactionType::Outcome);
                assert_eq!(transaction.value, value);
                assert_eq!(transaction.category_id, category_id);
            }
            Err(error) => panic!("Unexpected error: {error}"),
        }
    }

    #[test]
    fn insert_keeps_decimal_precision() {
        let conn = get_test_connection();
        let category_id = create_test_category(&conn);
        let value: Decimal = "0.1".parse().unwrap();
        let other_value: Decimal = "0.2".parse().unwrap();

        insert_transactions(
            vec![
                Transaction::build("A", TransactionType::Income, value, category_id),
                Transaction::build("B", TransactionType::Income, other_value, category_id),
            ],
            &conn,
        )
        .expect("Could not insert transactions");

        let stored = get_all_transactions(&conn).expect("Could not get transactions");
        let sum: Decimal = stored.iter().map(|transaction| transaction.value).sum();
        assert_eq!(sum, "0.3".parse::<Decimal>().unwrap());
    }

    #[test]
    fn insert_fails_on_invalid_category_id() {
        let conn = get_test_connection();

        let result = insert_transaction(
            Transaction::build("Pizza", TransactionType::Outcome, Decimal::ONE, 42),
            &conn,
        );

        assert_eq!(result, Err(Error::InvalidCategory(42)));
    }

    #[test]
    fn insert_many_returns_in_order() {
        let conn = get_test_connection();
        let category_id = create_test_category(&conn);
        let titles = ["First", "Second", "Third"];

        let inserted = insert_transactions(
            titles
                .iter()
                .map(|title| {
                    Transaction::build(title, TransactionType::Income, Decimal::TEN, category_id)
                })
                .collect(),
            &conn,
        )
        .expect("Could not insert transactions");

        let got_titles = inserted
            .iter()
            .map(|transaction| transaction.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(got_titles, titles);
        assert_eq!(get_all_transactions(&conn), Ok(inserted));
    }

    #[test]
    fn get_count() {
        let conn = get_test_connection();
        let category_id = create_test_category(&conn);
        let want_count = 20;
        for i in 1..=want_count {
            insert_transaction(
                Transaction::build("", TransactionType::Income, Decimal::from(i), category_id),
                &conn,
            )
            .expect("Could not create transaction");
        }

        let got_count = count_transactions(&conn).expect("Could not get count");

        assert_eq!(want_count, got_count);
    }
}
