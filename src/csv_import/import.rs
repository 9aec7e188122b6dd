//! Imports the transactions in CSV files into the database.

use std::{
    fs::{self, File},
    io::BufReader,
    path::Path,
};

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error,
    category::reconcile_categories,
    csv_import::{CsvTransaction, parse_transactions_csv},
    transaction::{NewTransaction, Transaction, get_balance, insert_transactions},
};

/// Import every valid row of the CSV file at `path` and then delete the file.
///
/// Categories referenced by the file that do not exist yet are created, once
/// per distinct title. Categories and transactions are written in a single
/// SQLite transaction, so a failed import leaves the database untouched.
/// The file is deleted after the import was committed, even if it did not
/// contain any valid rows. No balance check is done for imported outcomes.
///
/// # Errors
/// This function will return a:
/// - [Error::FileError] if the file cannot be opened, or deleted after the import,
/// - [Error::InvalidCSV] if the file is not valid CSV,
/// - [Error::UnresolvedCategory] if a row's category could not be found or created,
/// - [Error::BalanceOverflow] if the imported values make the balance too large,
/// - or [Error::SqlError] if there is some SQL error.
///
/// If deleting the file fails, the transactions have already been imported.
pub fn import_transactions_file(
    path: &Path,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    import_transactions_files(&[path], connection)
}

/// Import every valid row of the CSV files at `paths` and then delete the files.
///
/// All files are parsed before anything is written, and the rows of every
/// file are imported in a single SQLite transaction: either all files are
/// imported or none are. The returned transactions are in file order.
///
/// # Errors
/// Returns the same errors as [import_transactions_file]. On error no file
/// is deleted.
pub fn import_transactions_files<P>(
    paths: &[P],
    connection: &Connection,
) -> Result<Vec<Transaction>, Error>
where
    P: AsRef<Path>,
{
    let start_time = std::time::Instant::now();

    let mut rows = Vec::new();
    for path in paths {
        rows.extend(read_transactions_csv(path.as_ref())?);
    }

    let tx = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;
    let (imported_transactions, created_categories) = import_rows(rows, &tx)?;
    tx.commit()?;

    for path in paths {
        let path = path.as_ref();
        fs::remove_file(path).map_err(|error| {
            tracing::error!(
                "Imported {} transactions but could not delete {}: {error}",
                imported_transactions.len(),
                path.display()
            );
            Error::FileError(path.to_owned(), error.to_string())
        })?;
    }

    tracing::info!(
        "Imported {} transactions and created {} categories from {} files in {:.1}ms",
        imported_transactions.len(),
        created_categories,
        paths.len(),
        start_time.elapsed().as_secs_f64() * 1000.0
    );

    Ok(imported_transactions)
}

fn read_transactions_csv(path: &Path) -> Result<Vec<CsvTransaction>, Error> {
    let file = File::open(path)
        .map_err(|error| Error::FileError(path.to_owned(), error.to_string()))?;

    parse_transactions_csv(BufReader::new(file))
}

/// Reconcile the categories of `rows` and insert them as transactions.
///
/// Returns the inserted transactions and the number of categories created.
/// The caller is responsible for committing `tx`.
fn import_rows(
    rows: Vec<CsvTransaction>,
    tx: &SqlTransaction,
) -> Result<(Vec<Transaction>, usize), Error> {
    let referenced_categories = rows
        .iter()
        .map(|row| row.category.clone())
        .collect::<Vec<_>>();

    let category_pool = reconcile_categories(&referenced_categories, tx)?;

    // Imports skip the funds check, but the stored values must still sum.
    rows.iter().try_fold(get_balance(tx)?, |balance, row| {
        balance.with_transaction(row.transaction_type, row.value)
    })?;

    let new_transactions = rows
        .into_iter()
        .map(|row| -> Result<NewTransaction, Error> {
            let category = category_pool
                .resolve(&row.category)
                .ok_or_else(|| Error::UnresolvedCategory(row.category.to_string()))?;

            Ok(NewTransaction {
                title: row.title,
                transaction_type: row.transaction_type,
                value: row.value,
                category_id: category.id,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let imported_transactions = insert_transactions(new_transactions, tx)?;

    Ok((imported_transactions, category_pool.created_count))
}
