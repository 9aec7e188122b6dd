//! Parses transactions from CSV files with the columns title, type, value and category.

use std::io::Read;

use rust_decimal::Decimal;

use crate::{Error, category::CategoryTitle, transaction::TransactionType};

const TITLE_COLUMN: usize = 0;
const TYPE_COLUMN: usize = 1;
const VALUE_COLUMN: usize = 2;
const CATEGORY_COLUMN: usize = 3;

/// A transaction read from one row of a CSV file.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvTransaction {
    /// A short description of what the transaction was for.
    pub title: String,
    /// Whether the transaction is income or outcome.
    pub transaction_type: TransactionType,
    /// The amount of money earned or spent.
    pub value: Decimal,
    /// The title of the category the transaction belongs to.
    pub category: CategoryTitle,
}

/// Parses the rows of a CSV document into transactions.
///
/// The first row is a header and is skipped. The columns must be in the
/// order title, type, value, category. Whitespace around each cell is
/// removed.
///
/// Rows that cannot become a transaction are skipped rather than failing the
/// whole document: a missing title, type, value or category, an unknown type
/// or a value that is not a decimal number.
///
/// Returns an [Error::InvalidCSV] if the document itself cannot be read as CSV.
pub fn parse_transactions_csv<R: Read>(reader: R) -> Result<Vec<CsvTransaction>, Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut transactions = Vec::new();

    for (row_number, record) in csv_reader.records().enumerate() {
        let record = record.map_err(|error| Error::InvalidCSV(error.to_string()))?;
        // Line 1 is the header.
        let line_number = row_number + 2;

        let cell = |column: usize| record.get(column).unwrap_or_default();
        let (title, raw_type, raw_value, raw_category) = (
            cell(TITLE_COLUMN),
            cell(TYPE_COLUMN),
            cell(VALUE_COLUMN),
            cell(CATEGORY_COLUMN),
        );

        if title.is_empty() || raw_type.is_empty() || raw_value.is_empty() {
            tracing::debug!("Skipping line {line_number}: missing title, type or value");
            continue;
        }

        let transaction_type = match raw_type.parse::<TransactionType>() {
            Ok(transaction_type) => transaction_type,
            Err(error) => {
                tracing::debug!("Skipping line {line_number}: {error}");
                continue;
            }
        };

        let value = match raw_value.parse::<Decimal>() {
            Ok(value) => value,
            Err(error) => {
                tracing::debug!(
                    "Skipping line {line_number}: could not parse '{raw_value}' as a decimal: {error}"
                );
                continue;
            }
        };

        let category = match CategoryTitle::new(raw_category) {
            Ok(category) => category,
            Err(error) => {
                tracing::debug!("Skipping line {line_number}: {error}");
                continue;
            }
        };

        transactions.push(CsvTransaction {
            title: title.to_owned(),
            transaction_type,
            value,
            category,
        });
    }

    Ok(transactions)
}
