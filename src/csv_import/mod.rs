//! Bulk import of transactions from CSV files.

mod import;
mod import_endpoint;
mod parse;

pub use import::{import_transactions_file, import_transactions_files};
pub use import_endpoint::import_transactions_endpoint;
pub use parse::{CsvTransaction, parse_transactions_csv};
