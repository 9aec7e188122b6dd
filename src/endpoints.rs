//! The API endpoint URIs.

/// The route for listing and creating transactions.
pub const TRANSACTIONS: &str = "/transactions";
/// The route to upload CSV files for importing transactions.
pub const IMPORT: &str = "/transactions/import";
/// The route for listing categories.
pub const CATEGORIES: &str = "/categories";
