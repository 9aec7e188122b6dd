//! Categories for grouping transactions, e.g. 'Salary' or 'Housing'.

mod db;
mod domain;
mod list_endpoint;
mod reconcile;

pub use db::{
    create_categories, create_category, create_category_table, find_or_create_category,
    get_all_categories, get_categories_by_titles, get_category_by_title,
};
pub use domain::{Category, CategoryTitle};
pub use list_endpoint::get_categories_endpoint;
pub use reconcile::{CategoryPool, missing_titles, reconcile_categories};
