//! Database operations for categories.

use std::collections::HashSet;

use rusqlite::{Connection, OptionalExtension, Row, params_from_iter};
use time::OffsetDateTime;

use crate::{
    Error,
    category::{Category, CategoryTitle},
};

/// The maximum number of titles bound to a single `IN (...)` query.
const MAX_TITLES_PER_QUERY: usize = 500;

/// Create a category and return it with its generated ID.
///
/// # Errors
/// Returns an [Error::SqlError] if a category with the same title already
/// exists or there is some other SQL error.
pub fn create_category(title: CategoryTitle, connection: &Connection) -> Result<Category, Error> {
    let now = OffsetDateTime::now_utc();

    connection
        .prepare(
            "INSERT INTO category (title, created_at, updated_at) VALUES (?1, ?2, ?2)
             RETURNING id, title, created_at, updated_at",
        )?
        .query_row((title.as_ref(), now), map_row)
        .map_err(Error::from)
}

/// Create one category per title in `titles`, in order.
///
/// The caller is responsible for making sure none of the titles exist yet.
pub fn create_categories(
    titles: &[CategoryTitle],
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    let now = OffsetDateTime::now_utc();
    let mut stmt = connection.prepare(
        "INSERT INTO category (title, created_at, updated_at) VALUES (?1, ?2, ?2)
         RETURNING id, title, created_at, updated_at",
    )?;

    titles
        .iter()
        .map(|title| {
            stmt.query_row((title.as_ref(), now), map_row)
                .map_err(Error::from)
        })
        .collect()
}

/// Retrieve the category whose title exactly matches `title`, if any.
pub fn get_category_by_title(
    title: &CategoryTitle,
    connection: &Connection,
) -> Result<Option<Category>, Error> {
    connection
        .prepare("SELECT id, title, created_at, updated_at FROM category WHERE title = :title;")?
        .query_row(&[(":title", title.as_ref())], map_row)
        .optional()
        .map_err(Error::from)
}

/// Return the category titled `title`, creating it first if it does not exist.
///
/// The insert is a no-op when another writer created the same title in the
/// meantime, the unique constraint on `category.title` keeps titles distinct.
pub fn find_or_create_category(
    title: CategoryTitle,
    connection: &Connection,
) -> Result<Category, Error> {
    if let Some(category) = get_category_by_title(&title, connection)? {
        return Ok(category);
    }

    let now = OffsetDateTime::now_utc();
    let rows_inserted = connection.execute(
        "INSERT INTO category (title, created_at, updated_at) VALUES (?1, ?2, ?2)
         ON CONFLICT(title) DO NOTHING",
        (title.as_ref(), now),
    )?;

    if rows_inserted > 0 {
        tracing::debug!("Created category \"{title}\"");
    }

    get_category_by_title(&title, connection)?.ok_or(Error::NotFound)
}

/// Retrieve the categories whose titles appear in `titles`.
///
/// Duplicate titles are fine, each matching category is returned once.
pub fn get_categories_by_titles(
    titles: &[CategoryTitle],
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    let mut categories = Vec::new();
    let mut seen_ids = HashSet::new();

    for chunk in titles.chunks(MAX_TITLES_PER_QUERY) {
        let placeholders = std::iter::repeat_n("?", chunk.len())
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "SELECT id, title, created_at, updated_at FROM category
             WHERE title IN ({placeholders})
             ORDER BY id ASC"
        );

        let mut stmt = connection.prepare(&query)?;
        let params = chunk
            .iter()
            .map(|title| -> &str { title.as_ref() })
            .collect::<Vec<_>>();

        for row in stmt.query_map(params_from_iter(params), map_row)? {
            let category = row?;

            if seen_ids.insert(category.id) {
                categories.push(category);
            }
        }
    }

    Ok(categories)
}

/// Retrieve all categories ordered alphabetically by title.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, title, created_at, updated_at FROM category ORDER BY title ASC;")?
        .query_map([], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Initialize the category table.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_title: String = row.get(1)?;
    let title = CategoryTitle::new_unchecked(&raw_title);
    let created_at = row.get(2)?;
    let updated_at = row.get(3)?;

    Ok(Category {
        id,
        title,
        created_at,
        updated_at,
    })
}
