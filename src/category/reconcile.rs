//! Name-based reconciliation of referenced category titles against the
//! categories already in the database.

use std::collections::{HashMap, HashSet};

use rusqlite::Connection;

use crate::{
    Error,
    category::{Category, CategoryTitle, create_categories, get_categories_by_titles},
};

/// Categories indexed by title, used to resolve the category of each row in
/// a batch of transactions.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CategoryPool {
    categories: HashMap<CategoryTitle, Category>,
    /// The number of categories that had to be created to build the pool.
    pub created_count: usize,
}

impl CategoryPool {
    /// Look up the category with exactly the title `title`.
    pub fn resolve(&self, title: &CategoryTitle) -> Option<&Category> {
        self.categories.get(title)
    }

    /// The number of distinct categories in the pool.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether the pool has no categories.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl FromIterator<Category> for CategoryPool {
    fn from_iter<T: IntoIterator<Item = Category>>(iter: T) -> Self {
        Self {
            categories: iter
                .into_iter()
                .map(|category| (category.title.clone(), category))
                .collect(),
            created_count: 0,
        }
    }
}

/// Return the titles in `referenced` that do not belong to any category in `existing`.
///
/// The result has no duplicates and keeps the order in which each title was first referenced.
pub fn missing_titles(referenced: &[CategoryTitle], existing: &[Category]) -> Vec<CategoryTitle> {
    let existing_titles = existing
        .iter()
        .map(|category| &category.title)
        .collect::<HashSet<_>>();
    let mut seen = HashSet::new();

    referenced
        .iter()
        .filter(|title| !existing_titles.contains(title))
        .filter(|title| seen.insert(*title))
        .cloned()
        .collect()
}

/// Make sure that every title in `referenced` has a category and return all of them.
///
/// Existing categories are reused, the missing titles are created in a single
/// batch. `referenced` may contain duplicates.
///
/// **Note**: If you want the created categories to be rolled back together with
/// whatever the caller does next, pass in a transaction for `connection`.
pub fn reconcile_categories(
    referenced: &[CategoryTitle],
    connection: &Connection,
) -> Result<CategoryPool, Error> {
    let existing = get_categories_by_titles(referenced, connection)?;
    let to_create = missing_titles(referenced, &existing);
    let created = create_categories(&to_create, connection)?;

    tracing::debug!(
        "Reconciled {} referenced categories: {} existing, {} created",
        referenced.len(),
        existing.len(),
        created.len()
    );

    let created_count = created.len();
    let mut pool = created.into_iter().chain(existing).collect::<CategoryPool>();
    pool.created_count = created_count;

    Ok(pool)
}

#[cfg(test)]
mod missing_titles_tests {
    use time::OffsetDateTime;

    use crate::category::{Category, CategoryTitle, missing_titles};

    fn category(id: i64, title: &str) -> Category {
        let now = OffsetDateTime::UNIX_EPOCH;

        Category {
            id,
            title: CategoryTitle::new_unchecked(title),
            created_at: now,
            updated_at: now,
        }
    }

    fn titles(raw: &[&str]) -> Vec<CategoryTitle> {
        raw.iter()
            .map(|title| CategoryTitle::new_unchecked(title))
            .collect()
    }

    #[test]
    fn returns_titles_without_a_category() {
        let existing = [category(1, "Salary")];

        let got = missing_titles(&titles(&["Salary", "Housing", "Food"]), &existing);

        assert_eq!(got, titles(&["Housing", "Food"]));
    }

    #[test]
    fn deduplicates_in_first_seen_order() {
        let got = missing_titles(&titles(&["Food", "Rent", "Food", "Rent", "Fun"]), &[]);

        assert_eq!(got, titles(&["Food", "Rent", "Fun"]));
    }

    #[test]
    fn nothing_missing_when_all_exist() {
        let existing = [category(1, "Food"), category(2, "Rent")];

        let got = missing_titles(&titles(&["Rent", "Food", "Rent"]), &existing);

        assert!(got.is_empty(), "want no missing titles, got {got:?}");
    }

    #[test]
    fn title_matching_is_case_sensitive() {
        let existing = [category(1, "food")];

        let got = missing_titles(&titles(&["Food"]), &existing);

        assert_eq!(got, titles(&["Food"]));
    }
}

#[cfg(test)]
mod reconcile_categories_tests {
    use rusqlite::Connection;

    use crate::category::{
        CategoryTitle, create_category, create_category_table, get_all_categories,
        reconcile_categories,
    };

    fn get_test_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_category_table(&connection).expect("Could not create category table");
        connection
    }

    #[test]
    fn creates_only_missing_categories() {
        let connection = get_test_db_connection();
        let housing = create_category(CategoryTitle::new_unchecked("Housing"), &connection)
            .expect("Could not create test category");
        let referenced = [
            CategoryTitle::new_unchecked("Salary"),
            CategoryTitle::new_unchecked("Housing"),
            CategoryTitle::new_unchecked("Salary"),
        ];

        let pool = reconcile_categories(&referenced, &connection).expect("Could not reconcile");

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.created_count, 1);
        assert_eq!(pool.resolve(&referenced[1]), Some(&housing));
        assert!(pool.resolve(&referenced[0]).is_some());
        assert_eq!(
            get_all_categories(&connection)
                .expect("Could not get categories")
                .len(),
            2
        );
    }

    #[test]
    fn empty_reference_list_gives_empty_pool() {
        let connection = get_test_db_connection();

        let pool = reconcile_categories(&[], &connection).expect("Could not reconcile");

        assert!(pool.is_empty());
        assert_eq!(pool.created_count, 0);
    }
}
