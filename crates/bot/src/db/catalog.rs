//! Catalog repository (read-only from the core's perspective).

use std::str::FromStr;

use sqlx::{Pool, Sqlite};

use dokan_core::{Category, ItemId, Toman};

use super::RepositoryError;
use crate::models::catalog::CatalogItem;

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: i64,
    category: String,
    title: String,
    price_toman: i64,
    active: bool,
}

impl TryFrom<ItemRow> for CatalogItem {
    type Error = RepositoryError;

    fn try_from(r: ItemRow) -> Result<Self, Self::Error> {
        let category = Category::from_str(&r.category).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid category in database: {e}"))
        })?;
        Ok(Self {
            id: ItemId::new(r.id),
            category,
            title: r.title,
            price: Toman::new(r.price_toman),
            active: r.active,
        })
    }
}

/// Repository for catalog reads.
pub struct CatalogRepository<'a> {
    pool: &'a Pool<Sqlite>,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// List active items in a category, cheapest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored category is invalid.
    pub async fn list_active_items(
        &self,
        category: Category,
    ) -> Result<Vec<CatalogItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r"
            SELECT id, category, title, price_toman, active
            FROM catalog_items
            WHERE category = ? AND active = 1
            ORDER BY price_toman, id
            ",
        )
        .bind(category.to_string())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a single item by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if the stored category is invalid.
    pub async fn get_item(&self, id: ItemId) -> Result<Option<CatalogItem>, RepositoryError> {
        let row = sqlx::query_as::<_, ItemRow>(
            r"
            SELECT id, category, title, price_toman, active
            FROM catalog_items
            WHERE id = ?
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Insert an item. Exists for tests and seeding tools; the bot itself
    /// never writes to the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_item(
        &self,
        category: Category,
        title: &str,
        price: Toman,
        active: bool,
    ) -> Result<ItemId, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO catalog_items (category, title, price_toman, active)
            VALUES (?, ?, ?, ?)
            RETURNING id
            ",
        )
        .bind(category.to_string())
        .bind(title)
        .bind(price.amount())
        .bind(active)
        .fetch_one(self.pool)
        .await?;

        Ok(ItemId::new(id))
    }
}
