//! Catalog domain types.

use dokan_core::{Category, ItemId, Toman};

/// A purchasable catalog entry (VPN plan or app subscription).
///
/// Read-only from the core's perspective; the catalog collaborator owns its
/// lifecycle.
#[derive(Debug, Clone)]
pub struct CatalogItem {
    pub id: ItemId,
    pub category: Category,
    pub title: String,
    pub price: Toman,
    pub active: bool,
}

impl CatalogItem {
    /// Menu label, e.g. `VPN 30 days / 50 GB - 129,000 toman`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} - {}", self.title, self.price)
    }
}
