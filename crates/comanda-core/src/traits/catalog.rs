// SPDX-FileCopyrightText: 2026 Comanda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog provider trait for the read-only product and location view.

use async_trait::async_trait;
use chrono::Utc;

use crate::error::ComandaError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CatalogSnapshot, Location, Product};

/// Provider of the catalog: active products and locations.
///
/// The catalog is maintained by an external process; this core only reads
/// it. Implementations typically back onto the same SQLite database as the
/// storage adapter.
#[async_trait]
pub trait CatalogProvider: PluginAdapter {
    /// Returns all active products.
    async fn active_products(&self) -> Result<Vec<Product>, ComandaError>;

    /// Returns all active locations.
    async fn active_locations(&self) -> Result<Vec<Location>, ComandaError>;

    /// Loads a consistent snapshot of active products and locations.
    async fn snapshot(&self) -> Result<CatalogSnapshot, ComandaError> {
        let products = self.active_products().await?;
        let locations = self.active_locations().await?;
        Ok(CatalogSnapshot {
            products,
            locations,
            loaded_at: Utc::now(),
        })
    }
}
