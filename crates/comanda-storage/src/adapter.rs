// SPDX-FileCopyrightText: 2026 Comanda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter and CatalogProvider traits.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use comanda_config::model::StorageConfig;
use comanda_core::types::{
    CommitOutcome, Location, Message, NewMessage, NewOrder, NewOrderItem, Order, OrderItem,
    Product, User,
};
use comanda_core::{
    AdapterType, CatalogProvider, ComandaError, HealthStatus, PluginAdapter, StorageAdapter,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`StorageAdapter::initialize`]. Also serves as the
/// [`CatalogProvider`], reading products and locations from the same
/// database.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`StorageAdapter::initialize`]
    /// is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    pub fn db(&self) -> Result<&Database, ComandaError> {
        self.db.get().ok_or_else(|| ComandaError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, ComandaError> {
        let db = self.db()?;
        db.call(|conn| {
            conn.execute_batch("SELECT 1;")?;
            Ok(())
        })
        .await?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ComandaError> {
        // Shutdown delegates to close if the DB was initialized.
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), ComandaError> {
        let db = Database::open(
            &self.config.database_path,
            self.config.wal_mode,
            Duration::from_millis(self.config.op_timeout_ms),
        )
        .await?;
        self.db.set(db).map_err(|_| ComandaError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), ComandaError> {
        self.db()?.close().await
    }

    // --- Users ---

    async fn get_or_create_user(
        &self,
        phone: &str,
        channel: &str,
        now: DateTime<Utc>,
    ) -> Result<(User, bool), ComandaError> {
        queries::users::get_or_create(self.db()?, phone, channel, now).await
    }

    async fn update_profile(
        &self,
        phone: &str,
        channel: &str,
        display_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<bool, ComandaError> {
        queries::users::update_profile(self.db()?, phone, channel, display_name, email).await
    }

    async fn last_delivery_address(&self, user_id: &str) -> Result<Option<String>, ComandaError> {
        queries::users::last_delivery_address(self.db()?, user_id).await
    }

    // --- Message ledger ---

    async fn append_message(
        &self,
        message: &NewMessage,
        now: DateTime<Utc>,
    ) -> Result<String, ComandaError> {
        queries::messages::append(self.db()?, message, now).await
    }

    async fn latest_user_message(&self, user_id: &str) -> Result<Option<Message>, ComandaError> {
        queries::messages::latest_user_message(self.db()?, user_id).await
    }

    async fn count_user_messages(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<u32, ComandaError> {
        queries::messages::count_user_messages(self.db()?, user_id, session_id).await
    }

    async fn has_recent_flagged_message(
        &self,
        user_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<bool, ComandaError> {
        queries::messages::has_recent_flagged(self.db()?, user_id, cutoff).await
    }

    // --- Orders ---

    async fn commit_order(
        &self,
        order: &NewOrder,
        items: &[NewOrderItem],
        duplicate_cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<CommitOutcome, ComandaError> {
        queries::orders::commit(self.db()?, order, items, duplicate_cutoff, now).await
    }

    async fn get_order(&self, order_id: &str) -> Result<Option<Order>, ComandaError> {
        queries::orders::get_order(self.db()?, order_id).await
    }

    async fn order_items(&self, order_id: &str) -> Result<Vec<OrderItem>, ComandaError> {
        queries::orders::order_items(self.db()?, order_id).await
    }
}

#[async_trait]
impl CatalogProvider for SqliteStorage {
    async fn active_products(&self) -> Result<Vec<Product>, ComandaError> {
        queries::catalog::active_products(self.db()?).await
    }

    async fn active_locations(&self) -> Result<Vec<Location>, ComandaError> {
        queries::catalog::active_locations(self.db()?).await
    }
}
