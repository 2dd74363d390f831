// SPDX-FileCopyrightText: 2026 Comanda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete engine stack with a temp SQLite
//! database, a seeded catalog, and a mock reply provider. Provides
//! `send()` to drive the full inbound pipeline in tests.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use comanda_agent::Engine;
use comanda_config::model::{ComandaConfig, StorageConfig};
use comanda_core::types::{HandlingOutcome, Location, Product};
use comanda_core::{CatalogProvider, ComandaError, ReplyProvider, StorageAdapter};
use comanda_storage::queries::catalog;
use comanda_storage::SqliteStorage;

use crate::mock_reply::MockReply;

/// Catalog rows seeded into every harness database.
fn seed_products() -> Vec<Product> {
    vec![
        Product {
            id: "prod-california".to_string(),
            name: "California Roll".to_string(),
            description: Some("Roll de palta, kanikama y queso".to_string()),
            base_price: 1200,
            is_combo: false,
        },
        Product {
            id: "prod-dragon".to_string(),
            name: "Dragon Roll".to_string(),
            description: None,
            base_price: 2200,
            is_combo: false,
        },
        Product {
            id: "prod-philadelphia".to_string(),
            name: "Philadelphia Roll".to_string(),
            description: None,
            base_price: 1200,
            is_combo: false,
        },
        Product {
            id: "prod-delivery".to_string(),
            name: "Delivery".to_string(),
            description: Some("Costo de envío".to_string()),
            base_price: 1500,
            is_combo: false,
        },
    ]
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: ComandaConfig,
    seed_catalog: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: ComandaConfig::default(),
            seed_catalog: true,
        }
    }

    /// Override the full configuration (storage section is replaced with
    /// the temp database path on build).
    pub fn with_config(mut self, config: ComandaConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the per-session message cap.
    pub fn with_max_messages(mut self, max_messages: u32) -> Self {
        self.config.session.max_messages = max_messages;
        self
    }

    /// Skip seeding products and locations, leaving the catalog empty.
    pub fn without_catalog(mut self) -> Self {
        self.seed_catalog = false;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, ComandaError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| ComandaError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = self.config;
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
            op_timeout_ms: 5_000,
        };

        let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
        storage.initialize().await?;

        if self.seed_catalog {
            let db = storage.db()?;
            for product in seed_products() {
                catalog::insert_product(db, &product, true).await?;
            }
            catalog::insert_location(
                db,
                &Location {
                    id: "loc-vicente-lopez".to_string(),
                    name: "Vicente Lopez".to_string(),
                    address: Some("Av. Maipu 1234".to_string()),
                    phone: Some("+541147000000".to_string()),
                },
                true,
            )
            .await?;
        }

        let mock_reply = Arc::new(MockReply::new());
        let engine = Engine::new(
            storage.clone() as Arc<dyn StorageAdapter>,
            storage.clone() as Arc<dyn CatalogProvider>,
            mock_reply.clone() as Arc<dyn ReplyProvider>,
            config.clone(),
        );

        Ok(TestHarness {
            engine,
            mock_reply,
            storage,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a seeded temp database.
pub struct TestHarness {
    /// The assembled engine under test.
    pub engine: Engine,
    /// The mock reply provider feeding the engine.
    pub mock_reply: Arc<MockReply>,
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    /// The configuration the engine was built with.
    pub config: ComandaConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Drive one inbound message through the engine at an injected time.
    pub async fn send(
        &self,
        phone: &str,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<HandlingOutcome, ComandaError> {
        self.engine
            .handle_inbound(phone, "whatsapp", body, None, now)
            .await
    }
}
