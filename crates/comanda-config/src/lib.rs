// SPDX-FileCopyrightText: 2026 Comanda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Comanda ordering backend.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, and environment
//! variable overrides.
//!
//! # Usage
//!
//! ```no_run
//! use comanda_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Agent name: {}", config.agent.name);
//! ```

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    AgentConfig, CacheConfig, ComandaConfig, HandoffConfig, OrdersConfig, SessionConfig,
    StorageConfig,
};

use comanda_core::ComandaError;
use tracing::debug;

/// Load configuration from the XDG hierarchy and validate it.
///
/// This is the high-level entry point that loads config from TOML files
/// plus env vars via Figment, then runs post-deserialization validation.
pub fn load_and_validate() -> Result<ComandaConfig, ComandaError> {
    let config = loader::load_config().map_err(|e| ComandaError::Config(e.to_string()))?;
    validation::validate_config(&config)?;
    debug!(
        agent = %config.agent.name,
        database = %config.storage.database_path,
        "configuration loaded"
    );
    Ok(config)
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<ComandaConfig, ComandaError> {
    let config =
        loader::load_config_from_str(toml_content).map_err(|e| ComandaError::Config(e.to_string()))?;
    validation::validate_config(&config)?;
    Ok(config)
}
