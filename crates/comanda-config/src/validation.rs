// SPDX-FileCopyrightText: 2026 Comanda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation of config values.
//!
//! Figment and serde enforce shape and types; this module enforces value
//! constraints that cannot be expressed in the type system.

use comanda_core::ComandaError;

use crate::model::ComandaConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate value constraints on a deserialized config.
pub fn validate_config(config: &ComandaConfig) -> Result<(), ComandaError> {
    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        return Err(ComandaError::Config(format!(
            "agent.log_level must be one of {LOG_LEVELS:?}, got {:?}",
            config.agent.log_level
        )));
    }
    if config.session.timeout_hours == 0 {
        return Err(ComandaError::Config(
            "session.timeout_hours must be at least 1".into(),
        ));
    }
    if config.session.max_messages == 0 {
        return Err(ComandaError::Config(
            "session.max_messages must be at least 1".into(),
        ));
    }
    if config.handoff.window_hours == 0 {
        return Err(ComandaError::Config(
            "handoff.window_hours must be at least 1".into(),
        ));
    }
    if config.cache.agent_ttl_hours == 0 {
        return Err(ComandaError::Config(
            "cache.agent_ttl_hours must be at least 1".into(),
        ));
    }
    if config.orders.duplicate_window_mins == 0 {
        return Err(ComandaError::Config(
            "orders.duplicate_window_mins must be at least 1".into(),
        ));
    }
    if config.orders.location.trim().is_empty() {
        return Err(ComandaError::Config(
            "orders.location must not be empty".into(),
        ));
    }
    if config.storage.op_timeout_ms == 0 {
        return Err(ComandaError::Config(
            "storage.op_timeout_ms must be at least 1".into(),
        ));
    }
    Ok(())
}
