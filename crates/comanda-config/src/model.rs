// SPDX-FileCopyrightText: 2026 Comanda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Comanda ordering backend.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Comanda configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ComandaConfig {
    /// Agent identity and behavior settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Conversation session settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Human handoff settings.
    #[serde(default)]
    pub handoff: HandoffConfig,

    /// In-memory agent cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Order commit pipeline settings.
    #[serde(default)]
    pub orders: OrdersConfig,
}

/// Agent identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "comanda".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// Per-operation timeout in milliseconds for storage calls.
    #[serde(default = "default_op_timeout_ms")]
    pub op_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            op_timeout_ms: default_op_timeout_ms(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("comanda").join("comanda.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("comanda.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

fn default_op_timeout_ms() -> u64 {
    5_000
}

/// Conversation session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Hours of inactivity after which a new session id is minted.
    #[serde(default = "default_session_timeout_hours")]
    pub timeout_hours: u64,

    /// Maximum user messages per session before replies are suspended.
    #[serde(default = "default_max_messages")]
    pub max_messages: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_hours: default_session_timeout_hours(),
            max_messages: default_max_messages(),
        }
    }
}

fn default_session_timeout_hours() -> u64 {
    12
}

fn default_max_messages() -> u32 {
    50
}

/// Human handoff configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HandoffConfig {
    /// Hours a flagged ledger entry keeps human mode active.
    #[serde(default = "default_handoff_window_hours")]
    pub window_hours: u64,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            window_hours: default_handoff_window_hours(),
        }
    }
}

fn default_handoff_window_hours() -> u64 {
    2
}

/// In-memory agent cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Hours an idle cached agent survives before eviction.
    #[serde(default = "default_agent_ttl_hours")]
    pub agent_ttl_hours: u64,

    /// Maximum conversation turns retained per cached agent.
    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            agent_ttl_hours: default_agent_ttl_hours(),
            max_history_turns: default_max_history_turns(),
        }
    }
}

fn default_agent_ttl_hours() -> u64 {
    24
}

fn default_max_history_turns() -> usize {
    40
}

/// Order commit pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OrdersConfig {
    /// Minutes within which a same-user, same-channel, same-total
    /// submission is treated as a duplicate.
    #[serde(default = "default_duplicate_window_mins")]
    pub duplicate_window_mins: u64,

    /// Catalog product name used to price the delivery fee line item.
    #[serde(default = "default_delivery_fee_product")]
    pub delivery_fee_product: String,

    /// Name of the location orders are placed against.
    #[serde(default = "default_location")]
    pub location: String,
}

impl Default for OrdersConfig {
    fn default() -> Self {
        Self {
            duplicate_window_mins: default_duplicate_window_mins(),
            delivery_fee_product: default_delivery_fee_product(),
            location: default_location(),
        }
    }
}

fn default_duplicate_window_mins() -> u64 {
    5
}

fn default_delivery_fee_product() -> String {
    "Delivery".to_string()
}

fn default_location() -> String {
    "Vicente Lopez".to_string()
}
