// SPDX-FileCopyrightText: 2026 Comanda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ComandaError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CommitOutcome, Message, NewMessage, NewOrder, NewOrderItem, Order, OrderItem, User};

/// Adapter for storage and persistence backends.
///
/// Storage adapters manage the lifecycle of database connections and expose
/// the typed operations the engine and the order pipeline need: user
/// registration, the append-only message ledger, and atomic order commits.
///
/// All session ids and handoff flags are computed by the caller; the ledger
/// stays passive. `now` parameters let callers inject time in tests.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), ComandaError>;

    /// Closes the storage backend, flushing pending writes and releasing connections.
    async fn close(&self) -> Result<(), ComandaError>;

    // --- Users ---

    /// Looks up a user by (phone, channel), creating them if absent.
    /// Returns the user plus whether they were just created.
    async fn get_or_create_user(
        &self,
        phone: &str,
        channel: &str,
        now: DateTime<Utc>,
    ) -> Result<(User, bool), ComandaError>;

    /// Applies an explicit profile update. Fields set to `None` are left
    /// untouched. Returns whether a row was updated.
    async fn update_profile(
        &self,
        phone: &str,
        channel: &str,
        display_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<bool, ComandaError>;

    /// Most recent non-null delivery address across the user's orders.
    async fn last_delivery_address(&self, user_id: &str) -> Result<Option<String>, ComandaError>;

    // --- Message ledger ---

    /// Appends a ledger entry and returns its id.
    async fn append_message(
        &self,
        message: &NewMessage,
        now: DateTime<Utc>,
    ) -> Result<String, ComandaError>;

    /// Most recent `user`-role ledger entry for session resolution.
    async fn latest_user_message(&self, user_id: &str) -> Result<Option<Message>, ComandaError>;

    /// Count of `user`-role entries bearing the given session id.
    async fn count_user_messages(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<u32, ComandaError>;

    /// Whether any handoff-flagged entry exists at or after `cutoff`.
    async fn has_recent_flagged_message(
        &self,
        user_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<bool, ComandaError>;

    // --- Orders ---

    /// Atomic duplicate-check-then-insert: if an order for the same user and
    /// channel with the same total exists at or after `duplicate_cutoff`,
    /// returns [`CommitOutcome::Duplicate`] without writing; otherwise
    /// inserts the order and all its items in one transaction.
    async fn commit_order(
        &self,
        order: &NewOrder,
        items: &[NewOrderItem],
        duplicate_cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<CommitOutcome, ComandaError>;

    /// Fetches an order row by id.
    async fn get_order(&self, order_id: &str) -> Result<Option<Order>, ComandaError>;

    /// Fetches the line items of an order.
    async fn order_items(&self, order_id: &str) -> Result<Vec<OrderItem>, ComandaError>;
}
