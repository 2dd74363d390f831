// SPDX-FileCopyrightText: 2026 Comanda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common domain types used across collaborator traits and the Comanda core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifies the type of adapter behind a collaborator trait.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Catalog,
    Reply,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Role of a ledger entry author.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Agent,
    System,
}

// --- Users ---

/// A registered end user, keyed by (phone, channel).
///
/// Created on first inbound message, mutated only by explicit profile
/// updates, never deleted. The last-known delivery address is not a stored
/// field -- it is derived from the most recent order carrying one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub phone: String,
    pub channel: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub created_at: String,
}

/// Explicit profile update supplied by the reply provider when the user
/// volunteers their details mid-conversation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub email: Option<String>,
}

/// Read-only view of a user handed to the reply provider.
#[derive(Debug, Clone, Default)]
pub struct UserProfileView {
    pub display_name: Option<String>,
    pub email: Option<String>,
    /// Derived from the most recent order with a non-null delivery address.
    pub delivery_address: Option<String>,
}

// --- Message ledger ---

/// An immutable conversation ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub user_id: String,
    pub role: String,
    pub body: String,
    pub channel: String,
    pub session_id: String,
    pub handoff: bool,
    pub order_id: Option<String>,
    pub media_url: Option<String>,
    pub token_count: Option<i64>,
    pub created_at: String,
}

/// A ledger entry about to be appended. Session id and handoff flag are
/// computed by the core and passed in; the ledger itself stays passive.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub user_id: String,
    pub role: MessageRole,
    pub body: String,
    pub channel: String,
    pub session_id: String,
    pub handoff: bool,
    pub order_id: Option<String>,
    pub media_url: Option<String>,
    pub token_count: Option<i64>,
}

// --- Catalog ---

/// An active, sellable product from the catalog snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Integer price in the smallest displayed unit (no decimals).
    pub base_price: i64,
    pub is_combo: bool,
}

/// An active store location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// Read-only view of active products and locations, refreshed by an
/// external collaborator.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub products: Vec<Product>,
    pub locations: Vec<Location>,
    pub loaded_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    /// Case-insensitive exact lookup of an active product by name.
    pub fn find_product(&self, name: &str) -> Option<&Product> {
        self.products
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Case-insensitive exact lookup of an active location by name.
    pub fn find_location(&self, name: &str) -> Option<&Location> {
        self.locations
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(name))
    }
}

// --- Orders ---

/// Fulfillment mode for an order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Fulfillment {
    Pickup,
    Delivery,
}

/// A single line item in a proposed order payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub subtotal: i64,
}

/// A structured order proposal produced by the reply provider.
///
/// `notes` uses `Option` so a payload with the key absent entirely can be
/// rejected; an empty string is acceptable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPayload {
    pub items: Vec<OrderItemInput>,
    pub fulfillment: Fulfillment,
    pub payment_method: String,
    pub notes: Option<String>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub delivery_time: Option<String>,
}

/// A persisted order row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub location_id: String,
    pub status: String,
    pub total_amount: i64,
    pub payment_method: String,
    pub fulfillment: String,
    pub delivery_address: Option<String>,
    pub delivery_time: String,
    pub notes: String,
    pub channel: String,
    pub idempotency_key: String,
    pub created_at: String,
}

/// A persisted order line item. `unit_price` is captured at commit time and
/// never re-read from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub subtotal: i64,
}

/// An order row about to be committed.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: String,
    pub location_id: String,
    pub status: String,
    pub total_amount: i64,
    pub payment_method: String,
    pub fulfillment: Fulfillment,
    pub delivery_address: Option<String>,
    pub delivery_time: String,
    pub notes: String,
    pub channel: String,
    pub idempotency_key: String,
}

/// An order line item about to be committed alongside its order.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub subtotal: i64,
}

/// Result of the atomic duplicate-check-then-insert performed by storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Order and items were inserted; carries the new order id.
    Committed(String),
    /// A matching order already existed inside the idempotency window;
    /// nothing was inserted. Carries the existing order id.
    Duplicate(String),
}

/// How an order commit attempt concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitDisposition {
    Committed,
    /// Idempotent no-op: a matching recent order already exists.
    Duplicate,
    /// Payload failed validation; names the offending field or product.
    Invalid(String),
    /// Catalog or location data unavailable.
    Unavailable,
    /// Transaction failure; rolled back, nothing persisted.
    Failed,
}

/// Outcome of the Order Commit Pipeline. Errors never cross this boundary;
/// they are folded into the disposition.
#[derive(Debug, Clone)]
pub struct OrderCommitResult {
    pub success: bool,
    pub is_new_user: bool,
    pub confirmation_text: String,
    pub order_id: Option<String>,
    pub disposition: CommitDisposition,
}

// --- Reply generation ---

/// One conversation turn handed to the reply provider as context.
#[derive(Debug, Clone)]
pub struct Turn {
    pub role: MessageRole,
    pub text: String,
}

/// Request to the reply-generation collaborator.
#[derive(Debug, Clone)]
pub struct ReplyRequest {
    pub phone: String,
    pub channel: String,
    pub body: String,
    pub media_url: Option<String>,
    pub history: Vec<Turn>,
    pub profile: Option<UserProfileView>,
    /// Catalog view captured when the conversation agent was built.
    pub catalog: CatalogSnapshot,
}

/// A typed reply from the reply-generation collaborator.
///
/// Structured payloads come back as explicit fields rather than sentinel
/// tokens embedded in the display text, so the core never string-splits
/// provider output.
#[derive(Debug, Clone, Default)]
pub struct AgentReply {
    pub display_text: String,
    pub order: Option<OrderPayload>,
    pub profile_update: Option<ProfileUpdate>,
}

// --- Inbound handling ---

/// Outcome of handling one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlingOutcome {
    /// Automated processing produced a reply to send back.
    AutomatedReply(String),
    /// The message triggered escalation; the notice text is user-facing.
    HandoffNotice(String),
    /// Human mode is active: the message was recorded, nothing is sent.
    HumanModeSilent,
    /// The per-session message cap tripped after recording the message.
    SessionLimitReached(String),
}
