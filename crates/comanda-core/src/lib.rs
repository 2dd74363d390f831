// SPDX-FileCopyrightText: 2026 Comanda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Comanda conversational ordering backend.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain types used throughout the Comanda workspace. Adapter plugins for
//! storage, catalog, and reply generation implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ComandaError;
pub use types::{
    AdapterType, AgentReply, CatalogSnapshot, CommitDisposition, CommitOutcome, Fulfillment,
    HandlingOutcome, HealthStatus, Location, Message, MessageRole, NewMessage, NewOrder,
    NewOrderItem, Order,
    OrderCommitResult, OrderItem, OrderItemInput, OrderPayload, Product, ProfileUpdate,
    ReplyRequest, Turn, User, UserProfileView,
};

// Re-export all adapter traits at crate root.
pub use traits::{CatalogProvider, PluginAdapter, ReplyProvider, StorageAdapter};
