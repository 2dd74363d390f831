// SPDX-FileCopyrightText: 2026 Comanda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `comanda-core::types` for use across
//! adapter trait boundaries. This module re-exports them for convenience
//! within the storage crate.

pub use comanda_core::types::{
    CommitOutcome, Location, Message, NewMessage, NewOrder, NewOrderItem, Order, OrderItem,
    Product, User,
};
