// SPDX-FileCopyrightText: 2026 Comanda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order commit pipeline for the Comanda ordering backend.
//!
//! Takes structured order payloads produced by the reply provider,
//! validates them against the catalog, suppresses duplicate submissions,
//! persists atomically, and renders the Spanish confirmation text.

pub mod confirmation;
pub mod pipeline;

pub use pipeline::OrderPipeline;
