// SPDX-FileCopyrightText: 2026 Comanda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Comanda integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockReply`] - Mock reply provider with pre-configured replies
//! - [`TestHarness`] - Full engine stack over a temp, catalog-seeded SQLite

pub mod harness;
pub mod mock_reply;

pub use harness::TestHarness;
pub use mock_reply::MockReply;
