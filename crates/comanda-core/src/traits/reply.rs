// SPDX-FileCopyrightText: 2026 Comanda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply provider trait for the conversational reply collaborator.

use async_trait::async_trait;

use crate::error::ComandaError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AgentReply, ReplyRequest};

/// Provider of conversational replies.
///
/// Implementations generate the user-facing text and any structured
/// payloads (order proposal, profile update) as typed fields on
/// [`AgentReply`]. The engine never parses sentinel markers out of the
/// display text.
#[async_trait]
pub trait ReplyProvider: PluginAdapter {
    /// Generates a reply for one inbound message with its context.
    async fn generate(&self, request: ReplyRequest) -> Result<AgentReply, ComandaError>;
}
