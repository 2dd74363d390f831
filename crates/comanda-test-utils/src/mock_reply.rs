// SPDX-FileCopyrightText: 2026 Comanda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock reply provider for deterministic testing.
//!
//! `MockReply` implements `ReplyProvider` with pre-configured replies,
//! enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use comanda_core::types::{AdapterType, AgentReply, HealthStatus, ReplyRequest};
use comanda_core::{ComandaError, PluginAdapter, ReplyProvider};

/// A mock reply provider that returns pre-configured replies.
///
/// Replies are popped from a FIFO queue. When the queue is empty, a plain
/// "mock reply" text is returned. Requests are captured for assertions.
pub struct MockReply {
    replies: Arc<Mutex<VecDeque<Result<AgentReply, ComandaError>>>>,
    requests: Arc<Mutex<Vec<ReplyRequest>>>,
}

impl MockReply {
    /// Create a new mock provider with an empty reply queue.
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a plain text reply.
    pub async fn add_text(&self, text: impl Into<String>) {
        self.replies.lock().await.push_back(Ok(AgentReply {
            display_text: text.into(),
            order: None,
            profile_update: None,
        }));
    }

    /// Queue a full structured reply.
    pub async fn add_reply(&self, reply: AgentReply) {
        self.replies.lock().await.push_back(Ok(reply));
    }

    /// Queue a failure for the next generation call.
    pub async fn add_failure(&self, message: impl Into<String>) {
        self.replies.lock().await.push_back(Err(ComandaError::Provider {
            message: message.into(),
            source: None,
        }));
    }

    /// All requests the engine has sent so far.
    pub async fn requests(&self) -> Vec<ReplyRequest> {
        self.requests.lock().await.clone()
    }
}

impl Default for MockReply {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockReply {
    fn name(&self) -> &str {
        "mock-reply"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Reply
    }

    async fn health_check(&self) -> Result<HealthStatus, ComandaError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ComandaError> {
        Ok(())
    }
}

#[async_trait]
impl ReplyProvider for MockReply {
    async fn generate(&self, request: ReplyRequest) -> Result<AgentReply, ComandaError> {
        self.requests.lock().await.push(request);
        self.replies.lock().await.pop_front().unwrap_or_else(|| {
            Ok(AgentReply {
                display_text: "mock reply".to_string(),
                order: None,
                profile_update: None,
            })
        })
    }
}
