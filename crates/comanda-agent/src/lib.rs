// SPDX-FileCopyrightText: 2026 Comanda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound message engine for the Comanda ordering backend.
//!
//! Ties together session resolution, the handoff state machine, the agent
//! cache, reply generation, and the order commit pipeline behind a single
//! [`Engine::handle_inbound`] entry point.

pub mod cache;
pub mod handoff;
pub mod session;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use comanda_config::model::ComandaConfig;
use comanda_core::types::{
    CommitDisposition, HandlingOutcome, MessageRole, NewMessage, OrderCommitResult, OrderPayload,
    ReplyRequest, User, UserProfileView,
};
use comanda_core::{CatalogProvider, ComandaError, ReplyProvider, StorageAdapter};
use comanda_orders::OrderPipeline;

use crate::cache::{AgentCache, ConversationAgent};
use crate::handoff::HandoffManager;
use crate::session::SessionTracker;

/// Reply recorded when the provider fails after the inbound entry was
/// already persisted.
const REPLY_APOLOGY: &str =
    "Lo siento, tuve un problema para procesar tu mensaje. ¿Podés repetirlo?";

/// Reply recorded when an order payload fails to commit.
const ORDER_APOLOGY: &str = "Lo siento, hubo un problema al procesar tu orden.";

/// Notice returned once a session hits its message cap.
const SESSION_LIMIT_NOTICE: &str =
    "⚠️ Llegamos al límite de mensajes de esta conversación. Escribinos de nuevo más tarde y seguimos por acá.";

/// The inbound message engine.
pub struct Engine {
    storage: Arc<dyn StorageAdapter>,
    catalog: Arc<dyn CatalogProvider>,
    replies: Arc<dyn ReplyProvider>,
    pipeline: OrderPipeline,
    sessions: SessionTracker,
    handoff: HandoffManager,
    cache: AgentCache,
    locks: DashMap<String, Arc<Mutex<()>>>,
    config: ComandaConfig,
}

impl Engine {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        catalog: Arc<dyn CatalogProvider>,
        replies: Arc<dyn ReplyProvider>,
        config: ComandaConfig,
    ) -> Self {
        let pipeline = OrderPipeline::new(storage.clone(), catalog.clone(), config.orders.clone());
        let sessions = SessionTracker::new(storage.clone(), config.session.timeout_hours);
        let handoff = HandoffManager::new(storage.clone(), config.handoff.window_hours);
        let cache = AgentCache::new(config.cache.agent_ttl_hours);
        Self {
            storage,
            catalog,
            replies,
            pipeline,
            sessions,
            handoff,
            cache,
            locks: DashMap::new(),
            config,
        }
    }

    /// Handle one inbound message end to end.
    ///
    /// The whole read-decide-write path runs under a per-user lock so
    /// concurrent messages from one user serialize while different users
    /// proceed in parallel. Catastrophic failures (user registration or
    /// the inbound append) surface as errors so the caller can retry the
    /// event; duplicate suppression makes that retry safe.
    pub async fn handle_inbound(
        &self,
        phone: &str,
        channel: &str,
        body: &str,
        media_url: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<HandlingOutcome, ComandaError> {
        let user_key = user_key(channel, phone);
        let lock = self
            .locks
            .entry(user_key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let (user, is_new) = self.storage.get_or_create_user(phone, channel, now).await?;
        if is_new {
            info!(user_id = %user.id, %channel, "registered new user on first contact");
        }

        let session_id = self.sessions.resolve_session(&user.id, now).await;
        let trigger = handoff::is_handoff_request(body);
        let human_mode = self.handoff.is_in_human_mode(&user.id, now).await;

        // Record the inbound entry first; it inherits the flag while human
        // mode is active so the window keeps rolling forward.
        let inbound = NewMessage {
            user_id: user.id.clone(),
            role: MessageRole::User,
            body: body.to_string(),
            channel: channel.to_string(),
            session_id: session_id.clone(),
            handoff: trigger || human_mode,
            order_id: None,
            media_url: media_url.map(str::to_string),
            token_count: None,
        };
        self.storage.append_message(&inbound, now).await?;

        if trigger {
            let notice = self
                .handoff
                .mark_for_human(&user, channel, &session_id, now)
                .await?;
            self.sweep_state(now);
            return Ok(HandlingOutcome::HandoffNotice(notice));
        }

        if human_mode {
            debug!(user_id = %user.id, "human mode active, message recorded silently");
            self.sweep_state(now);
            return Ok(HandlingOutcome::HumanModeSilent);
        }

        // Record-then-check: the message above counts toward the cap.
        let count = self.sessions.count_in_session(&user.id, &session_id).await?;
        if count > self.config.session.max_messages {
            info!(user_id = %user.id, count, "session message cap reached");
            self.sweep_state(now);
            return Ok(HandlingOutcome::SessionLimitReached(
                SESSION_LIMIT_NOTICE.to_string(),
            ));
        }

        let agent = match self.cache.get(&user_key, now) {
            Some(agent) => agent,
            None => {
                // A new agent needs the catalog; if it is unreachable the
                // event fails retryably and nothing is cached.
                let snapshot = self.catalog.snapshot().await.map_err(|e| {
                    ComandaError::ServiceUnavailable(format!("catalog: {e}"))
                })?;
                let profile = self.profile_view(&user).await;
                let agent = ConversationAgent::new(
                    profile,
                    snapshot,
                    self.config.cache.max_history_turns,
                );
                self.cache.insert(user_key.clone(), agent, now)
            }
        };

        let request = {
            let mut agent = agent.lock().await;
            agent.push_turn(MessageRole::User, body);
            ReplyRequest {
                phone: phone.to_string(),
                channel: channel.to_string(),
                body: body.to_string(),
                media_url: media_url.map(str::to_string),
                history: agent.history(),
                profile: Some(agent.profile().clone()),
                catalog: agent.catalog().clone(),
            }
        };

        let (display_text, order_id) = match self.replies.generate(request).await {
            Ok(reply) => {
                if let Some(update) = &reply.profile_update {
                    let updated = self
                        .storage
                        .update_profile(
                            phone,
                            channel,
                            update.display_name.as_deref(),
                            update.email.as_deref(),
                        )
                        .await;
                    match updated {
                        Ok(_) => {
                            let profile = self.profile_view(&user).await;
                            agent.lock().await.set_profile(profile);
                        }
                        Err(e) => warn!(user_id = %user.id, error = %e, "profile update failed"),
                    }
                }

                match &reply.order {
                    Some(payload) => {
                        let result = self.pipeline.commit(payload, phone, channel, now).await;
                        match result.disposition {
                            CommitDisposition::Committed => {
                                (result.confirmation_text, result.order_id)
                            }
                            CommitDisposition::Duplicate => (reply.display_text, result.order_id),
                            _ => (ORDER_APOLOGY.to_string(), None),
                        }
                    }
                    None => (reply.display_text, None),
                }
            }
            Err(e) => {
                // The inbound entry is already on the ledger; degrade to an
                // apology which is itself recorded.
                warn!(user_id = %user.id, error = %e, "reply provider failed");
                (REPLY_APOLOGY.to_string(), None)
            }
        };

        let outbound = NewMessage {
            user_id: user.id.clone(),
            role: MessageRole::Agent,
            body: display_text.clone(),
            channel: channel.to_string(),
            session_id,
            handoff: false,
            order_id,
            media_url: None,
            token_count: None,
        };
        self.storage.append_message(&outbound, now).await?;
        agent.lock().await.push_turn(MessageRole::Agent, &display_text);

        self.sweep_state(now);
        Ok(HandlingOutcome::AutomatedReply(display_text))
    }

    /// Commit an order payload directly, outside the conversational flow.
    pub async fn commit_order(
        &self,
        payload: &OrderPayload,
        phone: &str,
        channel: &str,
        now: DateTime<Utc>,
    ) -> OrderCommitResult {
        self.pipeline.commit(payload, phone, channel, now).await
    }

    /// Operator signal that their intervention is over.
    ///
    /// Appends the unflagged closing turn; returns `false` (and logs) when
    /// the signal could not be recorded.
    pub async fn end_intervention(&self, phone: &str, channel: &str, now: DateTime<Utc>) -> bool {
        let result: Result<(), ComandaError> = async {
            let (user, _) = self.storage.get_or_create_user(phone, channel, now).await?;
            let session_id = self.sessions.resolve_session(&user.id, now).await;
            self.handoff
                .end_intervention(&user, channel, &session_id, now)
                .await?;
            Ok(())
        }
        .await;
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(phone, channel, error = %e, "failed to record end of intervention");
                false
            }
        }
    }

    /// Whether human mode is active for the user right now.
    pub async fn is_in_human_mode(&self, phone: &str, channel: &str, now: DateTime<Utc>) -> bool {
        match self.storage.get_or_create_user(phone, channel, now).await {
            Ok((user, _)) => self.handoff.is_in_human_mode(&user.id, now).await,
            Err(e) => {
                warn!(phone, channel, error = %e, "user lookup failed, assuming automated mode");
                false
            }
        }
    }

    /// Number of live cached conversation agents.
    pub fn cached_agents(&self) -> usize {
        self.cache.len()
    }

    /// Number of tracked per-user lock entries.
    pub fn user_locks(&self) -> usize {
        self.locks.len()
    }

    /// Evict idle cached agents and prune lock entries no task is holding.
    ///
    /// A lock entry with a strong count of 1 is referenced only by the map,
    /// so removing it cannot break mutual exclusion; the caller's own entry
    /// is still held and survives.
    fn sweep_state(&self, now: DateTime<Utc>) {
        self.cache.sweep(now);
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    async fn profile_view(&self, user: &User) -> UserProfileView {
        let delivery_address = match self.storage.last_delivery_address(&user.id).await {
            Ok(address) => address,
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "delivery address lookup failed");
                None
            }
        };
        UserProfileView {
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            delivery_address,
        }
    }
}

fn user_key(channel: &str, phone: &str) -> String {
    format!("{channel}:{phone}")
}
