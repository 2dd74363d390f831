// SPDX-FileCopyrightText: 2026 Comanda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human handoff state machine.
//!
//! Human mode is level-triggered: it is active exactly when a
//! handoff-flagged ledger entry exists inside the rolling window. There is
//! no mode column to flip, so the state self-heals across restarts and
//! expires on its own.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use comanda_core::types::{MessageRole, NewMessage, User};
use comanda_core::{ComandaError, StorageAdapter};

/// Exact (case-insensitive) trigger phrases.
const TRIGGER_PHRASES: &[&str] = &["#human", "hablar con humano", "operador", "ayuda humana"];

/// Substring that also triggers, catching variants like
/// "quiero hablar con alguien".
const TRIGGER_SUBSTRING: &str = "hablar con";

/// User-facing notice sent when the conversation is escalated.
const TRANSITION_NOTICE: &str =
    "🙋 Entendido, te ponemos en contacto con una persona del equipo. En breve te responden por acá.";

/// Closing line appended when an operator ends their intervention.
const RESUME_NOTICE: &str =
    "✅ La conversación ha vuelto al modo automático. ¿En qué más puedo ayudarte?";

/// Whether an inbound body asks for a human.
pub fn is_handoff_request(body: &str) -> bool {
    let lowered = body.trim().to_lowercase();
    TRIGGER_PHRASES.iter().any(|p| lowered == *p) || lowered.contains(TRIGGER_SUBSTRING)
}

/// Escalation and de-escalation over the message ledger.
pub struct HandoffManager {
    storage: Arc<dyn StorageAdapter>,
    window: Duration,
}

impl HandoffManager {
    pub fn new(storage: Arc<dyn StorageAdapter>, window_hours: u64) -> Self {
        Self {
            storage,
            window: Duration::hours(window_hours as i64),
        }
    }

    /// Escalate the conversation: append a user-facing transition notice
    /// and an operator alert, both flagged, then return the notice text.
    pub async fn mark_for_human(
        &self,
        user: &User,
        channel: &str,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<String, ComandaError> {
        let notice = NewMessage {
            user_id: user.id.clone(),
            role: MessageRole::System,
            body: TRANSITION_NOTICE.to_string(),
            channel: channel.to_string(),
            session_id: session_id.to_string(),
            handoff: true,
            order_id: None,
            media_url: None,
            token_count: None,
        };
        self.storage.append_message(&notice, now).await?;

        let alert = NewMessage {
            body: format!(
                "⚠️ ATENCIÓN REQUERIDA\nUsuario: {}\nTeléfono: {}\nCanal: {}",
                user.display_name.as_deref().unwrap_or("(sin nombre)"),
                user.phone,
                channel
            ),
            ..notice.clone()
        };
        self.storage.append_message(&alert, now).await?;

        info!(user_id = %user.id, %channel, "conversation escalated to human");
        Ok(TRANSITION_NOTICE.to_string())
    }

    /// Whether human mode is currently active for the user.
    ///
    /// Pure predicate over the ledger: any flagged entry within the window.
    /// Degrades to `false` (automated) when history is unreadable, so a
    /// storage hiccup never silences the agent.
    pub async fn is_in_human_mode(&self, user_id: &str, now: DateTime<Utc>) -> bool {
        let cutoff = now - self.window;
        match self
            .storage
            .has_recent_flagged_message(user_id, cutoff)
            .await
        {
            Ok(active) => active,
            Err(e) => {
                warn!(user_id, error = %e, "flag history unreadable, assuming automated mode");
                false
            }
        }
    }

    /// Record the operator's explicit end of intervention.
    ///
    /// Appends an unflagged `agent` closing turn. The flag window itself
    /// only clears once earlier flagged entries age past it.
    pub async fn end_intervention(
        &self,
        user: &User,
        channel: &str,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<String, ComandaError> {
        let closing = NewMessage {
            user_id: user.id.clone(),
            role: MessageRole::Agent,
            body: RESUME_NOTICE.to_string(),
            channel: channel.to_string(),
            session_id: session_id.to_string(),
            handoff: false,
            order_id: None,
            media_url: None,
            token_count: None,
        };
        self.storage.append_message(&closing, now).await?;
        info!(user_id = %user.id, %channel, "operator intervention ended");
        Ok(RESUME_NOTICE.to_string())
    }
}
