// SPDX-FileCopyrightText: 2026 Comanda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session resolution over the message ledger.
//!
//! Sessions are not stored rows; a session id is a grouping label carried
//! on ledger entries. The active session is derived from the most recent
//! `user`-role entry: younger than the timeout reuses its id, older (or
//! absent) mints a fresh uuid.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use comanda_core::{ComandaError, StorageAdapter};

/// Derives the active session id for a user from ledger history.
pub struct SessionTracker {
    storage: Arc<dyn StorageAdapter>,
    timeout: Duration,
}

impl SessionTracker {
    pub fn new(storage: Arc<dyn StorageAdapter>, timeout_hours: u64) -> Self {
        Self {
            storage,
            timeout: Duration::hours(timeout_hours as i64),
        }
    }

    /// Resolve the session id the next inbound message belongs to.
    ///
    /// Degrades to a fresh session when history is unreadable: availability
    /// wins over stale grouping. Callers must hold the per-user lock so two
    /// concurrent messages cannot mint two different sessions.
    pub async fn resolve_session(&self, user_id: &str, now: DateTime<Utc>) -> String {
        match self.storage.latest_user_message(user_id).await {
            Ok(Some(message)) => {
                match DateTime::parse_from_rfc3339(&message.created_at) {
                    Ok(ts) if now - ts.with_timezone(&Utc) < self.timeout => message.session_id,
                    Ok(_) => fresh_session(),
                    Err(e) => {
                        warn!(user_id, error = %e, "unparseable ledger timestamp, minting fresh session");
                        fresh_session()
                    }
                }
            }
            Ok(None) => fresh_session(),
            Err(e) => {
                warn!(user_id, error = %e, "ledger unreadable, minting fresh session");
                fresh_session()
            }
        }
    }

    /// Count of `user`-role messages recorded under the given session.
    pub async fn count_in_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<u32, ComandaError> {
        self.storage.count_user_messages(user_id, session_id).await
    }
}

fn fresh_session() -> String {
    uuid::Uuid::new_v4().to_string()
}
