// SPDX-FileCopyrightText: 2026 Comanda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only message ledger operations.
//!
//! Session ids and handoff flags are computed by the caller; this module
//! only persists and reads them back.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use comanda_core::ComandaError;

use crate::database::{timestamp, Database};
use crate::models::{Message, NewMessage};

fn row_to_message(row: &rusqlite::Row<'_>) -> Result<Message, rusqlite::Error> {
    Ok(Message {
        id: row.get(0)?,
        user_id: row.get(1)?,
        role: row.get(2)?,
        body: row.get(3)?,
        channel: row.get(4)?,
        session_id: row.get(5)?,
        handoff: row.get(6)?,
        order_id: row.get(7)?,
        media_url: row.get(8)?,
        token_count: row.get(9)?,
        created_at: row.get(10)?,
    })
}

/// Append a ledger entry and return its id.
pub async fn append(
    db: &Database,
    message: &NewMessage,
    now: DateTime<Utc>,
) -> Result<String, ComandaError> {
    let message = message.clone();
    let id = uuid::Uuid::new_v4().to_string();
    let id_out = id.clone();
    let created_at = timestamp(now);
    db.call(move |conn| {
        conn.execute(
            "INSERT INTO messages (id, user_id, role, body, channel, session_id,
                                   handoff, order_id, media_url, token_count, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                id,
                message.user_id,
                message.role.to_string(),
                message.body,
                message.channel,
                message.session_id,
                message.handoff,
                message.order_id,
                message.media_url,
                message.token_count,
                created_at,
            ],
        )?;
        Ok(())
    })
    .await?;
    Ok(id_out)
}

/// Most recent `user`-role ledger entry, used for session resolution.
pub async fn latest_user_message(
    db: &Database,
    user_id: &str,
) -> Result<Option<Message>, ComandaError> {
    let user_id = user_id.to_string();
    db.call(move |conn| {
        let message = conn
            .query_row(
                "SELECT id, user_id, role, body, channel, session_id, handoff,
                        order_id, media_url, token_count, created_at
                 FROM messages
                 WHERE user_id = ?1 AND role = 'user'
                 ORDER BY created_at DESC LIMIT 1",
                params![user_id],
                row_to_message,
            )
            .optional()?;
        Ok(message)
    })
    .await
}

/// Count of `user`-role entries bearing the given session id.
pub async fn count_user_messages(
    db: &Database,
    user_id: &str,
    session_id: &str,
) -> Result<u32, ComandaError> {
    let user_id = user_id.to_string();
    let session_id = session_id.to_string();
    db.call(move |conn| {
        let count: u32 = conn.query_row(
            "SELECT COUNT(*) FROM messages
             WHERE user_id = ?1 AND session_id = ?2 AND role = 'user'",
            params![user_id, session_id],
            |row| row.get(0),
        )?;
        Ok(count)
    })
    .await
}

/// Whether any handoff-flagged entry exists at or after `cutoff`.
pub async fn has_recent_flagged(
    db: &Database,
    user_id: &str,
    cutoff: DateTime<Utc>,
) -> Result<bool, ComandaError> {
    let user_id = user_id.to_string();
    let cutoff = timestamp(cutoff);
    db.call(move |conn| {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(
                 SELECT 1 FROM messages
                 WHERE user_id = ?1 AND handoff = 1 AND created_at >= ?2
             )",
            params![user_id, cutoff],
            |row| row.get(0),
        )?;
        Ok(exists)
    })
    .await
}
