// SPDX-FileCopyrightText: 2026 Comanda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User registration and profile operations.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use comanda_core::ComandaError;

use crate::database::{timestamp, Database};
use crate::models::User;

fn row_to_user(row: &rusqlite::Row<'_>) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: row.get(0)?,
        phone: row.get(1)?,
        channel: row.get(2)?,
        display_name: row.get(3)?,
        email: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Look up a user by (phone, channel), creating them if absent.
///
/// Runs as one transaction on the writer thread so concurrent first
/// messages from the same user cannot race two inserts. Returns the user
/// plus whether they were just created.
pub async fn get_or_create(
    db: &Database,
    phone: &str,
    channel: &str,
    now: DateTime<Utc>,
) -> Result<(User, bool), ComandaError> {
    let phone = phone.to_string();
    let channel = channel.to_string();
    let created_at = timestamp(now);
    db.call(move |conn| {
        let tx = conn.transaction()?;
        let existing = tx
            .query_row(
                "SELECT id, phone, channel, display_name, email, created_at
                 FROM users WHERE phone = ?1 AND channel = ?2",
                params![phone, channel],
                row_to_user,
            )
            .optional()?;
        let result = match existing {
            Some(user) => (user, false),
            None => {
                let user = User {
                    id: uuid::Uuid::new_v4().to_string(),
                    phone,
                    channel,
                    display_name: None,
                    email: None,
                    created_at,
                };
                tx.execute(
                    "INSERT INTO users (id, phone, channel, display_name, email, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        user.id,
                        user.phone,
                        user.channel,
                        user.display_name,
                        user.email,
                        user.created_at,
                    ],
                )?;
                (user, true)
            }
        };
        tx.commit()?;
        Ok(result)
    })
    .await
}

/// Apply an explicit profile update. `None` fields are left untouched.
/// Returns whether a row was updated.
pub async fn update_profile(
    db: &Database,
    phone: &str,
    channel: &str,
    display_name: Option<&str>,
    email: Option<&str>,
) -> Result<bool, ComandaError> {
    let phone = phone.to_string();
    let channel = channel.to_string();
    let display_name = display_name.map(str::to_string);
    let email = email.map(str::to_string);
    db.call(move |conn| {
        let updated = conn.execute(
            "UPDATE users
             SET display_name = COALESCE(?3, display_name),
                 email = COALESCE(?4, email)
             WHERE phone = ?1 AND channel = ?2",
            params![phone, channel, display_name, email],
        )?;
        Ok(updated > 0)
    })
    .await
}

/// Most recent non-null delivery address across the user's orders.
pub async fn last_delivery_address(
    db: &Database,
    user_id: &str,
) -> Result<Option<String>, ComandaError> {
    let user_id = user_id.to_string();
    db.call(move |conn| {
        let address = conn
            .query_row(
                "SELECT delivery_address FROM orders
                 WHERE user_id = ?1 AND delivery_address IS NOT NULL
                 ORDER BY created_at DESC LIMIT 1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(address)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("users.db");
        let db = Database::open(db_path.to_str().unwrap(), true, Duration::from_secs(5))
            .await
            .unwrap();
        (db, dir)
    }

    fn now() -> DateTime<Utc> {
        "2026-02-01T10:00:00Z".parse().unwrap()
    }

    #[tokio::test]
    async fn first_contact_creates_user() {
        let (db, _dir) = setup_db().await;

        let (user, is_new) = get_or_create(&db, "+5491112223334", "whatsapp", now())
            .await
            .unwrap();
        assert!(is_new);
        assert_eq!(user.phone, "+5491112223334");
        assert_eq!(user.channel, "whatsapp");
        assert!(user.display_name.is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn second_contact_reuses_user() {
        let (db, _dir) = setup_db().await;

        let (first, _) = get_or_create(&db, "+5491112223334", "whatsapp", now())
            .await
            .unwrap();
        let (second, is_new) = get_or_create(&db, "+5491112223334", "whatsapp", now())
            .await
            .unwrap();
        assert!(!is_new);
        assert_eq!(first.id, second.id);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn same_phone_different_channel_is_distinct() {
        let (db, _dir) = setup_db().await;

        let (wa, _) = get_or_create(&db, "+5491112223334", "whatsapp", now())
            .await
            .unwrap();
        let (tg, is_new) = get_or_create(&db, "+5491112223334", "telegram", now())
            .await
            .unwrap();
        assert!(is_new);
        assert_ne!(wa.id, tg.id);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_profile_only_touches_given_fields() {
        let (db, _dir) = setup_db().await;

        get_or_create(&db, "+54911", "whatsapp", now()).await.unwrap();
        let updated = update_profile(&db, "+54911", "whatsapp", Some("Ana"), None)
            .await
            .unwrap();
        assert!(updated);

        update_profile(&db, "+54911", "whatsapp", None, Some("ana@example.com"))
            .await
            .unwrap();

        let (user, _) = get_or_create(&db, "+54911", "whatsapp", now()).await.unwrap();
        assert_eq!(user.display_name.as_deref(), Some("Ana"));
        assert_eq!(user.email.as_deref(), Some("ana@example.com"));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_profile_for_unknown_user_is_noop() {
        let (db, _dir) = setup_db().await;

        let updated = update_profile(&db, "+000", "whatsapp", Some("Nadie"), None)
            .await
            .unwrap();
        assert!(!updated);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn last_delivery_address_empty_without_orders() {
        let (db, _dir) = setup_db().await;

        let (user, _) = get_or_create(&db, "+54911", "whatsapp", now()).await.unwrap();
        let address = last_delivery_address(&db, &user.id).await.unwrap();
        assert!(address.is_none());

        db.close().await.unwrap();
    }
}
