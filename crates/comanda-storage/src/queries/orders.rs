// SPDX-FileCopyrightText: 2026 Comanda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order persistence: atomic duplicate-check-then-insert.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use comanda_core::ComandaError;

use crate::database::{timestamp, Database};
use crate::models::{CommitOutcome, NewOrder, NewOrderItem, Order, OrderItem};

fn row_to_order(row: &rusqlite::Row<'_>) -> Result<Order, rusqlite::Error> {
    Ok(Order {
        id: row.get(0)?,
        user_id: row.get(1)?,
        location_id: row.get(2)?,
        status: row.get(3)?,
        total_amount: row.get(4)?,
        payment_method: row.get(5)?,
        fulfillment: row.get(6)?,
        delivery_address: row.get(7)?,
        delivery_time: row.get(8)?,
        notes: row.get(9)?,
        channel: row.get(10)?,
        idempotency_key: row.get(11)?,
        created_at: row.get(12)?,
    })
}

/// Commit an order with its items inside one transaction.
///
/// The duplicate probe (same user, same channel, same total at or after
/// `duplicate_cutoff`) and the inserts run under the same transaction on
/// the single writer thread, so two concurrent identical submissions can
/// never both insert.
pub async fn commit(
    db: &Database,
    order: &NewOrder,
    items: &[NewOrderItem],
    duplicate_cutoff: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<CommitOutcome, ComandaError> {
    let order = order.clone();
    let items = items.to_vec();
    let cutoff = timestamp(duplicate_cutoff);
    let created_at = timestamp(now);
    db.call(move |conn| {
        let tx = conn.transaction()?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT id FROM orders
                 WHERE user_id = ?1 AND channel = ?2 AND total_amount = ?3
                   AND created_at >= ?4
                 ORDER BY created_at DESC LIMIT 1",
                params![order.user_id, order.channel, order.total_amount, cutoff],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(order_id) = existing {
            tx.commit()?;
            return Ok(CommitOutcome::Duplicate(order_id));
        }

        let order_id = uuid::Uuid::new_v4().to_string();
        tx.execute(
            "INSERT INTO orders (id, user_id, location_id, status, total_amount,
                                 payment_method, fulfillment, delivery_address,
                                 delivery_time, notes, channel, idempotency_key, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                order_id,
                order.user_id,
                order.location_id,
                order.status,
                order.total_amount,
                order.payment_method,
                order.fulfillment.to_string(),
                order.delivery_address,
                order.delivery_time,
                order.notes,
                order.channel,
                order.idempotency_key,
                created_at,
            ],
        )?;

        for item in &items {
            tx.execute(
                "INSERT INTO order_items (id, order_id, product_id, product_name,
                                          quantity, unit_price, subtotal)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    uuid::Uuid::new_v4().to_string(),
                    order_id,
                    item.product_id,
                    item.product_name,
                    item.quantity,
                    item.unit_price,
                    item.subtotal,
                ],
            )?;
        }

        tx.commit()?;
        Ok(CommitOutcome::Committed(order_id))
    })
    .await
}

/// Fetch an order row by id.
pub async fn get_order(db: &Database, order_id: &str) -> Result<Option<Order>, ComandaError> {
    let order_id = order_id.to_string();
    db.call(move |conn| {
        let order = conn
            .query_row(
                "SELECT id, user_id, location_id, status, total_amount, payment_method,
                        fulfillment, delivery_address, delivery_time, notes, channel,
                        idempotency_key, created_at
                 FROM orders WHERE id = ?1",
                params![order_id],
                row_to_order,
            )
            .optional()?;
        Ok(order)
    })
    .await
}

/// Fetch the line items of an order.
pub async fn order_items(db: &Database, order_id: &str) -> Result<Vec<OrderItem>, ComandaError> {
    let order_id = order_id.to_string();
    db.call(move |conn| {
        let mut stmt = conn.prepare(
            "SELECT id, order_id, product_id, product_name, quantity, unit_price, subtotal
             FROM order_items WHERE order_id = ?1",
        )?;
        let rows = stmt.query_map(params![order_id], |row| {
            Ok(OrderItem {
                id: row.get(0)?,
                order_id: row.get(1)?,
                product_id: row.get(2)?,
                product_name: row.get(3)?,
                quantity: row.get(4)?,
                unit_price: row.get(5)?,
                subtotal: row.get(6)?,
            })
        })?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{catalog, users};
    use comanda_core::types::{Fulfillment, Location, Product};
    use std::time::Duration;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, String, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("orders.db");
        let db = Database::open(db_path.to_str().unwrap(), true, Duration::from_secs(5))
            .await
            .unwrap();

        let (user, _) = users::get_or_create(&db, "+54911", "whatsapp", at("10:00:00"))
            .await
            .unwrap();
        catalog::insert_product(
            &db,
            &Product {
                id: "p1".to_string(),
                name: "California Roll".to_string(),
                description: None,
                base_price: 1200,
                is_combo: false,
            },
            true,
        )
        .await
        .unwrap();
        catalog::insert_location(
            &db,
            &Location {
                id: "l1".to_string(),
                name: "Vicente Lopez".to_string(),
                address: None,
                phone: None,
            },
            true,
        )
        .await
        .unwrap();

        (db, user.id, dir)
    }

    fn at(hms: &str) -> DateTime<Utc> {
        format!("2026-02-01T{hms}Z").parse().unwrap()
    }

    fn make_order(user_id: &str, total: i64) -> NewOrder {
        NewOrder {
            user_id: user_id.to_string(),
            location_id: "l1".to_string(),
            status: "pendiente".to_string(),
            total_amount: total,
            payment_method: "efectivo".to_string(),
            fulfillment: Fulfillment::Pickup,
            delivery_address: None,
            delivery_time: "immediate".to_string(),
            notes: String::new(),
            channel: "whatsapp".to_string(),
            idempotency_key: format!("{user_id}:whatsapp:{total}:0"),
        }
    }

    fn make_items() -> Vec<NewOrderItem> {
        vec![NewOrderItem {
            product_id: "p1".to_string(),
            product_name: "California Roll".to_string(),
            quantity: 2,
            unit_price: 1200,
            subtotal: 2400,
        }]
    }

    #[tokio::test]
    async fn commit_inserts_order_and_items() {
        let (db, user_id, _dir) = setup_db().await;

        let outcome = commit(
            &db,
            &make_order(&user_id, 2400),
            &make_items(),
            at("09:55:00"),
            at("10:00:00"),
        )
        .await
        .unwrap();

        let CommitOutcome::Committed(order_id) = outcome else {
            panic!("expected Committed, got {outcome:?}");
        };

        let order = get_order(&db, &order_id).await.unwrap().unwrap();
        assert_eq!(order.status, "pendiente");
        assert_eq!(order.total_amount, 2400);
        assert_eq!(order.fulfillment, "pickup");

        let items = order_items(&db, &order_id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].subtotal, 2400);
        assert_eq!(
            order.total_amount,
            items.iter().map(|i| i.subtotal).sum::<i64>()
        );

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn identical_submission_within_window_is_duplicate() {
        let (db, user_id, _dir) = setup_db().await;

        let first = commit(
            &db,
            &make_order(&user_id, 2400),
            &make_items(),
            at("09:55:00"),
            at("10:00:00"),
        )
        .await
        .unwrap();
        let CommitOutcome::Committed(first_id) = first else {
            panic!("expected Committed");
        };

        let second = commit(
            &db,
            &make_order(&user_id, 2400),
            &make_items(),
            at("09:58:00"),
            at("10:03:00"),
        )
        .await
        .unwrap();
        assert_eq!(second, CommitOutcome::Duplicate(first_id.clone()));

        // Exactly one order row exists.
        let count: i64 = db
            .call(|conn| {
                let n = conn.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))?;
                Ok(n)
            })
            .await
            .unwrap();
        assert_eq!(count, 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn same_total_outside_window_commits_again() {
        let (db, user_id, _dir) = setup_db().await;

        commit(
            &db,
            &make_order(&user_id, 2400),
            &make_items(),
            at("09:55:00"),
            at("10:00:00"),
        )
        .await
        .unwrap();

        // Cutoff past the first order's timestamp: not a duplicate anymore.
        let outcome = commit(
            &db,
            &make_order(&user_id, 2400),
            &make_items(),
            at("10:01:00"),
            at("10:06:00"),
        )
        .await
        .unwrap();
        assert!(matches!(outcome, CommitOutcome::Committed(_)));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn different_total_within_window_is_not_duplicate() {
        let (db, user_id, _dir) = setup_db().await;

        commit(
            &db,
            &make_order(&user_id, 2400),
            &make_items(),
            at("09:55:00"),
            at("10:00:00"),
        )
        .await
        .unwrap();

        let outcome = commit(
            &db,
            &make_order(&user_id, 3600),
            &make_items(),
            at("09:58:00"),
            at("10:01:00"),
        )
        .await
        .unwrap();
        assert!(matches!(outcome, CommitOutcome::Committed(_)));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn delivery_address_feeds_last_delivery_address() {
        let (db, user_id, _dir) = setup_db().await;

        let mut order = make_order(&user_id, 2400);
        order.fulfillment = Fulfillment::Delivery;
        order.delivery_address = Some("Av. Maipu 1234".to_string());
        commit(&db, &order, &make_items(), at("09:55:00"), at("10:00:00"))
            .await
            .unwrap();

        let address = users::last_delivery_address(&db, &user_id).await.unwrap();
        assert_eq!(address.as_deref(), Some("Av. Maipu 1234"));

        db.close().await.unwrap();
    }
}
