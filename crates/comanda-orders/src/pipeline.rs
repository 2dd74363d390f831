// SPDX-FileCopyrightText: 2026 Comanda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The order commit pipeline: validation, duplicate suppression, fee
//! augmentation, atomic persistence, and confirmation text.
//!
//! Errors never cross the [`OrderPipeline::commit`] boundary; every failure
//! mode is folded into the returned [`OrderCommitResult`].

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use comanda_config::model::OrdersConfig;
use comanda_core::types::{
    CatalogSnapshot, CommitDisposition, CommitOutcome, Fulfillment, NewOrder, NewOrderItem,
    OrderCommitResult, OrderPayload,
};
use comanda_core::{CatalogProvider, ComandaError, StorageAdapter};

use crate::confirmation;

/// Status every freshly committed order starts in.
const INITIAL_STATUS: &str = "pendiente";

/// Default delivery time when the payload omits one.
const IMMEDIATE: &str = "immediate";

/// Order commit pipeline.
pub struct OrderPipeline {
    storage: Arc<dyn StorageAdapter>,
    catalog: Arc<dyn CatalogProvider>,
    config: OrdersConfig,
}

impl OrderPipeline {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        catalog: Arc<dyn CatalogProvider>,
        config: OrdersConfig,
    ) -> Self {
        Self {
            storage,
            catalog,
            config,
        }
    }

    /// Commit an order payload on behalf of (phone, channel).
    ///
    /// Never returns an error: validation failures, unavailable catalog
    /// data, and storage failures all come back as a result with the
    /// matching disposition.
    pub async fn commit(
        &self,
        payload: &OrderPayload,
        phone: &str,
        channel: &str,
        now: DateTime<Utc>,
    ) -> OrderCommitResult {
        match self.try_commit(payload, phone, channel, now).await {
            Ok(result) => result,
            Err(ComandaError::Validation { field, message }) => {
                warn!(%field, %message, "order rejected by validation");
                failed_result(CommitDisposition::Invalid(format!("{field}: {message}")))
            }
            Err(ComandaError::ServiceUnavailable(what)) => {
                warn!(%what, "order commit unavailable");
                failed_result(CommitDisposition::Unavailable)
            }
            Err(err) => {
                warn!(error = %err, "order commit failed");
                failed_result(CommitDisposition::Failed)
            }
        }
    }

    async fn try_commit(
        &self,
        payload: &OrderPayload,
        phone: &str,
        channel: &str,
        now: DateTime<Utc>,
    ) -> Result<OrderCommitResult, ComandaError> {
        let snapshot = self
            .catalog
            .snapshot()
            .await
            .map_err(|e| ComandaError::ServiceUnavailable(format!("catalog: {e}")))?;

        let mut items = validate_items(payload, &snapshot)?;
        validate_required_fields(payload)?;

        let location = snapshot
            .find_location(&self.config.location)
            .ok_or_else(|| {
                ComandaError::ServiceUnavailable(format!(
                    "location {:?} not found among active locations",
                    self.config.location
                ))
            })?;

        // Delivery orders carry a synthetic fee line item priced from the
        // catalog, included in the persisted total.
        if payload.fulfillment == Fulfillment::Delivery {
            let fee = snapshot
                .find_product(&self.config.delivery_fee_product)
                .ok_or_else(|| {
                    ComandaError::ServiceUnavailable(format!(
                        "delivery fee product {:?} not in catalog",
                        self.config.delivery_fee_product
                    ))
                })?;
            items.push(NewOrderItem {
                product_id: fee.id.clone(),
                product_name: fee.name.clone(),
                quantity: 1,
                unit_price: fee.base_price,
                subtotal: fee.base_price,
            });
        }

        let total = items
            .iter()
            .try_fold(0_i64, |acc, i| acc.checked_add(i.subtotal))
            .ok_or_else(|| ComandaError::Validation {
                field: "items".to_string(),
                message: "order total overflows".to_string(),
            })?;

        let (user, is_new_user) = self
            .storage
            .get_or_create_user(phone, channel, now)
            .await?;

        let delivery_time = payload
            .delivery_time
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| IMMEDIATE.to_string());

        let window_secs = self.config.duplicate_window_mins as i64 * 60;
        let bucket = now.timestamp().div_euclid(window_secs);
        let idempotency_key = format!("{}:{channel}:{total}:{bucket}", user.id);
        let duplicate_cutoff = now - Duration::minutes(self.config.duplicate_window_mins as i64);

        let order = NewOrder {
            user_id: user.id.clone(),
            location_id: location.id.clone(),
            status: INITIAL_STATUS.to_string(),
            total_amount: total,
            payment_method: payload.payment_method.clone(),
            fulfillment: payload.fulfillment,
            delivery_address: payload.delivery_address.clone(),
            delivery_time: delivery_time.clone(),
            notes: payload.notes.clone().unwrap_or_default(),
            channel: channel.to_string(),
            idempotency_key,
        };

        match self
            .storage
            .commit_order(&order, &items, duplicate_cutoff, now)
            .await?
        {
            CommitOutcome::Committed(order_id) => {
                debug!(%order_id, total, "order committed");
                let confirmation_text = confirmation::build_confirmation(
                    &items,
                    total,
                    payload.fulfillment,
                    payload.delivery_address.as_deref(),
                    &delivery_time,
                    &payload.payment_method,
                );
                Ok(OrderCommitResult {
                    success: true,
                    is_new_user,
                    confirmation_text,
                    order_id: Some(order_id),
                    disposition: CommitDisposition::Committed,
                })
            }
            CommitOutcome::Duplicate(order_id) => {
                debug!(%order_id, total, "duplicate order suppressed");
                Ok(OrderCommitResult {
                    success: false,
                    is_new_user,
                    confirmation_text: String::new(),
                    order_id: Some(order_id),
                    disposition: CommitDisposition::Duplicate,
                })
            }
        }
    }
}

/// Validate every line item against the catalog snapshot.
///
/// The whole order fails on the first offending item; nothing is silently
/// corrected.
fn validate_items(
    payload: &OrderPayload,
    snapshot: &CatalogSnapshot,
) -> Result<Vec<NewOrderItem>, ComandaError> {
    if payload.items.is_empty() {
        return Err(ComandaError::Validation {
            field: "items".to_string(),
            message: "order has no items".to_string(),
        });
    }

    let mut items = Vec::with_capacity(payload.items.len());
    for input in &payload.items {
        let product = snapshot.find_product(&input.product_name).ok_or_else(|| {
            ComandaError::Validation {
                field: input.product_name.clone(),
                message: "unknown or inactive product".to_string(),
            }
        })?;
        if input.quantity <= 0 {
            return Err(ComandaError::Validation {
                field: input.product_name.clone(),
                message: format!("quantity must be positive, got {}", input.quantity),
            });
        }
        if input.unit_price != product.base_price {
            return Err(ComandaError::Validation {
                field: input.product_name.clone(),
                message: format!(
                    "price mismatch: payload says {}, catalog says {}",
                    input.unit_price, product.base_price
                ),
            });
        }
        let expected = input
            .unit_price
            .checked_mul(input.quantity)
            .ok_or_else(|| ComandaError::Validation {
                field: input.product_name.clone(),
                message: format!("subtotal overflows: {} * {}", input.unit_price, input.quantity),
            })?;
        if input.subtotal != expected {
            return Err(ComandaError::Validation {
                field: input.product_name.clone(),
                message: format!(
                    "subtotal mismatch: {} != {} * {}",
                    input.subtotal, input.unit_price, input.quantity
                ),
            });
        }
        items.push(NewOrderItem {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            quantity: input.quantity,
            unit_price: input.unit_price,
            subtotal: input.subtotal,
        });
    }
    Ok(items)
}

/// Validate presence rules: the notes key is mandatory (empty string is
/// fine), and a delivery address is required exactly when fulfillment is
/// delivery.
fn validate_required_fields(payload: &OrderPayload) -> Result<(), ComandaError> {
    if payload.notes.is_none() {
        return Err(ComandaError::Validation {
            field: "notes".to_string(),
            message: "notes key is required (empty string is accepted)".to_string(),
        });
    }
    let has_address = payload
        .delivery_address
        .as_deref()
        .is_some_and(|a| !a.trim().is_empty());
    if payload.fulfillment == Fulfillment::Delivery && !has_address {
        return Err(ComandaError::Validation {
            field: "delivery_address".to_string(),
            message: "required for delivery orders".to_string(),
        });
    }
    Ok(())
}

fn failed_result(disposition: CommitDisposition) -> OrderCommitResult {
    OrderCommitResult {
        success: false,
        is_new_user: false,
        confirmation_text: String::new(),
        order_id: None,
        disposition,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comanda_core::types::{Location, OrderItemInput, Product};

    fn snapshot() -> CatalogSnapshot {
        CatalogSnapshot {
            products: vec![
                Product {
                    id: "p1".to_string(),
                    name: "California Roll".to_string(),
                    description: None,
                    base_price: 1200,
                    is_combo: false,
                },
                Product {
                    id: "pd".to_string(),
                    name: "Delivery".to_string(),
                    description: None,
                    base_price: 1500,
                    is_combo: false,
                },
            ],
            locations: vec![Location {
                id: "l1".to_string(),
                name: "Vicente Lopez".to_string(),
                address: None,
                phone: None,
            }],
            loaded_at: Utc::now(),
        }
    }

    fn payload(items: Vec<OrderItemInput>) -> OrderPayload {
        OrderPayload {
            items,
            fulfillment: Fulfillment::Pickup,
            payment_method: "efectivo".to_string(),
            notes: Some(String::new()),
            delivery_address: None,
            delivery_time: None,
        }
    }

    fn roll_input(quantity: i64, unit_price: i64) -> OrderItemInput {
        OrderItemInput {
            product_name: "California Roll".to_string(),
            quantity,
            unit_price,
            subtotal: quantity * unit_price,
        }
    }

    #[test]
    fn valid_items_pass_validation() {
        let items = validate_items(&payload(vec![roll_input(2, 1200)]), &snapshot()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, "p1");
        assert_eq!(items[0].subtotal, 2400);
    }

    #[test]
    fn unknown_product_names_the_offender() {
        let mut input = roll_input(1, 1200);
        input.product_name = "Unicorn Roll".to_string();
        let err = validate_items(&payload(vec![input]), &snapshot()).unwrap_err();
        let ComandaError::Validation { field, .. } = err else {
            panic!("expected Validation, got {err:?}");
        };
        assert_eq!(field, "Unicorn Roll");
    }

    #[test]
    fn price_mismatch_names_the_product() {
        let err = validate_items(&payload(vec![roll_input(2, 999)]), &snapshot()).unwrap_err();
        let ComandaError::Validation { field, message } = err else {
            panic!("expected Validation");
        };
        assert_eq!(field, "California Roll");
        assert!(message.contains("price mismatch"));
    }

    #[test]
    fn subtotal_mismatch_is_rejected() {
        let mut input = roll_input(2, 1200);
        input.subtotal = 2500;
        let err = validate_items(&payload(vec![input]), &snapshot()).unwrap_err();
        assert!(matches!(err, ComandaError::Validation { .. }));
    }

    #[test]
    fn overflowing_subtotal_is_rejected() {
        let input = OrderItemInput {
            product_name: "California Roll".to_string(),
            quantity: i64::MAX,
            unit_price: 1200,
            subtotal: i64::MAX,
        };
        let err = validate_items(&payload(vec![input]), &snapshot()).unwrap_err();
        let ComandaError::Validation { field, message } = err else {
            panic!("expected Validation");
        };
        assert_eq!(field, "California Roll");
        assert!(message.contains("overflows"));
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let err = validate_items(&payload(vec![roll_input(0, 1200)]), &snapshot()).unwrap_err();
        assert!(matches!(err, ComandaError::Validation { .. }));
    }

    #[test]
    fn empty_order_is_rejected() {
        let err = validate_items(&payload(vec![]), &snapshot()).unwrap_err();
        let ComandaError::Validation { field, .. } = err else {
            panic!("expected Validation");
        };
        assert_eq!(field, "items");
    }

    #[test]
    fn missing_notes_key_is_rejected() {
        let mut p = payload(vec![roll_input(1, 1200)]);
        p.notes = None;
        let err = validate_required_fields(&p).unwrap_err();
        let ComandaError::Validation { field, .. } = err else {
            panic!("expected Validation");
        };
        assert_eq!(field, "notes");
    }

    #[test]
    fn delivery_without_address_is_rejected() {
        let mut p = payload(vec![roll_input(1, 1200)]);
        p.fulfillment = Fulfillment::Delivery;
        let err = validate_required_fields(&p).unwrap_err();
        let ComandaError::Validation { field, .. } = err else {
            panic!("expected Validation");
        };
        assert_eq!(field, "delivery_address");
    }

    #[test]
    fn pickup_without_address_is_fine() {
        let p = payload(vec![roll_input(1, 1200)]);
        validate_required_fields(&p).unwrap();
    }
}
