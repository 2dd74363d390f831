// SPDX-FileCopyrightText: 2026 Comanda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spanish confirmation text for committed orders.

use comanda_core::types::{Fulfillment, NewOrderItem};

/// Format an integer amount with `.` as thousands separator, no decimals.
/// 2400 renders as "2.400".
pub fn format_amount(amount: i64) -> String {
    let negative = amount < 0;
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Build the user-facing confirmation message for a committed order.
pub fn build_confirmation(
    items: &[NewOrderItem],
    total: i64,
    fulfillment: Fulfillment,
    delivery_address: Option<&str>,
    delivery_time: &str,
    payment_method: &str,
) -> String {
    let mut text = String::from("¡Pedido confirmado! 🎉\n\n📝 Detalles del pedido:\n");
    for item in items {
        text.push_str(&format!(
            "{}x {} - ${}\n",
            item.quantity,
            item.product_name,
            format_amount(item.subtotal)
        ));
    }
    text.push_str(&format!("\n💰 Total: ${}\n", format_amount(total)));

    match fulfillment {
        Fulfillment::Delivery => {
            text.push_str("🚗 Modo de entrega: Delivery\n");
            if let Some(address) = delivery_address {
                text.push_str(&format!("🏠 Dirección de entrega: {address}\n"));
            }
        }
        Fulfillment::Pickup => {
            text.push_str("🚗 Modo de entrega: Retiro en local\n");
        }
    }

    if delivery_time != "immediate" {
        text.push_str(&format!("⏰ Horario de entrega: {delivery_time}\n"));
    }

    let emoji = if payment_method.to_lowercase().contains("efectivo") {
        "💵"
    } else {
        "💳"
    };
    text.push_str(&format!("{emoji} Medio de pago: {payment_method}\n"));

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, quantity: i64, unit_price: i64) -> NewOrderItem {
        NewOrderItem {
            product_id: "p".to_string(),
            product_name: name.to_string(),
            quantity,
            unit_price,
            subtotal: quantity * unit_price,
        }
    }

    #[test]
    fn amounts_group_thousands_with_dots() {
        assert_eq!(format_amount(0), "0");
        assert_eq!(format_amount(950), "950");
        assert_eq!(format_amount(2400), "2.400");
        assert_eq!(format_amount(12400), "12.400");
        assert_eq!(format_amount(1234567), "1.234.567");
    }

    #[test]
    fn pickup_confirmation_mentions_retiro() {
        let items = vec![item("California Roll", 2, 1200)];
        let text = build_confirmation(
            &items,
            2400,
            Fulfillment::Pickup,
            None,
            "immediate",
            "efectivo",
        );

        assert!(text.contains("¡Pedido confirmado!"));
        assert!(text.contains("2x California Roll - $2.400"));
        assert!(text.contains("Total: $2.400"));
        assert!(text.contains("Retiro en local"));
        assert!(!text.contains("Dirección de entrega"));
        assert!(!text.contains("Horario de entrega"));
        assert!(text.contains("💵 Medio de pago: efectivo"));
    }

    #[test]
    fn delivery_confirmation_includes_address_and_fee_line() {
        let items = vec![item("Dragon Roll", 1, 2200), item("Delivery", 1, 1500)];
        let text = build_confirmation(
            &items,
            3700,
            Fulfillment::Delivery,
            Some("Av. Maipu 1234"),
            "immediate",
            "tarjeta",
        );

        assert!(text.contains("1x Delivery - $1.500"));
        assert!(text.contains("Total: $3.700"));
        assert!(text.contains("Modo de entrega: Delivery"));
        assert!(text.contains("Dirección de entrega: Av. Maipu 1234"));
        assert!(text.contains("💳 Medio de pago: tarjeta"));
    }

    #[test]
    fn scheduled_delivery_time_is_shown() {
        let items = vec![item("California Roll", 1, 1200)];
        let text = build_confirmation(
            &items,
            1200,
            Fulfillment::Pickup,
            None,
            "21:30",
            "efectivo",
        );
        assert!(text.contains("Horario de entrega: 21:30"));
    }
}
