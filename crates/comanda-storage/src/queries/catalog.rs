// SPDX-FileCopyrightText: 2026 Comanda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog reads. Products and locations are maintained by an external
//! process; this core only filters on the `active` flag.

use rusqlite::params;

use comanda_core::ComandaError;

use crate::database::Database;
use crate::models::{Location, Product};

/// All active products, ordered by name.
pub async fn active_products(db: &Database) -> Result<Vec<Product>, ComandaError> {
    db.call(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, name, description, base_price, is_combo
             FROM products WHERE active = 1 ORDER BY name ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Product {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                base_price: row.get(3)?,
                is_combo: row.get(4)?,
            })
        })?;
        let mut products = Vec::new();
        for row in rows {
            products.push(row?);
        }
        Ok(products)
    })
    .await
}

/// All active locations, ordered by name.
pub async fn active_locations(db: &Database) -> Result<Vec<Location>, ComandaError> {
    db.call(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, name, address, phone
             FROM locations WHERE active = 1 ORDER BY name ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Location {
                id: row.get(0)?,
                name: row.get(1)?,
                address: row.get(2)?,
                phone: row.get(3)?,
            })
        })?;
        let mut locations = Vec::new();
        for row in rows {
            locations.push(row?);
        }
        Ok(locations)
    })
    .await
}

/// Insert a product row. Catalog maintenance belongs to an external
/// process; this is exposed for seeding and tests.
pub async fn insert_product(
    db: &Database,
    product: &Product,
    active: bool,
) -> Result<(), ComandaError> {
    let product = product.clone();
    db.call(move |conn| {
        conn.execute(
            "INSERT INTO products (id, name, description, base_price, is_combo, active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                product.id,
                product.name,
                product.description,
                product.base_price,
                product.is_combo,
                active,
            ],
        )?;
        Ok(())
    })
    .await
}

/// Insert a location row. Exposed for seeding and tests.
pub async fn insert_location(
    db: &Database,
    location: &Location,
    active: bool,
) -> Result<(), ComandaError> {
    let location = location.clone();
    db.call(move |conn| {
        conn.execute(
            "INSERT INTO locations (id, name, address, phone, active)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                location.id,
                location.name,
                location.address,
                location.phone,
                active,
            ],
        )?;
        Ok(())
    })
    .await
}
