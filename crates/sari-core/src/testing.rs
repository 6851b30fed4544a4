//! Fixtures shared by the unit tests in this crate.

use chrono::{DateTime, TimeZone, Utc};

use crate::ledger::{Ledger, StoreDocument};
use crate::money::Money;
use crate::types::{Product, ProductId, Sale, SaleId, Settings};

/// Noon UTC on the given day.
pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

/// A product costing ₱10.00 and selling for ₱15.00.
pub fn product(id: ProductId, name: &str, quantity: i64) -> Product {
    Product {
        id,
        name: name.to_string(),
        category: "Snacks".to_string(),
        barcode: None,
        quantity,
        original_price: Money::from_cents(1000),
        selling_price: Money::from_cents(1500),
        total_sold: 0,
        created_date: None,
    }
}

/// A sale of `quantity` units at ₱15.00 with a ₱10.00 cost snapshot.
pub fn sale(id: SaleId, product_id: ProductId, quantity: i64, date: DateTime<Utc>) -> Sale {
    let unit_price = Money::from_cents(1500);
    Sale {
        id,
        date,
        product_id,
        product_name: format!("Product {product_id}"),
        quantity,
        unit_price,
        original_price: Money::from_cents(1000),
        total_amount: unit_price * quantity,
    }
}

pub fn ledger_with(products: Vec<Product>, sales: Vec<Sale>) -> Ledger {
    Ledger::from_document(StoreDocument {
        products,
        sales,
        ..StoreDocument::default()
    })
}

pub fn ledger_with_settings(
    products: Vec<Product>,
    sales: Vec<Sale>,
    settings: Settings,
) -> Ledger {
    Ledger::from_document(StoreDocument {
        products,
        sales,
        settings,
        ..StoreDocument::default()
    })
}
