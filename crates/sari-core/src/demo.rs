//! Sample ledger used when no persisted data can be reached.
//!
//! The data is deterministic for a given `now`: ids and dates are offsets
//! from it, so repeated calls produce equal ledgers.

use chrono::{DateTime, Duration, Utc};

use crate::ledger::{IdAllocator, Ledger, StoreDocument};
use crate::money::Money;
use crate::types::{Product, Sale, Settings};

/// (name, category, quantity, cost in centavos, price in centavos)
const DEMO_PRODUCTS: &[(&str, &str, i64, i64, i64)] = &[
    ("Lucky Me Pancit Canton", "Noodles", 48, 1250, 1600),
    ("Coke Mismo 300ml", "Beverages", 24, 1700, 2000),
    ("Bear Brand Swak 33g", "Dairy", 3, 1050, 1300),
    ("Skyflakes Crackers", "Snacks", 30, 700, 900),
    ("Century Tuna 155g", "Canned Goods", 0, 3200, 3800),
    ("Safeguard Bar Soap", "Toiletries", 12, 3100, 3700),
    ("Kopiko Brown Coffee", "Beverages", 2, 900, 1200),
];

/// (product index, quantity, days ago)
const DEMO_SALES: &[(usize, i64, i64)] = &[
    (0, 6, 1),
    (1, 4, 1),
    (3, 5, 2),
    (0, 3, 3),
    (6, 2, 3),
    (2, 2, 6),
    (5, 1, 9),
    (4, 3, 12),
    (1, 6, 15),
    (0, 8, 21),
];

/// Builds the sample ledger.
///
/// Sales are recorded against the listed quantities, so `totalSold` and
/// stock already agree with the sales history.
pub fn demo_ledger(now: DateTime<Utc>) -> Ledger {
    let mut ids = IdAllocator::new(0, now - Duration::days(60));

    let mut products: Vec<Product> = DEMO_PRODUCTS
        .iter()
        .map(|&(name, category, quantity, cost, price)| Product {
            id: ids.next_id(),
            name: name.to_string(),
            category: category.to_string(),
            barcode: None,
            quantity,
            original_price: Money::from_cents(cost),
            selling_price: Money::from_cents(price),
            total_sold: 0,
            created_date: Some(now - Duration::days(60)),
        })
        .collect();

    let mut sales = Vec::with_capacity(DEMO_SALES.len());
    for &(index, quantity, days_ago) in DEMO_SALES {
        let product = &mut products[index];
        product.total_sold += quantity;
        sales.push(Sale {
            id: ids.next_id(),
            date: now - Duration::days(days_ago),
            product_id: product.id,
            product_name: product.name.clone(),
            quantity,
            unit_price: product.selling_price,
            original_price: product.original_price,
            total_amount: product.selling_price * quantity,
        });
    }

    Ledger::from_document(StoreDocument {
        products,
        sales,
        settings: Settings {
            business_name: "Demo Sari-Sari Store".to_string(),
            ..Settings::default()
        },
        ..StoreDocument::default()
    })
}
