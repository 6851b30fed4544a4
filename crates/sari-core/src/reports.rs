//! # Reports
//!
//! Read-only aggregates derived from a [`Ledger`]. Nothing here is stored;
//! every call recomputes from the current collections.
//!
//! Sale-based figures use the price snapshots on each sale, so deleting or
//! repricing a product never rewrites past revenue or profit.
//!
//! ## Month Boundaries
//! ```text
//! MonthKey "2024-02"
//!      │
//!      ├── start  2024-02-01T00:00:00Z   (inclusive)
//!      └── end    2024-03-01T00:00:00Z   (exclusive)
//!
//! daily breakdown: one row per calendar day, zero-filled
//! growth:          against MonthKey::previous()  ("2024-01")
//! ```
//!
//! All dates are bucketed in UTC.

use chrono::{
    DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
    Weekday,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::compat;
use crate::error::ValidationError;
use crate::ledger::{Ledger, StoreDocument};
use crate::money::{margin_percent, Money};
use crate::types::{
    PriceHistoryEntry, Product, ProductId, RestockHistoryEntry, Sale, StockStatus,
    DEFAULT_CATEGORY,
};

/// Products listed on the summary.
pub const SUMMARY_TOP_PRODUCTS: usize = 5;

/// Products listed on the monthly report.
pub const MONTHLY_TOP_PRODUCTS: usize = 10;

/// Version tag written into backups.
pub const SYSTEM_VERSION: &str = "Mini Store Management v2.0";

// =============================================================================
// Summary
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct TopProduct {
    pub product_id: ProductId,
    pub name: String,
    pub total_sold: i64,
    /// Revenue from this product's recorded sales.
    pub revenue: Money,
}

/// Store-wide totals.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_revenue: Money,
    pub total_profit: Money,
    pub products_in_stock: usize,
    pub transactions: usize,
    pub top_products: Vec<TopProduct>,
}

pub fn summary(ledger: &Ledger) -> Summary {
    let mut revenue_by_product: HashMap<ProductId, Money> = HashMap::new();
    for sale in ledger.sales() {
        *revenue_by_product.entry(sale.product_id).or_default() += sale.total_amount;
    }

    let mut ranked: Vec<&Product> = ledger
        .products()
        .iter()
        .filter(|p| p.total_sold > 0)
        .collect();
    ranked.sort_by(|a, b| {
        b.total_sold
            .cmp(&a.total_sold)
            .then_with(|| a.name.cmp(&b.name))
    });

    Summary {
        total_revenue: ledger.sales().iter().map(|s| s.total_amount).sum(),
        total_profit: ledger.sales().iter().map(Sale::profit).sum(),
        products_in_stock: ledger.products().iter().filter(|p| p.quantity > 0).count(),
        transactions: ledger.sales().len(),
        top_products: ranked
            .into_iter()
            .take(SUMMARY_TOP_PRODUCTS)
            .map(|p| TopProduct {
                product_id: p.id,
                name: p.name.clone(),
                total_sold: p.total_sold,
                revenue: revenue_by_product.get(&p.id).copied().unwrap_or_default(),
            })
            .collect(),
    }
}

// =============================================================================
// Stock Alerts
// =============================================================================

/// Products needing attention.
///
/// ```text
/// out_of_stock   q == 0
/// low            0 < q ≤ threshold
/// critical       0 < q ≤ 2
/// warning        2 < q ≤ threshold
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockAlerts {
    pub low: Vec<Product>,
    pub critical: Vec<Product>,
    pub warning: Vec<Product>,
    pub out_of_stock: Vec<Product>,
}

impl StockAlerts {
    pub fn is_empty(&self) -> bool {
        self.low.is_empty() && self.critical.is_empty() && self.out_of_stock.is_empty()
    }
}

pub fn stock_alerts(ledger: &Ledger) -> StockAlerts {
    let threshold = ledger.low_stock_threshold();
    let mut alerts = StockAlerts::default();

    for product in ledger.products() {
        let q = product.quantity;
        if q <= 0 {
            alerts.out_of_stock.push(product.clone());
            continue;
        }
        if q <= threshold {
            alerts.low.push(product.clone());
        }
        if q <= 2 {
            alerts.critical.push(product.clone());
        } else if q <= threshold {
            alerts.warning.push(product.clone());
        }
    }
    alerts
}

/// One line of the stock alert table.
#[derive(Debug, Clone, PartialEq)]
pub struct StockAlertRow {
    pub status: StockStatus,
    pub product_name: String,
    pub quantity: i64,
    pub action: &'static str,
}

/// Alert rows for every product that is out, critical or low.
pub fn stock_alert_rows(ledger: &Ledger) -> Vec<StockAlertRow> {
    let threshold = ledger.low_stock_threshold();
    ledger
        .products()
        .iter()
        .filter_map(|p| {
            let status = p.stock_status(threshold);
            let action = match status {
                StockStatus::OutOfStock => "Immediate Restocking Required",
                StockStatus::Critical => "Urgent Restocking Needed",
                StockStatus::LowStock => "Schedule Restocking",
                StockStatus::InStock => return None,
            };
            Some(StockAlertRow {
                status,
                product_name: p.name.clone(),
                quantity: p.quantity,
                action,
            })
        })
        .collect()
}

// =============================================================================
// Month Keys
// =============================================================================

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    first: NaiveDate,
}

impl MonthKey {
    /// `None` when the month is not 1..=12 or the year is out of range.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| MonthKey { first })
    }

    /// The month containing `at`.
    pub fn of(at: DateTime<Utc>) -> Self {
        let date = at.date_naive();
        MonthKey {
            first: date - Duration::days(i64::from(date.day0())),
        }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    /// The month before this one. January wraps to December of the prior year.
    pub fn previous(&self) -> Self {
        MonthKey {
            first: self.first.checked_sub_months(Months::new(1)).unwrap_or(self.first),
        }
    }

    pub fn next(&self) -> Self {
        MonthKey {
            first: self.first.checked_add_months(Months::new(1)).unwrap_or(self.first),
        }
    }

    /// Midnight UTC on the first day.
    pub fn start(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&NaiveDateTime::new(self.first, NaiveTime::default()))
    }

    /// Exclusive upper bound: the start of the next month.
    pub fn end(&self) -> DateTime<Utc> {
        self.next().start()
    }

    pub fn days(&self) -> u32 {
        (self.next().first - self.first).num_days() as u32
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        MonthKey::of(at) == *self
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for MonthKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidFormat {
            field: "month".to_string(),
            reason: format!("expected YYYY-MM, got '{s}'"),
        };
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        MonthKey::new(year, month).ok_or_else(invalid)
    }
}

/// Months that have sales, plus the current month, newest first.
pub fn available_months(ledger: &Ledger, now: DateTime<Utc>) -> Vec<MonthKey> {
    let mut months: BTreeSet<MonthKey> =
        ledger.sales().iter().map(|s| MonthKey::of(s.date)).collect();
    months.insert(MonthKey::of(now));
    months.into_iter().rev().collect()
}

// =============================================================================
// Monthly Report
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Totals {
    revenue: Money,
    profit: Money,
    items_sold: i64,
    transactions: usize,
}

impl Totals {
    fn add(&mut self, sale: &Sale) {
        self.revenue += sale.total_amount;
        self.profit += sale.profit();
        self.items_sold += sale.quantity;
        self.transactions += 1;
    }

    fn of<'a>(sales: impl IntoIterator<Item = &'a Sale>) -> Self {
        let mut totals = Totals::default();
        for sale in sales {
            totals.add(sale);
        }
        totals
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyBreakdown {
    pub date: NaiveDate,
    pub revenue: Money,
    pub profit: Money,
    pub items_sold: i64,
    pub transactions: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyTopProduct {
    pub product_id: ProductId,
    pub name: String,
    pub quantity_sold: i64,
    pub revenue: Money,
    pub profit: Money,
}

impl MonthlyTopProduct {
    pub fn profit_margin(&self) -> f64 {
        self.profit.ratio(self.revenue).map_or(0.0, |r| r * 100.0)
    }
}

/// Month-over-month change in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Growth {
    pub revenue: f64,
    pub profit: f64,
    /// Units sold.
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyReport {
    pub month: MonthKey,
    pub revenue: Money,
    pub profit: Money,
    pub items_sold: i64,
    pub transactions: usize,
    pub average_transaction: Money,
    /// Profit over revenue in percent; 0 without revenue.
    pub profit_margin: f64,
    pub daily: Vec<DailyBreakdown>,
    pub top_products: Vec<MonthlyTopProduct>,
    pub growth: Growth,
}

fn month_sales(ledger: &Ledger, month: MonthKey) -> impl Iterator<Item = &Sale> + '_ {
    ledger.sales().iter().filter(move |s| month.contains(s.date))
}

/// `(current - previous) / previous × 100`.
///
/// From zero, any increase counts as 100% and no change as 0%.
///
/// ## Example
/// ```rust
/// use sari_core::reports::growth_percentage;
///
/// assert_eq!(growth_percentage(200.0, 250.0), 25.0);
/// assert_eq!(growth_percentage(0.0, 80.0), 100.0);
/// assert_eq!(growth_percentage(0.0, 0.0), 0.0);
/// ```
pub fn growth_percentage(previous: f64, current: f64) -> f64 {
    if previous == 0.0 {
        if current > 0.0 {
            100.0
        } else {
            0.0
        }
    } else {
        (current - previous) / previous * 100.0
    }
}

pub fn monthly_report(ledger: &Ledger, month: MonthKey) -> MonthlyReport {
    let sales: Vec<&Sale> = month_sales(ledger, month).collect();
    let totals = Totals::of(sales.iter().copied());
    let previous = Totals::of(month_sales(ledger, month.previous()));

    let mut by_day: HashMap<NaiveDate, Totals> = HashMap::new();
    for sale in &sales {
        by_day.entry(sale.date.date_naive()).or_default().add(sale);
    }
    let daily = month
        .first_day()
        .iter_days()
        .take(month.days() as usize)
        .map(|date| {
            let day = by_day.get(&date).copied().unwrap_or_default();
            DailyBreakdown {
                date,
                revenue: day.revenue,
                profit: day.profit,
                items_sold: day.items_sold,
                transactions: day.transactions,
            }
        })
        .collect();

    let mut by_product: Vec<MonthlyTopProduct> = Vec::new();
    for sale in &sales {
        let slot = by_product.iter().position(|p| p.product_id == sale.product_id);
        let entry = match slot {
            Some(i) => &mut by_product[i],
            None => {
                let name = ledger
                    .product(sale.product_id)
                    .map_or_else(|| sale.product_name.clone(), |p| p.name.clone());
                by_product.push(MonthlyTopProduct {
                    product_id: sale.product_id,
                    name,
                    quantity_sold: 0,
                    revenue: Money::zero(),
                    profit: Money::zero(),
                });
                let last = by_product.len() - 1;
                &mut by_product[last]
            }
        };
        entry.quantity_sold += sale.quantity;
        entry.revenue += sale.total_amount;
        entry.profit += sale.profit();
    }
    by_product.sort_by(|a, b| {
        b.quantity_sold
            .cmp(&a.quantity_sold)
            .then(b.revenue.cmp(&a.revenue))
            .then_with(|| a.name.cmp(&b.name))
    });
    by_product.truncate(MONTHLY_TOP_PRODUCTS);

    MonthlyReport {
        month,
        revenue: totals.revenue,
        profit: totals.profit,
        items_sold: totals.items_sold,
        transactions: totals.transactions,
        average_transaction: if totals.transactions == 0 {
            Money::zero()
        } else {
            totals.revenue.scale(1.0 / totals.transactions as f64)
        },
        profit_margin: totals.profit.ratio(totals.revenue).map_or(0.0, |r| r * 100.0),
        daily,
        top_products: by_product,
        growth: Growth {
            revenue: growth_percentage(previous.revenue.to_major(), totals.revenue.to_major()),
            profit: growth_percentage(previous.profit.to_major(), totals.profit.to_major()),
            volume: growth_percentage(previous.items_sold as f64, totals.items_sold as f64),
        },
    }
}

/// One line of the monthly sales export.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyReportRow {
    pub date: DateTime<Utc>,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub total: Money,
    pub profit: Money,
}

pub fn monthly_report_rows(ledger: &Ledger, month: MonthKey) -> Vec<MonthlyReportRow> {
    month_sales(ledger, month)
        .map(|s| MonthlyReportRow {
            date: s.date,
            product_name: s.product_name.clone(),
            quantity: s.quantity,
            unit_price: s.unit_price,
            total: s.total_amount,
            profit: s.profit(),
        })
        .collect()
}

// =============================================================================
// Inventory
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct InventoryValuation {
    pub total_products: usize,
    /// Σ quantity × selling price.
    pub selling_value: Money,
    /// Σ quantity × original price.
    pub cost_value: Money,
    pub potential_profit: Money,
    /// Cost of goods sold, from sale snapshots.
    pub cogs: Money,
    /// COGS over cost value; `None` when nothing is on hand.
    pub turnover: Option<f64>,
    pub low_stock_items: usize,
    pub out_of_stock_items: usize,
    /// Percent of products with stock on hand.
    pub stock_coverage: f64,
}

pub fn inventory_valuation(ledger: &Ledger) -> InventoryValuation {
    let products = ledger.products();
    let threshold = ledger.low_stock_threshold();

    let selling_value: Money = products.iter().map(|p| p.selling_price * p.quantity).sum();
    let cost_value: Money = products.iter().map(|p| p.original_price * p.quantity).sum();
    let cogs: Money = ledger.sales().iter().map(Sale::cost).sum();
    let out_of_stock_items = products.iter().filter(|p| p.quantity == 0).count();

    InventoryValuation {
        total_products: products.len(),
        selling_value,
        cost_value,
        potential_profit: selling_value - cost_value,
        cogs,
        turnover: if cost_value.is_positive() {
            cogs.ratio(cost_value)
        } else {
            None
        },
        low_stock_items: products
            .iter()
            .filter(|p| p.quantity > 0 && p.is_low_stock(threshold))
            .count(),
        out_of_stock_items,
        stock_coverage: if products.is_empty() {
            0.0
        } else {
            (products.len() - out_of_stock_items) as f64 / products.len() as f64 * 100.0
        },
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBreakdown {
    pub category: String,
    pub products: usize,
    pub total_stock: i64,
    pub cost_value: Money,
    pub selling_value: Money,
}

impl CategoryBreakdown {
    pub fn profit_potential(&self) -> Money {
        self.selling_value - self.cost_value
    }
}

/// Per-category totals, in order of first appearance.
pub fn category_breakdown(ledger: &Ledger) -> Vec<CategoryBreakdown> {
    let mut rows: Vec<CategoryBreakdown> = Vec::new();
    for product in ledger.products() {
        let category = if product.category.trim().is_empty() {
            DEFAULT_CATEGORY
        } else {
            product.category.as_str()
        };
        let slot = rows.iter().position(|r| r.category == category);
        let row = match slot {
            Some(i) => &mut rows[i],
            None => {
                rows.push(CategoryBreakdown {
                    category: category.to_string(),
                    products: 0,
                    total_stock: 0,
                    cost_value: Money::zero(),
                    selling_value: Money::zero(),
                });
                let last = rows.len() - 1;
                &mut rows[last]
            }
        };
        row.products += 1;
        row.total_stock += product.quantity;
        row.cost_value += product.original_price * product.quantity;
        row.selling_value += product.selling_price * product.quantity;
    }
    rows
}

/// One line of the inventory export.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryReportRow {
    pub product_id: ProductId,
    pub name: String,
    pub category: String,
    pub barcode: Option<String>,
    pub quantity: i64,
    pub original_price: Money,
    pub selling_price: Money,
    pub margin_percent: f64,
    /// Quantity × selling price.
    pub stock_value: Money,
    pub profit_per_unit: Money,
    pub potential_profit: Money,
    pub total_sold: i64,
    /// Revenue from this product's recorded sales.
    pub revenue: Money,
    pub status: StockStatus,
    /// `None` for legacy products without a creation date.
    pub days_since_created: Option<i64>,
}

pub fn inventory_report_rows(ledger: &Ledger, now: DateTime<Utc>) -> Vec<InventoryReportRow> {
    let threshold = ledger.low_stock_threshold();
    let mut revenue_by_product: HashMap<ProductId, Money> = HashMap::new();
    for sale in ledger.sales() {
        *revenue_by_product.entry(sale.product_id).or_default() += sale.total_amount;
    }

    ledger
        .products()
        .iter()
        .map(|p| {
            let profit_per_unit = p.selling_price - p.original_price;
            InventoryReportRow {
                product_id: p.id,
                name: p.name.clone(),
                category: p.category.clone(),
                barcode: p.barcode.clone(),
                quantity: p.quantity,
                original_price: p.original_price,
                selling_price: p.selling_price,
                margin_percent: margin_percent(p.original_price, p.selling_price),
                stock_value: p.selling_price * p.quantity,
                profit_per_unit,
                potential_profit: profit_per_unit * p.quantity,
                total_sold: p.total_sold,
                revenue: revenue_by_product.get(&p.id).copied().unwrap_or_default(),
                status: p.stock_status(threshold),
                days_since_created: p.created_date.map(|created| (now - created).num_days()),
            }
        })
        .collect()
}

// =============================================================================
// Performance Insights
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceInsights {
    /// Weekday with the most revenue; earlier weekdays win ties.
    pub best_day: Option<(Weekday, Money)>,
    /// Revenue over the number of distinct days with sales.
    pub average_daily_revenue: Money,
    /// Product name with the most snapshot profit; alphabetical on ties.
    pub most_profitable: Option<(String, Money)>,
    pub inventory_turnover: Option<f64>,
}

pub fn performance_insights(ledger: &Ledger) -> PerformanceInsights {
    let sales = ledger.sales();

    let mut by_weekday = [Money::zero(); 7];
    for sale in sales {
        by_weekday[sale.date.weekday().num_days_from_monday() as usize] += sale.total_amount;
    }
    let mut best_day: Option<(Weekday, Money)> = None;
    if !sales.is_empty() {
        let mut day = Weekday::Mon;
        for revenue in by_weekday {
            if best_day.map_or(true, |(_, best)| revenue > best) {
                best_day = Some((day, revenue));
            }
            day = day.succ();
        }
    }

    let revenue: Money = sales.iter().map(|s| s.total_amount).sum();
    let distinct_days: HashSet<NaiveDate> = sales.iter().map(|s| s.date.date_naive()).collect();
    let average_daily_revenue = if distinct_days.is_empty() {
        Money::zero()
    } else {
        revenue.scale(1.0 / distinct_days.len() as f64)
    };

    let mut profit_by_name: BTreeMap<&str, Money> = BTreeMap::new();
    for sale in sales {
        *profit_by_name.entry(sale.product_name.as_str()).or_default() += sale.profit();
    }
    let mut most_profitable: Option<(String, Money)> = None;
    for (name, profit) in profit_by_name {
        if most_profitable.as_ref().map_or(true, |(_, best)| profit > *best) {
            most_profitable = Some((name.to_string(), profit));
        }
    }

    PerformanceInsights {
        best_day,
        average_daily_revenue,
        most_profitable,
        inventory_turnover: inventory_valuation(ledger).turnover,
    }
}

// =============================================================================
// History Views
// =============================================================================

/// Price changes for one product, newest first.
pub fn price_history_for(ledger: &Ledger, product_id: ProductId) -> Vec<&PriceHistoryEntry> {
    let mut entries: Vec<_> = ledger
        .price_history()
        .iter()
        .filter(|e| e.product_id == product_id)
        .collect();
    entries.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
    entries
}

/// Restocks for one product, newest first.
pub fn restock_history_for(ledger: &Ledger, product_id: ProductId) -> Vec<&RestockHistoryEntry> {
    let mut entries: Vec<_> = ledger
        .restock_history()
        .iter()
        .filter(|e| e.product_id == product_id)
        .collect();
    entries.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
    entries
}

// =============================================================================
// Backup
// =============================================================================

/// Full export of the store: the five collections plus export metadata.
///
/// Deserializes from older backups that lack the metadata fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSnapshot {
    #[serde(flatten)]
    pub document: StoreDocument,
    #[serde(default, deserialize_with = "compat::optional_timestamp")]
    pub export_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_products: usize,
    #[serde(default)]
    pub total_sales: usize,
    #[serde(default)]
    pub system_version: String,
}

impl BackupSnapshot {
    pub fn into_document(self) -> StoreDocument {
        self.document
    }
}

pub fn backup_snapshot(ledger: &Ledger, now: DateTime<Utc>) -> BackupSnapshot {
    BackupSnapshot {
        document: ledger.to_document(None),
        export_date: Some(now),
        total_products: ledger.products().len(),
        total_sales: ledger.sales().len(),
        system_version: SYSTEM_VERSION.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{at, ledger_with, ledger_with_settings, product, sale};
    use crate::types::{PriceChangeReason, Settings};

    fn month(s: &str) -> MonthKey {
        s.parse().unwrap()
    }

    #[test]
    fn test_month_key_parsing_and_bounds() {
        let feb = month("2024-02");
        assert_eq!(feb.to_string(), "2024-02");
        assert_eq!(feb.days(), 29);
        assert_eq!(feb.start(), Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(feb.end(), Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(month("2024-01").previous(), month("2023-12"));

        // The last day of the month belongs to it
        assert!(feb.contains(Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap()));
        assert!(!feb.contains(feb.end()));

        assert!("2024-13".parse::<MonthKey>().is_err());
        assert!("March".parse::<MonthKey>().is_err());
    }

    #[test]
    fn test_summary() {
        let mut a = product(1, "Coke", 0);
        a.total_sold = 4;
        let mut b = product(2, "Chips", 8);
        b.total_sold = 9;
        let c = product(3, "Soap", 2);
        let ledger = ledger_with(
            vec![a, b, c],
            vec![sale(10, 1, 4, at(2024, 3, 1)), sale(11, 2, 9, at(2024, 3, 2))],
        );

        let summary = summary(&ledger);
        assert_eq!(summary.total_revenue.cents(), 13 * 1500);
        assert_eq!(summary.total_profit.cents(), 13 * 500);
        assert_eq!(summary.products_in_stock, 2);
        assert_eq!(summary.transactions, 2);
        assert_eq!(summary.top_products.len(), 2);
        assert_eq!(summary.top_products[0].name, "Chips");
        assert_eq!(summary.top_products[0].revenue.cents(), 9 * 1500);
    }

    #[test]
    fn test_summary_ties_rank_by_name() {
        let products = ["Zesto", "Milo", "Bearbrand"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let mut p = product(i as i64 + 1, name, 5);
                p.total_sold = 3;
                p
            })
            .collect();
        let ledger = ledger_with(products, vec![]);

        let names: Vec<_> = summary(&ledger)
            .top_products
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Bearbrand", "Milo", "Zesto"]);
    }

    #[test]
    fn test_stock_alerts() {
        let ledger = ledger_with(
            vec![
                product(1, "Out", 0),
                product(2, "Critical", 2),
                product(3, "Warning", 4),
                product(4, "Fine", 30),
            ],
            vec![],
        );
        let alerts = stock_alerts(&ledger);
        fn names(list: &[Product]) -> Vec<String> {
            list.iter().map(|p| p.name.clone()).collect()
        }

        assert_eq!(names(&alerts.out_of_stock), vec!["Out"]);
        assert_eq!(names(&alerts.low), vec!["Critical", "Warning"]);
        assert_eq!(names(&alerts.critical), vec!["Critical"]);
        assert_eq!(names(&alerts.warning), vec!["Warning"]);

        let rows = stock_alert_rows(&ledger);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].action, "Immediate Restocking Required");
        assert_eq!(rows[1].status, StockStatus::Critical);
    }

    #[test]
    fn test_empty_month_report() {
        let ledger = ledger_with(vec![product(1, "Coke", 5)], vec![]);
        let report = monthly_report(&ledger, month("2024-04"));

        assert_eq!(report.revenue, Money::zero());
        assert_eq!(report.profit, Money::zero());
        assert_eq!(report.transactions, 0);
        assert_eq!(report.average_transaction, Money::zero());
        assert_eq!(report.profit_margin, 0.0);
        assert!(report.top_products.is_empty());
        assert_eq!(report.daily.len(), 30);
        assert!(report.daily.iter().all(|d| d.transactions == 0));
        assert_eq!(report.growth.revenue, 0.0);
    }

    #[test]
    fn test_monthly_report() {
        let last_day = Utc.with_ymd_and_hms(2024, 3, 31, 22, 0, 0).unwrap();
        let ledger = ledger_with(
            vec![product(1, "Coke", 5), product(2, "Chips", 5)],
            vec![
                sale(1, 1, 2, at(2024, 2, 10)),
                sale(2, 1, 2, at(2024, 3, 1)),
                sale(3, 2, 3, at(2024, 3, 1)),
                sale(4, 1, 2, last_day),
            ],
        );

        let report = monthly_report(&ledger, month("2024-03"));
        assert_eq!(report.transactions, 3);
        assert_eq!(report.items_sold, 7);
        assert_eq!(report.revenue.cents(), 7 * 1500);
        assert_eq!(report.average_transaction.cents(), 3500);
        assert!((report.profit_margin - 100.0 / 3.0).abs() < 1e-9);

        assert_eq!(report.daily.len(), 31);
        assert_eq!(report.daily[0].transactions, 2);
        assert_eq!(report.daily[30].items_sold, 2);

        // Coke 4 units ahead of Chips 3, name from the current product
        assert_eq!(report.top_products[0].name, "Coke");
        assert_eq!(report.top_products[0].quantity_sold, 4);
        assert_eq!(report.top_products[1].quantity_sold, 3);

        // February: 2 units, ₱30.00
        assert!((report.growth.revenue - 250.0).abs() < 1e-9);
        assert!((report.growth.volume - 250.0).abs() < 1e-9);

        let rows = monthly_report_rows(&ledger, month("2024-03"));
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].profit.cents(), 1000);
    }

    #[test]
    fn test_growth_percentage() {
        assert_eq!(growth_percentage(0.0, 10.0), 100.0);
        assert_eq!(growth_percentage(0.0, 0.0), 0.0);
        assert_eq!(growth_percentage(100.0, 50.0), -50.0);
    }

    #[test]
    fn test_available_months() {
        let ledger = ledger_with(
            vec![],
            vec![
                sale(1, 1, 1, at(2023, 11, 5)),
                sale(2, 1, 1, at(2024, 1, 5)),
                sale(3, 1, 1, at(2024, 1, 9)),
            ],
        );
        let months: Vec<String> = available_months(&ledger, at(2024, 3, 1))
            .iter()
            .map(|m| m.to_string())
            .collect();
        assert_eq!(months, vec!["2024-03", "2024-01", "2023-11"]);
    }

    #[test]
    fn test_inventory_valuation() {
        let ledger = ledger_with_settings(
            vec![product(1, "A", 10), product(2, "B", 0)],
            vec![sale(5, 1, 5, at(2024, 3, 1))],
            Settings::default(),
        );
        let valuation = inventory_valuation(&ledger);
        assert_eq!(valuation.selling_value.cents(), 15000);
        assert_eq!(valuation.cost_value.cents(), 10000);
        assert_eq!(valuation.potential_profit.cents(), 5000);
        assert_eq!(valuation.cogs.cents(), 5000);
        assert_eq!(valuation.turnover, Some(0.5));
        assert_eq!(valuation.out_of_stock_items, 1);
        assert_eq!(valuation.low_stock_items, 0);
        assert_eq!(valuation.stock_coverage, 50.0);

        // Out of stock is its own bucket, never counted as low stock
        let ledger = ledger_with(
            vec![product(1, "A", 10), product(2, "B", 0), product(3, "C", 3)],
            vec![],
        );
        let valuation = inventory_valuation(&ledger);
        assert_eq!(valuation.low_stock_items, 1);
        assert_eq!(valuation.out_of_stock_items, 1);

        let empty = inventory_valuation(&Ledger::new());
        assert_eq!(empty.turnover, None);
        assert_eq!(empty.stock_coverage, 0.0);
    }

    #[test]
    fn test_category_breakdown() {
        let mut drink = product(3, "Coke", 4);
        drink.category = "Drinks".to_string();
        let ledger = ledger_with(vec![product(1, "A", 2), drink, product(2, "B", 3)], vec![]);

        let rows = category_breakdown(&ledger);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].category, "Snacks");
        assert_eq!(rows[0].products, 2);
        assert_eq!(rows[0].total_stock, 5);
        assert_eq!(rows[0].profit_potential().cents(), 2500);
        assert_eq!(rows[1].category, "Drinks");
    }

    #[test]
    fn test_inventory_report_rows() {
        let mut p = product(1, "Coke", 4);
        p.created_date = Some(at(2024, 3, 1));
        let legacy = product(2, "Old", 10);
        let ledger = ledger_with(vec![p, legacy], vec![sale(9, 1, 2, at(2024, 3, 2))]);

        let rows = inventory_report_rows(&ledger, at(2024, 3, 11));
        assert_eq!(rows[0].stock_value.cents(), 6000);
        assert_eq!(rows[0].potential_profit.cents(), 2000);
        assert_eq!(rows[0].revenue.cents(), 3000);
        assert_eq!(rows[0].status, StockStatus::LowStock);
        assert_eq!(rows[0].days_since_created, Some(10));
        assert_eq!(rows[1].days_since_created, None);
        assert_eq!(rows[1].status, StockStatus::InStock);
    }

    #[test]
    fn test_performance_insights() {
        // 2024-03-04 is a Monday, 2024-03-06 a Wednesday
        let mut big = sale(3, 2, 4, at(2024, 3, 6));
        big.product_name = "Chips".to_string();
        let ledger = ledger_with(
            vec![product(1, "A", 10)],
            vec![
                sale(1, 1, 1, at(2024, 3, 4)),
                sale(2, 1, 1, at(2024, 3, 4)),
                big,
            ],
        );
        let insights = performance_insights(&ledger);
        assert_eq!(insights.best_day, Some((Weekday::Wed, Money::from_cents(6000))));
        assert_eq!(insights.average_daily_revenue.cents(), 4500);
        assert_eq!(
            insights.most_profitable,
            Some(("Chips".to_string(), Money::from_cents(2000)))
        );

        let empty = performance_insights(&Ledger::new());
        assert_eq!(empty.best_day, None);
        assert_eq!(empty.most_profitable, None);
    }

    #[test]
    fn test_history_newest_first() {
        let item = product(1, "A", 1);
        let mut doc = ledger_with(vec![item.clone()], vec![]).to_document(None);
        for (id, day) in [(1, 1), (2, 3), (3, 2)] {
            doc.price_history.push(PriceHistoryEntry::new(
                id,
                at(2024, 3, day),
                &item,
                item.original_price,
                item.selling_price,
                item.original_price,
                item.selling_price,
                PriceChangeReason::BulkUpdate,
                1,
            ));
        }
        let ledger = Ledger::from_document(doc);
        let ids: Vec<i64> = price_history_for(&ledger, 1).iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert!(restock_history_for(&ledger, 1).is_empty());
    }

    #[test]
    fn test_backup_snapshot() {
        let ledger = ledger_with(vec![product(1, "A", 1)], vec![sale(2, 1, 1, at(2024, 3, 1))]);
        let backup = backup_snapshot(&ledger, at(2024, 3, 2));
        let json = serde_json::to_value(&backup).unwrap();

        assert_eq!(json["systemVersion"], SYSTEM_VERSION);
        assert_eq!(json["totalProducts"], 1);
        assert_eq!(json["totalSales"], 1);
        assert!(json["products"].is_array());
        assert!(json["priceHistory"].is_array());

        let restored: BackupSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(restored.into_document(), ledger.to_document(None));
    }
}
