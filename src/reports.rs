//! Revenue aggregation and leaderboard scoring.
//!
//! Pure arithmetic over already-fetched sale records; the handlers fetch
//! a window of [`SaleRecord`]s and fold them here.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::db::sales::SaleRecord;

/// Flat bonus per closed sale, on top of revenue, when scoring the
/// leaderboard. Rewards ticket count, not only ticket size.
const SALE_BONUS_POINTS: i64 = 20;

#[derive(Debug, Serialize)]
pub struct SalesSummary {
    pub period_days: i64,
    pub total_cents: i64,
    pub sale_count: usize,
    pub units_sold: i64,
    pub top_products: Vec<TopProduct>,
}

#[derive(Debug, Serialize)]
pub struct TopProduct {
    pub product_id: String,
    pub name: String,
    pub units: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: String,
    pub display_name: String,
    pub revenue_cents: i64,
    pub sale_count: usize,
    pub score: i64,
}

#[must_use]
pub fn summarize(records: &[SaleRecord], period_days: i64) -> SalesSummary {
    let total_cents = records.iter().map(|r| r.total_cents).sum();
    let units_sold = records.iter().map(|r| r.quantity).sum();

    let mut by_product: HashMap<&str, TopProduct> = HashMap::new();
    for record in records {
        let entry = by_product
            .entry(record.product_id.as_str())
            .or_insert_with(|| TopProduct {
                product_id: record.product_id.clone(),
                name: record.product_name.clone(),
                units: 0,
                revenue_cents: 0,
            });
        entry.units += record.quantity;
        entry.revenue_cents += record.total_cents;
    }

    let mut top_products: Vec<TopProduct> = by_product.into_values().collect();
    top_products.sort_by(|a, b| b.revenue_cents.cmp(&a.revenue_cents));
    top_products.truncate(5);

    SalesSummary {
        period_days,
        total_cents,
        sale_count: records.len(),
        units_sold,
        top_products,
    }
}

/// Score = revenue in whole currency units + a flat bonus per sale,
/// ranked descending. Ties keep insertion order.
#[must_use]
pub fn leaderboard(records: &[SaleRecord]) -> Vec<LeaderboardEntry> {
    let mut by_seller: HashMap<&str, LeaderboardEntry> = HashMap::new();
    for record in records {
        let entry = by_seller
            .entry(record.seller_id.as_str())
            .or_insert_with(|| LeaderboardEntry {
                rank: 0,
                user_id: record.seller_id.clone(),
                display_name: record.seller_name.clone(),
                revenue_cents: 0,
                sale_count: 0,
                score: 0,
            });
        entry.revenue_cents += record.total_cents;
        entry.sale_count += 1;
    }

    let mut entries: Vec<LeaderboardEntry> = by_seller.into_values().collect();
    for entry in &mut entries {
        entry.score = entry.revenue_cents / 100 + SALE_BONUS_POINTS * entry.sale_count as i64;
    }
    entries.sort_by(|a, b| b.score.cmp(&a.score));
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = i + 1;
    }
    entries
}

/// Buckets revenue per UTC day over the trailing `days` window ending now.
/// Days without sales are zero-filled so the series is forecastable.
#[must_use]
pub fn daily_revenue_series(records: &[SaleRecord], now: DateTime<Utc>, days: i64) -> Vec<f64> {
    bucket_daily(records, now, days, |r| r.total_cents as f64)
}

/// Units sold per UTC day for one product over the trailing window.
#[must_use]
pub fn daily_units_series(
    records: &[SaleRecord],
    product_id: &str,
    now: DateTime<Utc>,
    days: i64,
) -> Vec<f64> {
    let filtered: Vec<SaleRecord> = records
        .iter()
        .filter(|r| r.product_id == product_id)
        .cloned()
        .collect();
    bucket_daily(&filtered, now, days, |r| r.quantity as f64)
}

fn bucket_daily(
    records: &[SaleRecord],
    now: DateTime<Utc>,
    days: i64,
    value: impl Fn(&SaleRecord) -> f64,
) -> Vec<f64> {
    let days = days.max(1);
    let start = (now - Duration::days(days - 1)).date_naive();
    let mut series = vec![0.0; days as usize];
    for record in records {
        let offset = (record.sold_at.date_naive() - start).num_days();
        if (0..days).contains(&offset) {
            series[offset as usize] += value(record);
        }
    }
    series
}
