use chrono::{Duration, Utc};

use opsdesk::db::sales::SaleRecord;
use opsdesk::reports::{daily_revenue_series, daily_units_series, leaderboard, summarize};

fn record(product: &str, seller: &str, quantity: i64, total_cents: i64, days_ago: i64) -> SaleRecord {
    SaleRecord {
        product_id: product.to_string(),
        product_name: format!("{product} name"),
        seller_id: seller.to_string(),
        seller_name: format!("{seller} name"),
        quantity,
        total_cents,
        sold_at: Utc::now() - Duration::days(days_ago),
    }
}

#[test]
fn test_summary_totals_and_top_products() {
    let records = vec![
        record("p1", "u1", 2, 1000, 0),
        record("p1", "u2", 1, 500, 1),
        record("p2", "u1", 5, 250, 2),
    ];

    let summary = summarize(&records, 7);
    assert_eq!(summary.period_days, 7);
    assert_eq!(summary.total_cents, 1750);
    assert_eq!(summary.sale_count, 3);
    assert_eq!(summary.units_sold, 8);

    // p1 grossed 1500, p2 grossed 250.
    assert_eq!(summary.top_products.len(), 2);
    assert_eq!(summary.top_products[0].product_id, "p1");
    assert_eq!(summary.top_products[0].revenue_cents, 1500);
    assert_eq!(summary.top_products[0].units, 3);
    assert_eq!(summary.top_products[1].product_id, "p2");
}

#[test]
fn test_empty_summary() {
    let summary = summarize(&[], 30);
    assert_eq!(summary.total_cents, 0);
    assert_eq!(summary.sale_count, 0);
    assert!(summary.top_products.is_empty());
}

#[test]
fn test_leaderboard_ranks_by_score() {
    // u1: 3000 cents over 1 sale -> 30 + 20 = 50 points.
    // u2: 1000 cents over 3 sales -> 10 + 60 = 70 points.
    let records = vec![
        record("p1", "u1", 1, 3000, 0),
        record("p1", "u2", 1, 400, 0),
        record("p1", "u2", 1, 300, 1),
        record("p1", "u2", 1, 300, 2),
    ];

    let entries = leaderboard(&records);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].user_id, "u2");
    assert_eq!(entries[0].rank, 1);
    assert_eq!(entries[0].score, 70);
    assert_eq!(entries[0].sale_count, 3);
    assert_eq!(entries[1].user_id, "u1");
    assert_eq!(entries[1].rank, 2);
    assert_eq!(entries[1].score, 50);
}

#[test]
fn test_daily_revenue_series_is_zero_filled() {
    let now = Utc::now();
    let records = vec![record("p1", "u1", 1, 700, 0), record("p1", "u1", 1, 300, 2)];

    let series = daily_revenue_series(&records, now, 5);
    assert_eq!(series.len(), 5);
    // Index 4 is today, index 2 is two days ago.
    assert!((series[4] - 700.0).abs() < f64::EPSILON);
    assert!((series[2] - 300.0).abs() < f64::EPSILON);
    assert!((series[3]).abs() < f64::EPSILON);
}

#[test]
fn test_daily_units_series_filters_by_product() {
    let now = Utc::now();
    let records = vec![
        record("p1", "u1", 4, 100, 0),
        record("p2", "u1", 9, 100, 0),
    ];

    let series = daily_units_series(&records, "p1", now, 3);
    assert_eq!(series.len(), 3);
    assert!((series[2] - 4.0).abs() < f64::EPSILON);
    assert!((series.iter().sum::<f64>() - 4.0).abs() < f64::EPSILON);
}

#[test]
fn test_sales_outside_window_are_ignored() {
    let now = Utc::now();
    let records = vec![record("p1", "u1", 1, 999, 30)];
    let series = daily_revenue_series(&records, now, 7);
    assert!(series.iter().all(|v| *v == 0.0));
}
