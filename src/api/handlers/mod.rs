//! Request handlers, one module per resource.

use chrono::{DateTime, Duration, Utc};

use crate::errors::{AppError, AppResult};

pub mod activities;
pub mod auth;
pub mod forecast;
pub mod health;
pub mod messages;
pub mod notifications;
pub mod products;
pub mod sales;
pub mod team;
pub mod webchat;
pub mod webhooks;

/// Parses a `period` query value into (days, cutoff). Defaults to a
/// month.
pub(crate) fn parse_period(period: Option<&str>) -> AppResult<(i64, DateTime<Utc>)> {
    let days = match period.unwrap_or("month") {
        "day" => 1,
        "week" => 7,
        "month" => 30,
        other => {
            return Err(AppError::validation(format!(
                "unknown period {other:?}; expected day, week, or month"
            )));
        }
    };
    Ok((days, Utc::now() - Duration::days(days)))
}
