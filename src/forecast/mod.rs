//! Lightweight forecasting: exponential smoothing and moving averages
//! over small in-memory series.

/// Default smoothing factor when the caller does not supply one.
pub const DEFAULT_ALPHA: f64 = 0.4;

/// Trailing window, in days, used for inventory depletion estimates.
pub const DEPLETION_WINDOW_DAYS: i64 = 28;

/// Simple exponential smoothing; returns the final level, or `None` for an
/// empty series. `alpha` is clamped to (0, 1].
#[must_use]
pub fn exponential_smoothing(series: &[f64], alpha: f64) -> Option<f64> {
    let alpha = alpha.clamp(f64::EPSILON, 1.0);
    let mut iter = series.iter();
    let mut level = *iter.next()?;
    for value in iter {
        level = alpha * value + (1.0 - alpha) * level;
    }
    Some(level)
}

/// Mean of the trailing `window` values (or the whole series when it is
/// shorter). `None` for an empty series.
#[must_use]
pub fn moving_average(series: &[f64], window: usize) -> Option<f64> {
    if series.is_empty() || window == 0 {
        return None;
    }
    let tail = &series[series.len().saturating_sub(window)..];
    Some(tail.iter().sum::<f64>() / tail.len() as f64)
}

/// Flat forecast: repeats the smoothed level for `horizon` periods.
/// Negative levels clamp to zero, revenue cannot go below nothing.
#[must_use]
pub fn flat_forecast(level: f64, horizon: usize) -> Vec<f64> {
    vec![level.max(0.0); horizon]
}

/// Estimated days until stock runs out, given the current quantity and a
/// daily-consumption series. `None` when there is no consumption history.
#[must_use]
pub fn days_to_stockout(quantity: i64, daily_units: &[f64]) -> Option<f64> {
    let avg = moving_average(daily_units, daily_units.len())?;
    if avg <= 0.0 {
        return None;
    }
    Some(quantity.max(0) as f64 / avg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothing_of_constant_series_is_the_constant() {
        let level = exponential_smoothing(&[5.0, 5.0, 5.0, 5.0], 0.3);
        assert_eq!(level, Some(5.0));
    }

    #[test]
    fn smoothing_tracks_recent_values_more_with_high_alpha() {
        let low = exponential_smoothing(&[10.0, 10.0, 100.0], 0.1).unwrap();
        let high = exponential_smoothing(&[10.0, 10.0, 100.0], 0.9).unwrap();
        assert!(high > low);
        assert!(high > 90.0);
    }

    #[test]
    fn empty_series_has_no_level() {
        assert_eq!(exponential_smoothing(&[], 0.4), None);
        assert_eq!(moving_average(&[], 7), None);
    }

    #[test]
    fn moving_average_uses_trailing_window() {
        let avg = moving_average(&[100.0, 1.0, 2.0, 3.0], 3).unwrap();
        assert!((avg - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stockout_divides_quantity_by_average_daily_units() {
        let days = days_to_stockout(10, &[2.0, 2.0, 2.0]).unwrap();
        assert!((days - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stockout_is_unknown_without_consumption() {
        assert_eq!(days_to_stockout(10, &[]), None);
        assert_eq!(days_to_stockout(10, &[0.0, 0.0]), None);
    }
}
