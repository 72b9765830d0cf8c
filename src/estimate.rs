// Locally derived booking fields: trip length, end date and price display

use chrono::{Days, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

// Tours whose duration text has no day count ("Full day", "Half-day excursion") are single-day trips
pub const DEFAULT_DURATION_DAYS: u32 = 1;

fn day_count_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)(\d+)\s*day").expect("static day-count pattern"))
}

/// Whole number of days in a free-text duration such as `"3 days / 2 nights"`.
///
/// The first run of digits followed by "day" wins. Text without such a run, and a
/// literal `0 days`, fall back to [`DEFAULT_DURATION_DAYS`].
pub fn parse_duration_days(duration: &str) -> u32 {
    day_count_pattern()
        .captures(duration)
        .and_then(|captures| captures.get(1))
        .and_then(|digits| digits.as_str().parse::<u32>().ok())
        .filter(|days| *days > 0)
        .unwrap_or(DEFAULT_DURATION_DAYS)
}

/// Last day of the trip: `start + (days - 1)`.
pub fn derive_end_date(duration: &str, start_date: NaiveDate) -> NaiveDate {
    let days = parse_duration_days(duration);
    start_date
        .checked_add_days(Days::new(u64::from(days - 1)))
        .unwrap_or(NaiveDate::MAX)
}

// Whole amounts render without decimals, anything else with two
pub fn format_price(price: f64) -> String {
    if price.fract() == 0.0 && price.is_finite() {
        format!("{}", price as i64)
    } else {
        format!("{:.2}", price)
    }
}

pub fn format_price_str(price: &str) -> Option<String> {
    price.trim().parse::<f64>().ok().map(format_price)
}

pub fn trip_length_label(days: u32) -> String {
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{} days", days)
    }
}
