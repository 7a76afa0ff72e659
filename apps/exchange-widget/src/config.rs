//! Widget constants and their environment overrides.

use std::time::Duration;

use crate::currency::Currency;

/// Currencies offered by the switch buttons, in display order.
pub const CURRENCIES: [Currency; 3] = [Currency::Gbp, Currency::Eur, Currency::Usd];

pub const DEFAULT_FROM: Currency = Currency::Gbp;
pub const DEFAULT_TO: Currency = Currency::Eur;

/// How often the host refreshes rates.
pub const UPDATE_INTERVAL: Duration = Duration::from_millis(30_000);

/// Environment variable overriding [`UPDATE_INTERVAL`], in milliseconds.
pub const UPDATE_INTERVAL_ENV: &str = "EXCHANGE_UPDATE_INTERVAL_MS";

/// [`UPDATE_INTERVAL`], unless `EXCHANGE_UPDATE_INTERVAL_MS` holds a
/// positive number of milliseconds.
pub fn update_interval() -> Duration {
    match std::env::var(UPDATE_INTERVAL_ENV) {
        Ok(raw) => parse_interval(&raw).unwrap_or_else(|| {
            log::warn!("ignoring invalid {UPDATE_INTERVAL_ENV}={raw:?}");
            UPDATE_INTERVAL
        }),
        Err(_) => UPDATE_INTERVAL,
    }
}

fn parse_interval(raw: &str) -> Option<Duration> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|millis| *millis > 0)
        .map(Duration::from_millis)
}
