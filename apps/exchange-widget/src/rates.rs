//! Cross-rate tables and the sources that supply them.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::config::CURRENCIES;
use crate::currency::Currency;

/// Quotes of each currency against the US dollar.
pub type UsdQuotes = IndexMap<Currency, f64>;

/// Conversion factors: `get(from, to)` units of `to` per unit of `from`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Rates {
    table: IndexMap<Currency, IndexMap<Currency, f64>>,
}

impl Rates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces one directed rate.
    pub fn with(mut self, from: Currency, to: Currency, rate: f64) -> Self {
        self.insert(from, to, rate);
        self
    }

    pub fn insert(&mut self, from: Currency, to: Currency, rate: f64) {
        self.table.entry(from).or_default().insert(to, rate);
    }

    pub fn get(&self, from: Currency, to: Currency) -> Option<f64> {
        self.table.get(&from)?.get(&to).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.table.values().all(IndexMap::is_empty)
    }

    /// The table the widget ships with while live quotes are unavailable.
    pub fn fixture() -> Self {
        use Currency::{Eur, Gbp, Usd};
        Self::new()
            .with(Gbp, Gbp, 1.0)
            .with(Gbp, Eur, 1.1238673057116992)
            .with(Gbp, Usd, 1.2217276940011947)
            .with(Eur, Gbp, 0.889784759212958)
            .with(Eur, Eur, 1.0)
            .with(Eur, Usd, 1.0870746820306554)
            .with(Usd, Gbp, 0.818513)
            .with(Usd, Eur, 0.9199)
            .with(Usd, Usd, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RateError {
    MissingQuote { currency: Currency },
    InvalidQuote { currency: Currency, value: f64 },
    Unavailable(String),
}

impl fmt::Display for RateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateError::MissingQuote { currency } => write!(f, "no USD quote for {currency}"),
            RateError::InvalidQuote { currency, value } => {
                write!(f, "USD quote for {currency} is not a positive number: {value}")
            }
            RateError::Unavailable(reason) => write!(f, "rates unavailable: {reason}"),
        }
    }
}

impl std::error::Error for RateError {}

/// Builds the full cross table for [`CURRENCIES`] from dollar quotes.
pub fn calculate_rates(usd: &UsdQuotes) -> Result<Rates, RateError> {
    let quote = |currency: Currency| -> Result<f64, RateError> {
        let value = *usd
            .get(&currency)
            .ok_or(RateError::MissingQuote { currency })?;
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(RateError::InvalidQuote { currency, value })
        }
    };

    let mut rates = Rates::new();
    for from in CURRENCIES {
        let base = quote(from)?;
        for to in CURRENCIES {
            rates.insert(from, to, quote(to)? / base);
        }
    }
    Ok(rates)
}

/// Supplier of fresh rate tables, polled on every refresh.
pub trait RateSource {
    fn fetch(&self) -> Result<Rates, RateError>;
}

pub type SharedRateSource = Rc<dyn RateSource>;

/// Always answers with the same table.
#[derive(Clone, Debug, PartialEq)]
pub struct StaticRates {
    rates: Rates,
}

impl StaticRates {
    pub fn new(rates: Rates) -> Self {
        Self { rates }
    }
}

impl Default for StaticRates {
    fn default() -> Self {
        Self::new(Rates::fixture())
    }
}

impl RateSource for StaticRates {
    fn fetch(&self) -> Result<Rates, RateError> {
        Ok(self.rates.clone())
    }
}

/// Derives the cross table from a fixed set of dollar quotes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UsdQuoteSource {
    quotes: UsdQuotes,
}

impl UsdQuoteSource {
    pub fn new(quotes: UsdQuotes) -> Self {
        Self { quotes }
    }
}

impl RateSource for UsdQuoteSource {
    fn fetch(&self) -> Result<Rates, RateError> {
        calculate_rates(&self.quotes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Currency::{Eur, Gbp, Usd};

    fn quotes() -> UsdQuotes {
        [(Usd, 1.0), (Gbp, 0.8), (Eur, 0.9)].into_iter().collect()
    }

    #[test]
    fn cross_rates_divide_quotes() {
        let rates = calculate_rates(&quotes()).expect("rates");
        assert_eq!(rates.get(Usd, Gbp), Some(0.8));
        assert_eq!(rates.get(Gbp, Gbp), Some(1.0));
        let gbp_eur = rates.get(Gbp, Eur).expect("GBP/EUR");
        assert!((gbp_eur - 1.125).abs() < 1e-12);
    }

    #[test]
    fn missing_or_zero_quotes_are_rejected() {
        let mut partial = quotes();
        partial.shift_remove(&Eur);
        assert_eq!(
            calculate_rates(&partial),
            Err(RateError::MissingQuote { currency: Eur })
        );

        let mut zero = quotes();
        zero.insert(Gbp, 0.0);
        assert_eq!(
            calculate_rates(&zero),
            Err(RateError::InvalidQuote {
                currency: Gbp,
                value: 0.0
            })
        );
    }

    #[test]
    fn fixture_is_complete() {
        let rates = Rates::fixture();
        for from in CURRENCIES {
            for to in CURRENCIES {
                assert!(rates.get(from, to).is_some(), "{from}->{to}");
            }
        }
        assert_eq!(StaticRates::default().fetch(), Ok(rates));
    }

    #[test]
    fn quote_source_runs_the_calculation() {
        let source = UsdQuoteSource::new(quotes());
        assert_eq!(source.fetch(), calculate_rates(&quotes()));
        assert!(!source.fetch().expect("rates").is_empty());
    }
}
