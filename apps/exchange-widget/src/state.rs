use crate::config::{DEFAULT_FROM, DEFAULT_TO};
use crate::currency::Currency;
use crate::rates::Rates;

/// One side of the conversion.
#[derive(Clone, Debug, PartialEq)]
pub struct Panel {
    pub currency: Currency,
    pub amount: f64,
}

impl Panel {
    pub fn new(currency: Currency) -> Self {
        Self {
            currency,
            amount: 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExchangeState {
    pub from: Panel,
    pub to: Panel,
    pub rates: Option<Rates>,
}

impl Default for ExchangeState {
    fn default() -> Self {
        Self {
            from: Panel::new(DEFAULT_FROM),
            to: Panel::new(DEFAULT_TO),
            rates: None,
        }
    }
}

impl ExchangeState {
    /// Rate from the `from` currency to the `to` currency, when known.
    pub fn forward_rate(&self) -> Option<f64> {
        self.rates.as_ref()?.get(self.from.currency, self.to.currency)
    }

    pub fn backward_rate(&self) -> Option<f64> {
        self.rates.as_ref()?.get(self.to.currency, self.from.currency)
    }

    /// Recomputes the converted amount. Leaves it untouched while no rate
    /// for the current pair is known.
    pub fn update_resulting_amount(&mut self) {
        if let Some(rate) = self.forward_rate() {
            self.to.amount = self.from.amount * rate;
        }
    }
}
