use std::fmt;
use std::rc::Rc;

use vdom_core::{attrs, children, h, Component, Context, Link, Props, VNode, View};

use super::{Callback, CurrencyPanel};
use crate::currency::Currency;
use crate::rates::{SharedRateSource, StaticRates};
use crate::state::ExchangeState;

/// Prop carrying the widget's [`SharedRateSource`].
pub const RATE_SOURCE_PROP: &str = "rateSource";

/// Two linked currency panels. Rates are pulled from the source once on
/// mount and again on every [`ExchangeActions::update_rates`].
pub struct ExchangeWidget {
    actions: ExchangeActions,
}

impl ExchangeWidget {
    pub fn actions(&self) -> ExchangeActions {
        self.actions.clone()
    }
}

impl Component for ExchangeWidget {
    type State = ExchangeState;

    fn create(props: &Props, _context: &Context, link: Link<Self>) -> Self {
        let source: SharedRateSource = match props.get_any::<SharedRateSource>(RATE_SOURCE_PROP) {
            Some(source) => Rc::clone(&*source),
            None => Rc::new(StaticRates::default()),
        };
        Self {
            actions: ExchangeActions { link, source },
        }
    }

    fn did_mount(&mut self, _view: View<'_, Self>) {
        self.actions.update_rates();
    }

    fn render(&self, view: View<'_, Self>) -> Option<VNode> {
        let state = view.state;
        let actions = &self.actions;
        Some(h(
            "div",
            Some(attrs! { "class" => "ExchangeWidget" }),
            children![
                h(
                    "div",
                    Some(attrs! { "class" => "ExchangeWidget_from" }),
                    children![h(
                        CurrencyPanel::unit(),
                        Some(attrs! {
                            "currency" => state.from.currency.code(),
                            "secondCurrency" => state.to.currency.code(),
                            "amount" => state.from.amount,
                            "rate" => state.forward_rate(),
                            "editable" => true,
                            "onAmountChange" => actions.on_amount_change(),
                            "onCurrencyChange" => actions.on_from_currency_change(),
                        }),
                        children![],
                    )],
                ),
                h(
                    "div",
                    Some(attrs! { "class" => "ExchangeWidget_to" }),
                    children![h(
                        CurrencyPanel::unit(),
                        Some(attrs! {
                            "currency" => state.to.currency.code(),
                            "secondCurrency" => state.from.currency.code(),
                            "amount" => state.to.amount,
                            "rate" => state.backward_rate(),
                            "editable" => false,
                            "onCurrencyChange" => actions.on_to_currency_change(),
                        }),
                        children![],
                    )],
                ),
            ],
        ))
    }
}

/// State transitions of a mounted [`ExchangeWidget`]. Each one queues a
/// state change; the next flush re-renders both panels.
#[derive(Clone)]
pub struct ExchangeActions {
    link: Link<ExchangeWidget>,
    source: SharedRateSource,
}

impl ExchangeActions {
    pub fn change_from_currency(&self, currency: Currency) {
        self.link.set_state(move |state, _| {
            state.from.currency = currency;
            state.update_resulting_amount();
        });
    }

    pub fn change_to_currency(&self, currency: Currency) {
        self.link.set_state(move |state, _| {
            state.to.currency = currency;
            state.update_resulting_amount();
        });
    }

    pub fn change_amount(&self, amount: f64) {
        self.link.set_state(move |state, _| {
            state.from.amount = amount;
            state.update_resulting_amount();
        });
    }

    /// Pulls a fresh table from the rate source. A failed fetch keeps the
    /// rates already shown.
    pub fn update_rates(&self) {
        match self.source.fetch() {
            Ok(rates) => {
                log::debug!("rates refreshed for {}", self.link.id());
                self.link.set_state(move |state, _| {
                    state.rates = Some(rates);
                    state.update_resulting_amount();
                });
            }
            Err(err) => log::warn!("rate refresh failed: {err}"),
        }
    }

    fn on_amount_change(&self) -> Callback<f64> {
        let actions = self.clone();
        Callback::new(move |amount| actions.change_amount(amount))
    }

    fn on_from_currency_change(&self) -> Callback<Currency> {
        let actions = self.clone();
        Callback::new(move |currency| actions.change_from_currency(currency))
    }

    fn on_to_currency_change(&self) -> Callback<Currency> {
        let actions = self.clone();
        Callback::new(move |currency| actions.change_to_currency(currency))
    }
}

impl fmt::Debug for ExchangeActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeActions")
            .field("link", &self.link)
            .finish()
    }
}
