//! Embeddable currency conversion widget built on `vdom-core`.
//!
//! [`mount`] renders an [`ExchangeWidget`] into a container. The host keeps
//! the engine flushed and calls [`ExchangeActions::update_rates`] every
//! [`config::update_interval`].

pub mod components;
pub mod config;
pub mod currency;
pub mod rates;
pub mod refresh;
pub mod state;

pub use components::{Callback, CurrencyPanel, ExchangeActions, ExchangeWidget, RATE_SOURCE_PROP};
pub use currency::{Currency, UnknownCurrency};
pub use rates::{
    calculate_rates, RateError, RateSource, Rates, SharedRateSource, StaticRates, UsdQuoteSource,
    UsdQuotes,
};
pub use refresh::RefreshSchedule;
pub use state::{ExchangeState, Panel};

use vdom_core::{attrs, children, h, AttrValue, Component, Engine, NodeId, RenderError, VNode};

/// Description of a widget that pulls its rates from `source`.
pub fn widget(source: SharedRateSource) -> VNode {
    h(
        ExchangeWidget::unit(),
        Some(attrs! { RATE_SOURCE_PROP => AttrValue::any(source) }),
        children![],
    )
}

/// Renders a widget into `container` and returns its root node.
pub fn mount(
    engine: &mut Engine,
    container: NodeId,
    source: SharedRateSource,
) -> Result<NodeId, RenderError> {
    let root = engine.render(&widget(source), container, None)?;
    log::debug!("exchange widget mounted at node {root}");
    Ok(root)
}

/// Actions of the first widget mounted in `engine`.
pub fn actions(engine: &Engine) -> Option<ExchangeActions> {
    let id = engine.find_component::<ExchangeWidget>()?;
    engine
        .component::<ExchangeWidget>(id)
        .map(ExchangeWidget::actions)
}
