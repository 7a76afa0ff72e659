use vdom_core::{attrs, children, h, Child, Component, Context, Handler, Link, Props, VNode, View};

use super::Callback;
use crate::config::CURRENCIES;
use crate::currency::Currency;

/// One side of the widget: currency label, amount, rate caption and the
/// currency switch.
///
/// Props: `currency`, `secondCurrency` (codes), `amount`, `rate`,
/// `editable`, `onAmountChange` (`Callback<f64>`) and `onCurrencyChange`
/// (`Callback<Currency>`).
pub struct CurrencyPanel;

impl Component for CurrencyPanel {
    type State = ();

    fn create(_props: &Props, _context: &Context, _link: Link<Self>) -> Self {
        CurrencyPanel
    }

    fn render(&self, view: View<'_, Self>) -> Option<VNode> {
        let props = view.props;
        let currency = currency_prop(props, "currency");
        let amount = props.get_f64("amount").unwrap_or(0.0);

        let amount_control = if props.get_bool("editable") {
            let on_amount = props.get_any::<Callback<f64>>("onAmountChange");
            h(
                "input",
                Some(attrs! {
                    "type" => "number",
                    "class" => "CurrencyPanel_amount",
                    "value" => amount,
                    "onInput" => Handler::new(move |event| {
                        if let Some(on_amount) = &on_amount {
                            on_amount.emit(parse_amount(event.value.as_deref()));
                        }
                    }),
                }),
                children![],
            )
        } else {
            h(
                "div",
                Some(attrs! { "class" => "CurrencyPanel_amount" }),
                children![format!("{amount:.2}")],
            )
        };

        let caption = rate_caption(
            currency,
            currency_prop(props, "secondCurrency"),
            props.get_f64("rate"),
        );

        let on_currency = props.get_any::<Callback<Currency>>("onCurrencyChange");
        let buttons: Vec<Child> = CURRENCIES
            .iter()
            .map(|&choice| {
                let on_currency = on_currency.clone();
                h(
                    "button",
                    Some(attrs! {
                        "class" => "CurrencyPanel_switchButton",
                        "onClick" => Handler::new(move |_| {
                            if let Some(on_currency) = &on_currency {
                                on_currency.emit(choice);
                            }
                        }),
                    }),
                    children![choice.code()],
                )
                .into()
            })
            .collect();

        Some(h(
            "div",
            Some(attrs! { "class" => "CurrencyPanel" }),
            children![
                h(
                    "div",
                    Some(attrs! { "class" => "CurrencyPanel_currency" }),
                    children![currency.map(Currency::code)],
                ),
                amount_control,
                h(
                    "div",
                    Some(attrs! { "class" => "CurrencyPanel_rate" }),
                    children![caption],
                ),
                h("div", Some(attrs! { "class" => "CurrencyPanel_switch" }), buttons),
            ],
        ))
    }
}

fn currency_prop(props: &Props, name: &str) -> Option<Currency> {
    let code = props.get_str(name)?;
    match code.parse() {
        Ok(currency) => Some(currency),
        Err(err) => {
            log::warn!("{name}: {err}");
            None
        }
    }
}

/// Typed amount; blank or malformed input counts as zero.
fn parse_amount(raw: Option<&str>) -> f64 {
    raw.and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|amount| amount.is_finite())
        .unwrap_or(0.0)
}

/// `"£ 1 = € 1.1239"`, or empty while the rate is unknown or zero.
fn rate_caption(currency: Option<Currency>, second: Option<Currency>, rate: Option<f64>) -> String {
    let rate = rate.filter(|rate| *rate != 0.0 && !rate.is_nan());
    match (currency, second, rate) {
        (Some(currency), Some(second), Some(rate)) => {
            format!("{} 1 = {} {rate:.4}", currency.symbol(), second.symbol())
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_uses_symbols_and_four_decimals() {
        assert_eq!(
            rate_caption(Some(Currency::Gbp), Some(Currency::Eur), Some(1.1238673057116992)),
            "£ 1 = € 1.1239"
        );
        assert_eq!(rate_caption(Some(Currency::Gbp), Some(Currency::Eur), None), "");
        assert_eq!(rate_caption(Some(Currency::Gbp), Some(Currency::Eur), Some(0.0)), "");
    }

    #[test]
    fn amounts_parse_leniently() {
        assert_eq!(parse_amount(Some(" 12.5")), 12.5);
        assert_eq!(parse_amount(Some("")), 0.0);
        assert_eq!(parse_amount(Some("abc")), 0.0);
        assert_eq!(parse_amount(Some("inf")), 0.0);
        assert_eq!(parse_amount(None), 0.0);
    }
}
