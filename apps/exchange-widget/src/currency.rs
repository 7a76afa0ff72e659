use std::fmt;
use std::str::FromStr;

/// Currencies the widget can convert between.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Currency {
    Gbp,
    Eur,
    Usd,
}

impl Currency {
    /// ISO 4217 code.
    pub fn code(self) -> &'static str {
        match self {
            Currency::Gbp => "GBP",
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Gbp => "£",
            Currency::Eur => "€",
            Currency::Usd => "$",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCurrency(pub String);

impl fmt::Display for UnknownCurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown currency code {:?}", self.0)
    }
}

impl std::error::Error for UnknownCurrency {}

impl FromStr for Currency {
    type Err = UnknownCurrency;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        match code.trim().to_ascii_uppercase().as_str() {
            "GBP" => Ok(Currency::Gbp),
            "EUR" => Ok(Currency::Eur),
            "USD" => Ok(Currency::Usd),
            _ => Err(UnknownCurrency(code.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_parse_back_case_insensitively() {
        for currency in crate::config::CURRENCIES {
            assert_eq!(currency.code().parse::<Currency>(), Ok(currency));
        }
        assert_eq!(" usd ".parse::<Currency>(), Ok(Currency::Usd));
        assert_eq!(
            "JPY".parse::<Currency>(),
            Err(UnknownCurrency("JPY".to_string()))
        );
    }

    #[test]
    fn symbols_match_codes() {
        assert_eq!(Currency::Gbp.symbol(), "£");
        assert_eq!(Currency::Eur.symbol(), "€");
        assert_eq!(Currency::Usd.to_string(), "USD");
    }
}
