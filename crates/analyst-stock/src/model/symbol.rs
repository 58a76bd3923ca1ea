//! Ticker symbols

use super::ValidationError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static TICKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z0-9][A-Z0-9.\-]{0,9}$").unwrap_or_else(|e| panic!("ticker pattern: {e}"))
});

static EXCHANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z0-9]{1,10}$").unwrap_or_else(|e| panic!("exchange pattern: {e}"))
});

/// Normalized ticker with an optional exchange
///
/// Input is trimmed and uppercased. Tickers are 1 to 10 characters of
/// letters, digits, `.` and `-`, starting with a letter or digit
/// (`BRK.B`, `RDS-A`). Written as `TICKER` or `TICKER:EXCHANGE`.
///
/// ```
/// use analyst_stock::model::StockSymbol;
///
/// let symbol: StockSymbol = " aapl:nasdaq ".parse().unwrap();
/// assert_eq!(symbol.ticker(), "AAPL");
/// assert_eq!(symbol.to_string(), "AAPL:NASDAQ");
/// assert!("VERYLONGSYMBOL".parse::<StockSymbol>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StockSymbol {
    ticker: String,
    exchange: Option<String>,
}

impl StockSymbol {
    /// Validate and normalize `input`
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized = input.trim().to_ascii_uppercase();
        if normalized.is_empty() {
            return Err(ValidationError::new("symbol", "must not be empty"));
        }

        let (ticker, exchange) = match normalized.split_once(':') {
            Some((ticker, exchange)) => (ticker.trim(), Some(exchange.trim())),
            None => (normalized.as_str(), None),
        };

        if !TICKER.is_match(ticker) {
            return Err(ValidationError::new(
                "symbol",
                format!(
                    "'{ticker}' is not a ticker (1-10 letters, digits, '.' or '-', starting with a letter or digit)"
                ),
            ));
        }
        if let Some(exchange) = exchange {
            if !EXCHANGE.is_match(exchange) {
                return Err(ValidationError::new(
                    "symbol",
                    format!("'{exchange}' is not an exchange code"),
                ));
            }
        }

        Ok(Self {
            ticker: ticker.to_string(),
            exchange: exchange.map(str::to_string),
        })
    }

    /// The ticker alone
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    /// Exchange code, when one was given
    pub fn exchange(&self) -> Option<&str> {
        self.exchange.as_deref()
    }

    /// Same ticker, regardless of exchange
    pub fn same_ticker(&self, other: &StockSymbol) -> bool {
        self.ticker == other.ticker
    }
}

impl fmt::Display for StockSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.exchange {
            Some(exchange) => write!(f, "{}:{exchange}", self.ticker),
            None => f.write_str(&self.ticker),
        }
    }
}

impl FromStr for StockSymbol {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for StockSymbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StockSymbol> for String {
    fn from(symbol: StockSymbol) -> Self {
        symbol.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        assert_eq!(StockSymbol::parse("  msft ").unwrap().to_string(), "MSFT");
        assert_eq!(StockSymbol::parse("brk.b").unwrap().ticker(), "BRK.B");

        let listed = StockSymbol::parse("tsla:Nasdaq").unwrap();
        assert_eq!(listed.exchange(), Some("NASDAQ"));
        assert!(listed.same_ticker(&StockSymbol::parse("TSLA").unwrap()));
    }

    #[test]
    fn test_rejections() {
        for bad in ["", "   ", "VERYLONGSYMBOL", "AA PL", "$AAPL", ".AAPL", "AAPL:", "AAPL:NY SE"] {
            let err = StockSymbol::parse(bad).unwrap_err();
            assert_eq!(err.field, "symbol", "input {bad:?}");
        }
    }

    #[test]
    fn test_serde_as_string() {
        let symbol: StockSymbol = serde_json::from_str("\"nvda:nasdaq\"").unwrap();
        assert_eq!(serde_json::to_string(&symbol).unwrap(), "\"NVDA:NASDAQ\"");
        assert!(serde_json::from_str::<StockSymbol>("\"!!\"").is_err());
    }
}
