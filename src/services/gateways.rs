use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

use crate::error::{BracketError, BracketResult, VenueError};
use crate::exchange::traits::VenueApi;
use crate::exchange::types::{AccountSnapshot, PriceQuote, SymbolSpec};

use super::retry::RetryExecutor;

/// Decimal from a JSON string or number. Never goes through f64.
pub fn parse_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        _ => None,
    }
}

/// Account margin reads.
#[derive(Clone)]
pub struct AccountGateway {
    venue: Arc<dyn VenueApi>,
    retry: RetryExecutor,
}

impl AccountGateway {
    pub fn new(venue: Arc<dyn VenueApi>, retry: RetryExecutor) -> Self {
        Self { venue, retry }
    }

    pub async fn fetch_account_snapshot(&self) -> BracketResult<AccountSnapshot> {
        let raw = self
            .retry
            .run("get_account_balance", || self.venue.get_account_balance())
            .await?;

        let field = raw.pointer("/data/availableBalance").ok_or_else(|| {
            BracketError::AccountUnavailable(format!("availableBalance missing: {}", raw))
        })?;
        let available_margin = parse_decimal(field).ok_or_else(|| {
            BracketError::AccountUnavailable(format!("availableBalance not a decimal: {}", field))
        })?;

        debug!(%available_margin, "account snapshot fetched");
        Ok(AccountSnapshot { available_margin })
    }
}

/// Instrument configuration and price reads.
#[derive(Clone)]
pub struct MarketDataGateway {
    venue: Arc<dyn VenueApi>,
    retry: RetryExecutor,
}

impl MarketDataGateway {
    pub fn new(venue: Arc<dyn VenueApi>, retry: RetryExecutor) -> Self {
        Self { venue, retry }
    }

    /// Exact-match lookup in the venue's perpetual contract list.
    pub async fn fetch_symbol_spec(&self, symbol: &str) -> BracketResult<SymbolSpec> {
        let raw = self
            .retry
            .run("get_configs", || self.venue.get_configs())
            .await?;
        find_symbol_spec(&raw, symbol)
    }

    pub async fn fetch_quote(&self, symbol: &str) -> BracketResult<PriceQuote> {
        let raw = self
            .retry
            .run("get_ticker", || self.venue.get_ticker(symbol))
            .await?;
        parse_quote(&raw, symbol)
    }
}

pub fn find_symbol_spec(raw: &Value, symbol: &str) -> BracketResult<SymbolSpec> {
    let contracts = raw
        .pointer("/data/contractConfig/perpetualContract")
        .and_then(|v| v.as_array())
        .ok_or_else(|| BracketError::Venue {
            operation: "get_configs".to_string(),
            source: VenueError::Malformed(
                "data.contractConfig.perpetualContract missing".to_string(),
            ),
        })?;

    let entry = contracts
        .iter()
        .find(|item| item.get("symbol").and_then(|s| s.as_str()) == Some(symbol))
        .ok_or_else(|| BracketError::UnknownSymbol(symbol.to_string()))?;

    let granularity = |key: &str| -> BracketResult<Decimal> {
        let field = entry.get(key).ok_or_else(|| BracketError::Venue {
            operation: "get_configs".to_string(),
            source: VenueError::Malformed(format!("{} missing for {}", key, symbol)),
        })?;
        let value = parse_decimal(field).ok_or_else(|| BracketError::Venue {
            operation: "get_configs".to_string(),
            source: VenueError::Malformed(format!("{} not a decimal for {}: {}", key, symbol, field)),
        })?;
        if value <= Decimal::ZERO {
            return Err(BracketError::InvalidGranularity(value));
        }
        Ok(value)
    };

    Ok(SymbolSpec {
        symbol: symbol.to_string(),
        tick_size: granularity("tickSize")?,
        step_size: granularity("stepSize")?,
    })
}

pub fn parse_quote(raw: &Value, symbol: &str) -> BracketResult<PriceQuote> {
    let unavailable = |reason: String| BracketError::QuoteUnavailable {
        symbol: symbol.to_string(),
        reason,
    };

    let first = raw
        .get("data")
        .and_then(|d| d.as_array())
        .and_then(|items| items.first())
        .ok_or_else(|| unavailable("no ticker data".to_string()))?;
    let field = first
        .get("lastPrice")
        .ok_or_else(|| unavailable("lastPrice missing".to_string()))?;
    let last_price =
        parse_decimal(field).ok_or_else(|| unavailable(format!("lastPrice not a decimal: {}", field)))?;

    if last_price <= Decimal::ZERO {
        return Err(BracketError::InvalidPrice(last_price));
    }
    Ok(PriceQuote { last_price })
}
