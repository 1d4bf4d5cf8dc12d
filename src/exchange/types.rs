use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BracketError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub available_margin: Decimal,
}

/// Instrument granularities. Both are strictly positive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SymbolSpec {
    pub symbol: String,
    pub tick_size: Decimal,
    pub step_size: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub last_price: Decimal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Buy => Direction::Sell,
            Direction::Sell => Direction::Buy,
        }
    }

    pub fn as_wire(self) -> &'static str {
        match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
        }
    }
}

impl FromStr for Direction {
    type Err = BracketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("buy") {
            Ok(Direction::Buy)
        } else if s.eq_ignore_ascii_case("sell") {
            Ok(Direction::Sell)
        } else {
            Err(BracketError::InvalidDirection(s.to_string()))
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderKind {
    Market,
    StopMarket,
    TakeProfitMarket,
}

impl OrderKind {
    pub fn as_wire(self) -> &'static str {
        match self {
            OrderKind::Market => "MARKET",
            OrderKind::StopMarket => "STOP_MARKET",
            OrderKind::TakeProfitMarket => "TAKE_PROFIT_MARKET",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeInForce {
    GoodTilCancel,
}

impl TimeInForce {
    pub fn as_wire(self) -> &'static str {
        match self {
            TimeInForce::GoodTilCancel => "GOOD_TIL_CANCEL",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerPriceType {
    Index,
}

impl TriggerPriceType {
    pub fn as_wire(self) -> &'static str {
        match self {
            TriggerPriceType::Index => "INDEX",
        }
    }
}

/// Which part of the bracket an order belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderLeg {
    Entry,
    StopLoss,
    TakeProfit,
}

impl fmt::Display for OrderLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderLeg::Entry => "entry",
            OrderLeg::StopLoss => "stop_loss",
            OrderLeg::TakeProfit => "take_profit",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Direction,
    pub kind: OrderKind,
    pub quantity: Decimal,
    /// Worst acceptable price for the entry; the trigger price for bracket legs.
    pub price: Decimal,
    pub trigger_price: Option<Decimal>,
    pub trigger_price_type: Option<TriggerPriceType>,
    pub time_in_force: TimeInForce,
    pub reduce_only: bool,
    pub is_position_tpsl: bool,
    pub client_id: String,
    pub timestamp_seconds: i64,
}

impl OrderRequest {
    /// Form fields in the venue's wire naming, sorted by key.
    pub fn to_form(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("clientId", self.client_id.clone()),
            ("price", self.price.to_string()),
            ("side", self.side.as_wire().to_string()),
            ("size", self.quantity.to_string()),
            ("symbol", self.symbol.clone()),
            ("timeInForce", self.time_in_force.as_wire().to_string()),
            ("timestampSeconds", self.timestamp_seconds.to_string()),
            ("type", self.kind.as_wire().to_string()),
        ];
        if let Some(trigger) = self.trigger_price {
            fields.push(("triggerPrice", trigger.to_string()));
        }
        if let Some(basis) = self.trigger_price_type {
            fields.push(("triggerPriceType", basis.as_wire().to_string()));
        }
        if self.reduce_only {
            fields.push(("reduceOnly", "true".to_string()));
        }
        if self.is_position_tpsl {
            fields.push(("isPositionTpsl", "true".to_string()));
        }
        fields.sort_by(|a, b| a.0.cmp(b.0));
        fields
    }
}

/// Venue acknowledgment of an accepted submission.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderAck {
    pub leg: OrderLeg,
    pub id: String,
    pub status: String,
    pub raw: Value,
}

/// Fully determines the three order submissions of one run.
#[derive(Clone, Debug, PartialEq)]
pub struct TradePlan {
    pub symbol: String,
    pub direction: Direction,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub stop_price: Decimal,
    pub take_profit_price: Decimal,
}

impl fmt::Display for TradePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} qty={} entry={} sl={} tp={}",
            self.direction,
            self.symbol,
            self.quantity,
            self.entry_price,
            self.stop_price,
            self.take_profit_price
        )
    }
}
