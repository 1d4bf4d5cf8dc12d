use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::bus::EventBus;
use crate::constants::events;
use crate::error::{BracketError, BracketResult, PipelineAbort};
use crate::events::{Event, OrderReport};
use crate::exchange::traits::VenueApi;
use crate::exchange::types::{
    AccountSnapshot, Direction, OrderAck, OrderKind, OrderLeg, OrderRequest, PriceQuote,
    SymbolSpec, TimeInForce, TradePlan, TriggerPriceType,
};

use super::bracket::compute_prices;
use super::gateways::{AccountGateway, MarketDataGateway};
use super::retry::RetryExecutor;
use super::sizing::compute_size;

/// Progress of one run. Abort can happen after any stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineStage {
    Start,
    AccountFetched,
    SpecFetched,
    QuoteFetched,
    PlanComputed,
    EntrySubmitted,
    StopSubmitted,
    TakeProfitSubmitted,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineStage::Start => "start",
            PipelineStage::AccountFetched => "account_fetched",
            PipelineStage::SpecFetched => "spec_fetched",
            PipelineStage::QuoteFetched => "quote_fetched",
            PipelineStage::PlanComputed => "plan_computed",
            PipelineStage::EntrySubmitted => "entry_submitted",
            PipelineStage::StopSubmitted => "stop_submitted",
            PipelineStage::TakeProfitSubmitted => "take_profit_submitted",
        };
        f.write_str(s)
    }
}

/// Validated invocation: `<symbol> <direction> <leverage> <tp_percent> <sl_percent>`.
#[derive(Clone, Debug, PartialEq)]
pub struct BracketRequest {
    pub symbol: String,
    pub direction: Direction,
    pub leverage: Decimal,
    pub tp_percent: Decimal,
    pub sl_percent: Decimal,
}

impl BracketRequest {
    pub const ARG_COUNT: usize = 5;

    pub fn from_args<S: AsRef<str>>(args: &[S]) -> BracketResult<Self> {
        if args.len() != Self::ARG_COUNT {
            return Err(BracketError::InvalidArgument {
                name: "arguments",
                reason: format!("expected {}, got {}", Self::ARG_COUNT, args.len()),
            });
        }

        let symbol = args[0].as_ref().trim();
        if symbol.is_empty() {
            return Err(BracketError::InvalidArgument {
                name: "symbol",
                reason: "must not be empty".to_string(),
            });
        }
        let direction = Direction::from_str(args[1].as_ref())?;

        let leverage = parse_arg("leverage", args[2].as_ref())?;
        if leverage <= Decimal::ZERO {
            return Err(BracketError::InvalidLeverage(leverage));
        }
        let tp_percent = parse_percent("tp_percent", args[3].as_ref())?;
        let sl_percent = parse_percent("sl_percent", args[4].as_ref())?;

        Ok(Self {
            symbol: symbol.to_string(),
            direction,
            leverage,
            tp_percent,
            sl_percent,
        })
    }
}

fn parse_arg(name: &'static str, raw: &str) -> BracketResult<Decimal> {
    Decimal::from_str(raw.trim()).map_err(|e| BracketError::InvalidArgument {
        name,
        reason: format!("'{}' is not a decimal ({})", raw, e),
    })
}

fn parse_percent(name: &'static str, raw: &str) -> BracketResult<Decimal> {
    let value = parse_arg(name, raw)?;
    if value <= Decimal::ZERO {
        return Err(BracketError::InvalidPercent { name, value });
    }
    Ok(value)
}

/// Acknowledgments of a fully placed bracket.
#[derive(Clone, Debug)]
pub struct BracketReport {
    pub plan: TradePlan,
    pub entry: OrderAck,
    pub stop_loss: OrderAck,
    pub take_profit: OrderAck,
}

/// Builds the plan from the three reads. Pure.
pub fn build_plan(
    request: &BracketRequest,
    account: &AccountSnapshot,
    spec: &SymbolSpec,
    quote: &PriceQuote,
) -> BracketResult<TradePlan> {
    let quantity = compute_size(
        account.available_margin,
        request.leverage,
        quote.last_price,
        spec.step_size,
    )?;
    let prices = compute_prices(
        request.direction,
        quote.last_price,
        request.tp_percent,
        request.sl_percent,
        spec.tick_size,
    )?;
    Ok(TradePlan {
        symbol: request.symbol.clone(),
        direction: request.direction,
        quantity,
        entry_price: quote.last_price,
        stop_price: prices.stop,
        take_profit_price: prices.take_profit,
    })
}

pub fn entry_order(plan: &TradePlan, timestamp_seconds: i64) -> OrderRequest {
    OrderRequest {
        symbol: plan.symbol.clone(),
        side: plan.direction,
        kind: OrderKind::Market,
        quantity: plan.quantity,
        price: plan.entry_price,
        trigger_price: None,
        trigger_price_type: None,
        time_in_force: TimeInForce::GoodTilCancel,
        reduce_only: false,
        is_position_tpsl: false,
        client_id: uuid::Uuid::new_v4().to_string(),
        timestamp_seconds,
    }
}

pub fn stop_order(plan: &TradePlan, timestamp_seconds: i64) -> OrderRequest {
    protective_order(plan, OrderKind::StopMarket, plan.stop_price, timestamp_seconds)
}

pub fn take_profit_order(plan: &TradePlan, timestamp_seconds: i64) -> OrderRequest {
    protective_order(plan, OrderKind::TakeProfitMarket, plan.take_profit_price, timestamp_seconds)
}

/// Reduce-only leg on the opposite side, triggered off the index price.
fn protective_order(
    plan: &TradePlan,
    kind: OrderKind,
    trigger: Decimal,
    timestamp_seconds: i64,
) -> OrderRequest {
    OrderRequest {
        symbol: plan.symbol.clone(),
        side: plan.direction.opposite(),
        kind,
        quantity: plan.quantity,
        price: trigger,
        trigger_price: Some(trigger),
        trigger_price_type: Some(TriggerPriceType::Index),
        time_in_force: TimeInForce::GoodTilCancel,
        reduce_only: true,
        is_position_tpsl: true,
        client_id: uuid::Uuid::new_v4().to_string(),
        timestamp_seconds,
    }
}

fn ack_from(leg: OrderLeg, raw: Value) -> OrderAck {
    let field = |key: &str| {
        raw.pointer(&format!("/data/{}", key))
            .and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .unwrap_or_else(|| "unknown".to_string())
    };
    let id = field("id");
    let status = field("status");
    OrderAck {
        leg,
        id,
        status,
        raw,
    }
}

struct Progress<'a> {
    stage: PipelineStage,
    submitted: Vec<OrderAck>,
    bus: &'a EventBus,
}

impl<'a> Progress<'a> {
    fn new(bus: &'a EventBus) -> Self {
        Self {
            stage: PipelineStage::Start,
            submitted: Vec::new(),
            bus,
        }
    }

    fn advance(&mut self, stage: PipelineStage) {
        self.stage = stage;
        info!(event = events::STAGE_REACHED, %stage, "pipeline stage reached");
        self.bus.emit(Event::StageReached(stage));
    }

    fn abort(self, error: BracketError) -> PipelineAbort {
        let outstanding: Vec<&str> = self.submitted.iter().map(|a| a.id.as_str()).collect();
        error!(
            event = events::PIPELINE_ABORTED,
            stage = %self.stage,
            outstanding = ?outstanding,
            "Error placing order: {}",
            error
        );
        self.bus.emit(Event::PipelineAborted {
            stage: self.stage,
            reason: error.to_string(),
        });
        PipelineAbort {
            stage: self.stage,
            error,
            submitted: self.submitted,
        }
    }
}

/// Sequences reads, planning and the three order submissions of one run.
pub struct OrderOrchestrator {
    venue: Arc<dyn VenueApi>,
    account: AccountGateway,
    market: MarketDataGateway,
    retry: RetryExecutor,
    bus: EventBus,
}

impl OrderOrchestrator {
    pub fn new(venue: Arc<dyn VenueApi>, retry: RetryExecutor, bus: EventBus) -> Self {
        Self {
            account: AccountGateway::new(venue.clone(), retry.clone()),
            market: MarketDataGateway::new(venue.clone(), retry.clone()),
            venue,
            retry,
            bus,
        }
    }

    /// Places entry, stop and take-profit in that order.
    ///
    /// Nothing is unwound on failure: orders accepted before the abort stay
    /// live and are returned in `PipelineAbort::submitted`.
    pub async fn place_bracket(&self, request: &BracketRequest) -> Result<BracketReport, PipelineAbort> {
        let mut progress = Progress::new(&self.bus);
        match self.run(request, &mut progress).await {
            Ok(report) => Ok(report),
            Err(e) => Err(progress.abort(e)),
        }
    }

    async fn run(&self, request: &BracketRequest, progress: &mut Progress<'_>) -> BracketResult<BracketReport> {
        info!(
            venue = self.venue.name(),
            symbol = %request.symbol,
            direction = %request.direction,
            "placing bracket"
        );

        let account = self.account.fetch_account_snapshot().await?;
        progress.advance(PipelineStage::AccountFetched);

        let spec = self.market.fetch_symbol_spec(&request.symbol).await?;
        progress.advance(PipelineStage::SpecFetched);

        let quote = self.market.fetch_quote(&request.symbol).await?;
        progress.advance(PipelineStage::QuoteFetched);

        let plan = build_plan(request, &account, &spec, &quote)?;
        if plan.quantity.is_zero() {
            warn!(symbol = %plan.symbol, margin = %account.available_margin, "computed position size is zero");
        }
        info!("Trade plan: {}", plan);
        progress.advance(PipelineStage::PlanComputed);

        let now = chrono::Utc::now().timestamp();
        let entry = self.submit(OrderLeg::Entry, entry_order(&plan, now)).await?;
        progress.submitted.push(entry.clone());
        progress.advance(PipelineStage::EntrySubmitted);

        let now = chrono::Utc::now().timestamp();
        let stop_loss = self
            .submit(OrderLeg::StopLoss, stop_order(&plan, now))
            .await?;
        progress.submitted.push(stop_loss.clone());
        progress.advance(PipelineStage::StopSubmitted);

        let now = chrono::Utc::now().timestamp();
        let take_profit = self
            .submit(OrderLeg::TakeProfit, take_profit_order(&plan, now))
            .await?;
        progress.submitted.push(take_profit.clone());
        progress.advance(PipelineStage::TakeProfitSubmitted);

        Ok(BracketReport {
            plan,
            entry,
            stop_loss,
            take_profit,
        })
    }

    /// One submission, retried as a unit. Retries resend the same client id.
    async fn submit(&self, leg: OrderLeg, order: OrderRequest) -> BracketResult<OrderAck> {
        let operation = format!("create_order({})", leg);
        let raw = self
            .retry
            .run(&operation, || self.venue.create_order(&order))
            .await?;
        let ack = ack_from(leg, raw);

        info!(
            event = events::ORDER_ACKNOWLEDGED,
            %leg,
            order_id = %ack.id,
            status = %ack.status,
            side = %order.side,
            qty = %order.quantity,
            price = %order.price,
            "order acknowledged"
        );
        self.bus.emit(Event::OrderAcknowledged(OrderReport {
            symbol: order.symbol.clone(),
            leg,
            order_id: ack.id.clone(),
            status: ack.status.clone(),
        }));
        Ok(ack)
    }
}
