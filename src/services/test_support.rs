//! Scripted in-memory venue for the service tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use crate::bus::EventBus;
use crate::error::VenueError;
use crate::events::Event;
use crate::exchange::traits::{VenueApi, VenueResult};
use crate::exchange::types::OrderRequest;
use crate::services::retry::{RetryExecutor, RetryPolicy};

struct Script {
    queued: VecDeque<VenueResult<Value>>,
    fallback: VenueResult<Value>,
}

impl Script {
    fn new(fallback: VenueResult<Value>) -> Self {
        Self {
            queued: VecDeque::new(),
            fallback,
        }
    }

    fn next(&mut self) -> VenueResult<Value> {
        self.queued.pop_front().unwrap_or_else(|| self.fallback.clone())
    }
}

pub struct ScriptedVenue {
    account: Mutex<Script>,
    configs: Mutex<Script>,
    ticker: Mutex<Script>,
    orders: Mutex<VecDeque<VenueResult<Value>>>,
    calls: Mutex<Vec<&'static str>>,
    submitted: Mutex<Vec<OrderRequest>>,
}

pub fn balance_response(available: &str) -> Value {
    json!({ "data": { "availableBalance": available } })
}

pub fn configs_response() -> Value {
    json!({
        "data": {
            "contractConfig": {
                "perpetualContract": [
                    { "symbol": "ETH-USDT", "tickSize": "0.01", "stepSize": "0.01" },
                    { "symbol": "BTC-USDT", "tickSize": "0.5", "stepSize": "0.001" }
                ]
            }
        }
    })
}

pub fn ticker_response(last_price: &str) -> Value {
    json!({ "data": [ { "symbol": "BTCUSDT", "lastPrice": last_price } ] })
}

impl ScriptedVenue {
    /// 1000 margin, BTC-USDT at 50000 with tick 0.5 and step 0.001.
    pub fn healthy() -> Self {
        Self {
            account: Mutex::new(Script::new(Ok(balance_response("1000")))),
            configs: Mutex::new(Script::new(Ok(configs_response()))),
            ticker: Mutex::new(Script::new(Ok(ticker_response("50000")))),
            orders: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn push_account(&self, response: VenueResult<Value>) {
        self.account.lock().unwrap().queued.push_back(response);
    }

    pub fn set_account(&self, response: VenueResult<Value>) {
        self.account.lock().unwrap().fallback = response;
    }

    pub fn push_configs(&self, response: VenueResult<Value>) {
        self.configs.lock().unwrap().queued.push_back(response);
    }

    pub fn set_configs(&self, response: VenueResult<Value>) {
        self.configs.lock().unwrap().fallback = response;
    }

    pub fn set_ticker(&self, response: VenueResult<Value>) {
        self.ticker.lock().unwrap().fallback = response;
    }

    pub fn push_ticker(&self, response: VenueResult<Value>) {
        self.ticker.lock().unwrap().queued.push_back(response);
    }

    /// Scripted reply for the next order submission; unscripted ones are accepted.
    pub fn push_order(&self, response: VenueResult<Value>) {
        self.orders.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == name).count()
    }

    /// Every create_order attempt, including retried ones.
    pub fn submitted(&self) -> Vec<OrderRequest> {
        self.submitted.lock().unwrap().clone()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }
}

#[async_trait]
impl VenueApi for ScriptedVenue {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn get_account_balance(&self) -> VenueResult<Value> {
        self.record("get_account_balance");
        let response = self.account.lock().unwrap().next();
        response
    }

    async fn get_configs(&self) -> VenueResult<Value> {
        self.record("get_configs");
        let response = self.configs.lock().unwrap().next();
        response
    }

    async fn get_ticker(&self, _symbol: &str) -> VenueResult<Value> {
        self.record("get_ticker");
        let response = self.ticker.lock().unwrap().next();
        response
    }

    async fn create_order(&self, order: &OrderRequest) -> VenueResult<Value> {
        self.record("create_order");
        let n = {
            let mut submitted = self.submitted.lock().unwrap();
            submitted.push(order.clone());
            submitted.len()
        };
        let scripted = self.orders.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(json!({ "data": { "id": format!("order-{}", n), "status": "PENDING" } }))
        })
    }
}

pub fn transport_error() -> VenueError {
    VenueError::Transport("connection reset".to_string())
}

pub fn rejection(message: &str) -> VenueError {
    VenueError::Rejected {
        code: "20016".to_string(),
        message: message.to_string(),
    }
}

pub fn fast_executor(max_attempts: u32, bus: &EventBus) -> RetryExecutor {
    RetryExecutor::new(
        RetryPolicy {
            max_attempts,
            backoff_base: Duration::from_millis(1),
        },
        bus.clone(),
    )
}

/// Everything published so far.
pub fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}
