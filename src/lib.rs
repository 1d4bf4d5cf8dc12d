//! Bracket Trader - one-shot protected order placement
//!
//! This library places an entry order with a paired stop-loss and
//! take-profit on a perpetuals venue, sizing the entry from available
//! margin and retrying transient venue failures with exponential backoff.

pub mod bus;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod exchange;
pub mod services;

// Re-export commonly used types
pub use bus::EventBus;
pub use config::AppConfig;
pub use error::{BracketError, PipelineAbort, VenueError};
pub use events::Event;
pub use exchange::types::{Direction, OrderAck, OrderRequest, TradePlan};
pub use services::orchestrator::{BracketReport, BracketRequest, OrderOrchestrator, PipelineStage};
pub use services::retry::{RetryExecutor, RetryPolicy};
