use std::time::Duration;

use crate::exchange::types::OrderLeg;
use crate::services::orchestrator::PipelineStage;

/// Published before each backoff wait.
#[derive(Clone, Debug)]
pub struct RetryNotice {
    pub operation: String,
    /// 1-based number of the attempt that failed
    pub attempt: u32,
    pub max_attempts: u32,
    pub delay: Duration,
    pub cause: String,
}

#[derive(Clone, Debug)]
pub struct OrderReport {
    pub symbol: String,
    pub leg: OrderLeg,
    pub order_id: String,
    pub status: String,
}

// Global Event Enum
#[derive(Clone, Debug)]
pub enum Event {
    RetryScheduled(RetryNotice),
    StageReached(PipelineStage),
    OrderAcknowledged(OrderReport),
    PipelineAborted { stage: PipelineStage, reason: String },
}
