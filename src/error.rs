//! Custom error types for the bracket placement pipeline
//!
//! Collaborator failures (`VenueError`) classify themselves as transient or
//! permanent; pipeline failures (`BracketError`) are what the run reports.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::services::orchestrator::PipelineStage;
use crate::exchange::types::OrderAck;

/// Whether a failed remote call is worth repeating.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureClass {
    Transient,
    Permanent,
}

/// Errors surfaced by a venue collaborator call
#[derive(Error, Debug, Clone)]
pub enum VenueError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Empty response received")]
    EmptyResponse,

    #[error("Rejected by venue (code {code}): {message}")]
    Rejected { code: String, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Request signing failed: {0}")]
    Signing(String),
}

impl VenueError {
    /// Explicit transient/permanent split used by the retry executor.
    pub fn failure_class(&self) -> FailureClass {
        match self {
            VenueError::Transport(_) | VenueError::EmptyResponse => FailureClass::Transient,
            VenueError::Http { status, .. } if *status == 429 || *status >= 500 => {
                FailureClass::Transient
            }
            VenueError::Http { .. }
            | VenueError::Rejected { .. }
            | VenueError::Malformed(_)
            | VenueError::Signing(_) => FailureClass::Permanent,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.failure_class() == FailureClass::Transient
    }
}

impl From<reqwest::Error> for VenueError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => VenueError::Http {
                status: status.as_u16(),
                body: err.to_string(),
            },
            None if err.is_decode() => VenueError::Malformed(err.to_string()),
            None => VenueError::Transport(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for VenueError {
    fn from(err: serde_json::Error) -> Self {
        VenueError::Malformed(err.to_string())
    }
}

/// Top-level pipeline errors
#[derive(Error, Debug)]
pub enum BracketError {
    #[error("Invalid direction '{0}' (expected buy or sell)")]
    InvalidDirection(String),

    #[error("Invalid leverage {0}: must be positive")]
    InvalidLeverage(Decimal),

    #[error("Invalid price {0}: must be positive")]
    InvalidPrice(Decimal),

    #[error("Invalid granularity {0}: must be positive")]
    InvalidGranularity(Decimal),

    #[error("Invalid {name} {value}: must be positive")]
    InvalidPercent { name: &'static str, value: Decimal },

    #[error("Arithmetic overflow computing {0}")]
    ArithmeticOverflow(&'static str),

    #[error("Invalid argument {name}: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("Symbol data not found for {0}")]
    UnknownSymbol(String),

    #[error("Account balance unavailable: {0}")]
    AccountUnavailable(String),

    #[error("Quote unavailable for {symbol}: {reason}")]
    QuoteUnavailable { symbol: String, reason: String },

    #[error("{operation} failed after {attempts} attempts: {last_cause}")]
    ExhaustedRetries {
        operation: String,
        attempts: u32,
        last_cause: VenueError,
    },

    #[error("{operation} failed: {source}")]
    Venue {
        operation: String,
        #[source]
        source: VenueError,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BracketError {
    /// Validation failures that were raised before any order reached the venue.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BracketError::InvalidDirection(_)
                | BracketError::InvalidLeverage(_)
                | BracketError::InvalidPrice(_)
                | BracketError::InvalidGranularity(_)
                | BracketError::InvalidPercent { .. }
                | BracketError::InvalidArgument { .. }
                | BracketError::ArithmeticOverflow(_)
        )
    }
}

impl From<serde_yaml::Error> for BracketError {
    fn from(err: serde_yaml::Error) -> Self {
        BracketError::Config(err.to_string())
    }
}

/// Terminal failure of the orchestrator.
///
/// Orders already accepted by the venue are listed in `submitted`; they are
/// left outstanding.
#[derive(Error, Debug)]
#[error("Pipeline aborted after {stage}: {error}")]
pub struct PipelineAbort {
    pub stage: PipelineStage,
    #[source]
    pub error: BracketError,
    pub submitted: Vec<OrderAck>,
}

impl PipelineAbort {
    pub fn has_outstanding_orders(&self) -> bool {
        !self.submitted.is_empty()
    }

    /// Process exit status: 2 when the inputs were rejected before anything
    /// reached the venue, 1 for every other failure.
    pub fn exit_code(&self) -> u8 {
        if self.error.is_validation() && !self.has_outstanding_orders() {
            2
        } else {
            1
        }
    }
}

pub type BracketResult<T> = Result<T, BracketError>;
