use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, warn};

use crate::bus::EventBus;
use crate::config::RetryConfig;
use crate::constants::{events, retry};
use crate::error::{BracketError, FailureClass, VenueError};
use crate::events::{Event, RetryNotice};

/// Bounded exponential backoff: the wait after failed attempt `n` (0-based)
/// is `backoff_base * 2^n`.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.clamp(1, retry::MAX_ATTEMPTS_LIMIT),
            backoff_base: config.backoff_base(),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(attempt_index))
    }
}

/// How a retried call ended when it did not succeed.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryError<E> {
    /// Every attempt failed transiently; carries the last cause.
    Exhausted { attempts: u32, last: E },
    /// A permanent failure, returned without retrying.
    Permanent(E),
}

/// Runs remote calls, retrying the ones classified as transient.
#[derive(Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    bus: EventBus,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy, bus: EventBus) -> Self {
        Self { policy, bus }
    }

    /// Retries a venue call using `VenueError::failure_class`.
    pub async fn run<T, F, Fut>(&self, operation: &str, call: F) -> Result<T, BracketError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, VenueError>>,
    {
        match self
            .run_classified(operation, call, VenueError::failure_class)
            .await
        {
            Ok(value) => Ok(value),
            Err(RetryError::Exhausted { attempts, last }) => Err(BracketError::ExhaustedRetries {
                operation: operation.to_string(),
                attempts,
                last_cause: last,
            }),
            Err(RetryError::Permanent(source)) => Err(BracketError::Venue {
                operation: operation.to_string(),
                source,
            }),
        }
    }

    /// Generic form: the caller supplies the transient/permanent classifier.
    pub async fn run_classified<T, E, F, Fut, C>(
        &self,
        operation: &str,
        mut call: F,
        classify: C,
    ) -> Result<T, RetryError<E>>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> FailureClass,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt_index = 0;

        loop {
            let err = match call().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if classify(&err) == FailureClass::Permanent {
                return Err(RetryError::Permanent(err));
            }

            let attempt = attempt_index + 1;
            if attempt >= max_attempts {
                error!(
                    event = events::RETRIES_EXHAUSTED,
                    operation, attempts = attempt, cause = %err,
                    "Failed to execute API call after {} attempts", attempt
                );
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: err,
                });
            }

            let delay = self.policy.delay_for(attempt_index);
            warn!(
                event = events::RETRY_SCHEDULED,
                operation,
                delay_ms = delay.as_millis() as u64,
                "API call failed ({}), retrying {}/{} ...",
                err,
                attempt,
                max_attempts
            );
            self.bus.emit(Event::RetryScheduled(RetryNotice {
                operation: operation.to_string(),
                attempt,
                max_attempts,
                delay,
                cause: err.to_string(),
            }));

            sleep(delay).await;
            attempt_index += 1;
        }
    }
}
