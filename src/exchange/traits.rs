use async_trait::async_trait;
use serde_json::Value;

use crate::error::VenueError;

use super::types::OrderRequest;

pub type VenueResult<T> = Result<T, VenueError>;

/// Authenticated collaborator calls the pipeline consumes.
///
/// Responses are returned as raw JSON; shape checks happen in the gateways.
#[async_trait]
pub trait VenueApi: Send + Sync {
    fn name(&self) -> &'static str;

    /// `{ data: { availableBalance } }`
    async fn get_account_balance(&self) -> VenueResult<Value>;

    /// `{ data: { contractConfig: { perpetualContract: [{ symbol, tickSize, stepSize }] } } }`
    async fn get_configs(&self) -> VenueResult<Value>;

    /// `{ data: [{ lastPrice }] }`
    async fn get_ticker(&self, symbol: &str) -> VenueResult<Value>;

    async fn create_order(&self, order: &OrderRequest) -> VenueResult<Value>;
}
