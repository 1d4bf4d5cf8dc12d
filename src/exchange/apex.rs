//! ApeX Omni perpetuals adapter (REST, v3 endpoints).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde_json::Value;
use tracing::debug;

use super::{
    signing::{build_message, encode_form, sign, ApiCredentials},
    traits::{VenueApi, VenueResult},
    types::OrderRequest,
};

use crate::config::VenueConfig;
use crate::error::VenueError;

const ACCOUNT_BALANCE_PATH: &str = "/v3/account-balance";
const CONFIGS_PATH: &str = "/v3/symbols";
const TICKER_PATH: &str = "/v3/ticker";
const ORDER_PATH: &str = "/v3/order";

#[derive(Clone)]
pub struct ApexClient {
    client: Client,
    base_url: String,
    credentials: ApiCredentials,
}

impl ApexClient {
    pub fn new(config: &VenueConfig, credentials: ApiCredentials) -> VenueResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn url(&self, endpoint: &str) -> VenueResult<Url> {
        Url::parse(&format!("{}{}", self.base_url, endpoint))
            .map_err(|e| VenueError::Transport(format!("invalid url for {}: {}", endpoint, e)))
    }

    fn auth_headers(
        &self,
        req: RequestBuilder,
        method: &str,
        path: &str,
        body: &str,
    ) -> VenueResult<RequestBuilder> {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let message = build_message(timestamp, method, path, body);
        let signature = sign(&self.credentials.secret, &message)?;
        Ok(req
            .header("APEX-API-KEY", &self.credentials.api_key)
            .header("APEX-PASSPHRASE", &self.credentials.passphrase)
            .header("APEX-TIMESTAMP", timestamp.to_string())
            .header("APEX-SIGNATURE", signature))
    }

    async fn signed_get(&self, endpoint: &str) -> VenueResult<Value> {
        let url = self.url(endpoint)?;
        let req = self.auth_headers(self.client.get(url.clone()), "GET", url.path(), "")?;
        let resp = req.send().await?;
        read_response(resp).await
    }

    async fn public_get(&self, endpoint: &str, query: &[(&str, &str)]) -> VenueResult<Value> {
        let url = self.url(endpoint)?;
        let resp = self.client.get(url).query(query).send().await?;
        read_response(resp).await
    }

    async fn signed_post_form(&self, endpoint: &str, fields: &[(&str, String)]) -> VenueResult<Value> {
        let url = self.url(endpoint)?;
        let body = encode_form(fields);
        let req = self
            .auth_headers(self.client.post(url.clone()), "POST", url.path(), &body)?
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body);
        let resp = req.send().await?;
        read_response(resp).await
    }
}

async fn read_response(resp: reqwest::Response) -> VenueResult<Value> {
    let status = resp.status().as_u16();
    let text = resp.text().await?;
    interpret_body(status, &text)
}

/// Maps an HTTP status and body onto the venue error taxonomy.
pub fn interpret_body(status: u16, text: &str) -> VenueResult<Value> {
    if !(200..300).contains(&status) {
        return Err(VenueError::Http {
            status,
            body: text.to_string(),
        });
    }
    if text.trim().is_empty() {
        return Err(VenueError::EmptyResponse);
    }
    let raw: Value = serde_json::from_str(text)
        .map_err(|e| VenueError::Malformed(format!("{} (body: {})", e, text)))?;
    if raw.is_null() {
        return Err(VenueError::EmptyResponse);
    }

    // Business rejections come back as 200 with a non-zero code and no data.
    if raw.get("data").is_none() {
        if let Some(code) = raw.get("code").filter(|c| !is_success_code(c)) {
            let message = raw
                .get("msg")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown")
                .to_string();
            return Err(VenueError::Rejected {
                code: code.to_string(),
                message,
            });
        }
    }
    Ok(raw)
}

fn is_success_code(code: &Value) -> bool {
    match code {
        Value::Number(n) => n.as_i64() == Some(0),
        Value::String(s) => s == "0",
        _ => false,
    }
}

#[async_trait]
impl VenueApi for ApexClient {
    fn name(&self) -> &'static str {
        "apex"
    }

    async fn get_account_balance(&self) -> VenueResult<Value> {
        self.signed_get(ACCOUNT_BALANCE_PATH).await
    }

    async fn get_configs(&self) -> VenueResult<Value> {
        self.signed_get(CONFIGS_PATH).await
    }

    async fn get_ticker(&self, symbol: &str) -> VenueResult<Value> {
        self.public_get(TICKER_PATH, &[("symbol", symbol)]).await
    }

    async fn create_order(&self, order: &OrderRequest) -> VenueResult<Value> {
        let fields = order.to_form();
        debug!(symbol = %order.symbol, kind = order.kind.as_wire(), "submitting order");
        self.signed_post_form(ORDER_PATH, &fields).await
    }
}
