//! HMAC request signing for the venue's private endpoints.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::VenueError;

type HmacSha256 = Hmac<Sha256>;

/// API credentials, loaded from the environment at startup
#[derive(Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub secret: String,
    pub passphrase: String,
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .field("secret", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

impl ApiCredentials {
    pub fn new(api_key: String, secret: String, passphrase: String) -> Self {
        Self {
            api_key,
            secret,
            passphrase,
        }
    }
}

/// `timestamp + METHOD + path + body`
pub fn build_message(timestamp_ms: i64, method: &str, path: &str, body: &str) -> String {
    format!("{}{}{}{}", timestamp_ms, method.to_uppercase(), path, body)
}

/// Sorted `k=v&k=v` form encoding used both as body and signature payload.
pub fn encode_form(fields: &[(&str, String)]) -> String {
    let mut sorted: Vec<&(&str, String)> = fields.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// base64(HMAC-SHA256(base64(secret), message))
pub fn sign(secret: &str, message: &str) -> Result<String, VenueError> {
    let key = BASE64.encode(secret.as_bytes());
    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|e| VenueError::Signing(format!("HMAC init failed: {}", e)))?;
    mac.update(message.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}
