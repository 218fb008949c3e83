//! API credentials and request signing.
//!
//! A signature is `HMAC_SHA256(secret, verb + path + expires + body)`,
//! hex encoded. The verb is uppercased before signing, the url is
//! reduced to its path (plus query string when present), and the body
//! is the exact JSON text transmitted, or the empty string.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// API key pair. The secret is wiped from memory on drop and is never
/// logged or transmitted; it only ever feeds the HMAC.
#[derive(Clone)]
pub struct Credential {
    pub api_key: String,
    api_secret: Zeroizing<String>,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

impl Credential {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: Zeroizing::new(api_secret.into()),
        }
    }

    /// Sign one request. Pure function of its inputs.
    ///
    /// `url` may be absolute (scheme and host are stripped) or already a
    /// relative path; a query string participates in signing.
    pub fn sign(&self, verb: &str, url: &str, expires: i64, body: &str) -> String {
        let path = signing_path(url);
        let message = format!("{}{}{}{}", verb.to_uppercase(), path, expires, body);

        let mut mac = HmacSha256::new_from_slice(self.api_secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

/// Reduce a URL to the path (plus `?query` when present) that
/// participates in signing. Relative inputs pass through unchanged.
fn signing_path(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(parsed) => match parsed.query() {
            Some(query) => format!("{}?{}", parsed.path(), query),
            None => parsed.path().to_string(),
        },
        Err(_) => url.to_string(),
    }
}

/// Signature expiry: `now + window_secs`, rounded to the nearest whole
/// second. Pure so tests can pin the clock; the executor feeds it
/// `Utc::now()` for each attempt.
pub fn expires_after(now: DateTime<Utc>, window_secs: i64) -> i64 {
    (now.timestamp_millis() + 500).div_euclid(1000) + window_secs
}
