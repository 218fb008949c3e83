//! Retrying REST request executor.
//!
//! One [`RestClient`] owns a connection pool, the credentials, and a
//! retry counter shared by every call made through it. Callers that
//! need independent retry budgets use separate instances. The pool is
//! released when the client drops.

use crate::credential::{expires_after, Credential};
use crate::error::{RestError, RestResult, CODE_TIMEOUT};
use crate::models::NewOrder;
use bmx_core::{ClientOrderId, ExecInst, OrderType};
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Fixed delay before retrying after a connection failure.
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// REST-side configuration, immutable after construction.
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Base endpoint URL, e.g. `https://testnet.bitmex.com/api/v1/`.
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
    /// Trading symbol stamped onto submitted orders.
    pub symbol: String,
    /// Prefix for generated client order IDs.
    pub order_id_prefix: String,
    /// Value of the `user-agent` header.
    pub agent_name: String,
    /// Default transport timeout per attempt.
    pub timeout: Duration,
    /// Signature validity window in seconds.
    pub expiration_window_secs: i64,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: "https://testnet.bitmex.com/api/v1/".to_string(),
            api_key: String::new(),
            api_secret: String::new(),
            symbol: "XBTUSD".to_string(),
            order_id_prefix: String::new(),
            agent_name: "trading_bot".to_string(),
            timeout: Duration::from_secs(7),
            expiration_window_secs: 3600,
        }
    }
}

/// Authenticated REST client with bounded retry/backoff.
#[derive(Debug)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    credential: Credential,
    symbol: String,
    order_id_prefix: String,
    timeout: Duration,
    expiration_window_secs: i64,
    /// Consecutive retries since the last 2xx, shared across calls on
    /// this instance.
    retries: AtomicU32,
}

impl RestClient {
    pub fn new(config: RestConfig) -> RestResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .user_agent(&config.agent_name)
            .default_headers(headers)
            .build()
            .map_err(|e| RestError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url,
            credential: Credential::new(config.api_key, config.api_secret),
            symbol: config.symbol,
            order_id_prefix: config.order_id_prefix,
            timeout: config.timeout,
            expiration_window_secs: config.expiration_window_secs,
            retries: AtomicU32::new(0),
        })
    }

    /// Issue one signed request, retrying per failure category.
    ///
    /// `verb` defaults to POST when a body is present, GET otherwise.
    /// `max_retries` defaults to 0 for POST/PUT and 3 for GET/DELETE;
    /// an explicit value replaces the default. Every attempt (retries
    /// included) is signed afresh with a new expiry.
    pub async fn execute(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
        verb: Option<Method>,
        timeout: Option<Duration>,
        max_retries: Option<u32>,
    ) -> RestResult<Value> {
        let verb = verb.unwrap_or_else(|| default_verb(body.is_some()));
        let max_retries = max_retries.unwrap_or_else(|| default_max_retries(&verb));
        let timeout = timeout.unwrap_or(self.timeout);
        let body_text = match &body {
            Some(value) => serde_json::to_string(value)
                .map_err(|e| RestError::unknown(format!("Failed to encode request body: {e}")))?,
            None => String::new(),
        };

        loop {
            let request = self.build_signed(&verb, path, query, &body_text, timeout)?;
            let url = request.url().to_string();
            info!(verb = %verb, url = %url, "Requesting");

            // Classify the outcome: success and fatal categories return
            // out of the loop; retryable ones fall through with a sleep
            // override (None means the linear-backoff default applies).
            let (sleep_override, failed_code): (Option<Duration>, i64) =
                match self.http.execute(request).await {
                    Ok(response) => {
                        let status = response.status();
                        if status.is_success() {
                            self.retries.store(0, Ordering::Relaxed);
                            let bytes = response.bytes().await.map_err(|e| {
                                RestError::unknown(format!("Failed to read response body: {e}"))
                            })?;
                            if bytes.is_empty() {
                                return Ok(Value::Null);
                            }
                            return serde_json::from_slice(&bytes).map_err(|e| {
                                RestError::unknown(format!("Failed to parse response JSON: {e}"))
                            });
                        }
                        match status.as_u16() {
                            // Auth error. Fatal, never retried.
                            401 => {
                                let text = response.text().await.unwrap_or_default();
                                return Err(RestError::new(text, 401));
                            }
                            // The cancel target is already gone; idempotent success.
                            404 if verb == Method::DELETE => {
                                debug!(url = %url, "DELETE target already absent");
                                return Ok(Value::Null);
                            }
                            404 => {
                                let text = response.text().await.unwrap_or_default();
                                return Err(RestError::new(text, 404));
                            }
                            400 => {
                                let text = response.text().await.unwrap_or_default();
                                warn!(message = %exchange_message(&text), "Exchange rejected request");
                                return Err(RestError::new(text, 400));
                            }
                            // Rate limited: wait out the reset instant, then
                            // retry with no additional delay.
                            429 => {
                                let reset = response
                                    .headers()
                                    .get("x-ratelimit-reset")
                                    .and_then(|v| v.to_str().ok())
                                    .and_then(|s| s.parse::<i64>().ok());
                                // A stale header or clock drift can put the
                                // reset in the past; clamp to zero.
                                let wait = reset
                                    .map(|r| r - Utc::now().timestamp())
                                    .unwrap_or(0)
                                    .max(0);
                                warn!(seconds = wait, "Rate limited. Sleeping until reset.");
                                sleep(Duration::from_secs(wait as u64)).await;
                                (Some(Duration::ZERO), 429)
                            }
                            // Temporary downtime, likely a deploy.
                            503 => {
                                let text = response.text().await.unwrap_or_default();
                                info!(message = %exchange_message(&text), "Service unavailable");
                                (None, 503)
                            }
                            other => {
                                let text = response.text().await.unwrap_or_default();
                                return Err(RestError::new(text, i64::from(other)));
                            }
                        }
                    }
                    Err(err) if err.is_timeout() => {
                        info!(verb = %verb, url = %url, "Request timed out");
                        (Some(Duration::ZERO), CODE_TIMEOUT)
                    }
                    Err(err) if err.is_connect() => {
                        warn!(verb = %verb, url = %url, "Connection error");
                        (Some(CONNECT_RETRY_DELAY), CODE_TIMEOUT)
                    }
                    Err(err) => {
                        return Err(RestError::unknown(format!("Unknown error: {err}")));
                    }
                };

            let attempt = self.retries.fetch_add(1, Ordering::Relaxed) + 1;
            if attempt > max_retries {
                return Err(RestError::new(
                    format!("Max retries on {verb} {url} hit."),
                    failed_code,
                ));
            }
            // Linear backoff unless the category fixed its own delay.
            let delay = sleep_override.unwrap_or_else(|| Duration::from_secs(u64::from(attempt)));
            debug!(attempt, delay_secs = delay.as_secs(), "Retrying request");
            sleep(delay).await;
        }
    }

    fn build_signed(
        &self,
        verb: &Method,
        path: &str,
        query: &[(&str, String)],
        body: &str,
        timeout: Duration,
    ) -> RestResult<reqwest::Request> {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.http.request(verb.clone(), &url).timeout(timeout);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if !body.is_empty() {
            builder = builder.body(body.to_string());
        }
        let mut request = builder
            .build()
            .map_err(|e| RestError::unknown(format!("Failed to build request: {e}")))?;

        let expires = expires_after(Utc::now(), self.expiration_window_secs);
        let signature = self
            .credential
            .sign(verb.as_str(), request.url().as_str(), expires, body);

        let headers = request.headers_mut();
        headers.insert("api-expires", header_value(&expires.to_string())?);
        headers.insert("api-key", header_value(&self.credential.api_key)?);
        headers.insert("api-signature", header_value(&signature)?);
        Ok(request)
    }

    // ------------------------------------------------------------------
    // Order management
    // ------------------------------------------------------------------

    /// Submit multiple orders in one call.
    ///
    /// Orders without a `clOrdID` get a generated one carrying the
    /// configured prefix; the configured symbol is always stamped on.
    /// `post_only` injects the maker-only execution instruction.
    pub async fn place_orders(
        &self,
        orders: Vec<NewOrder>,
        post_only: bool,
        max_retries: Option<u32>,
    ) -> RestResult<Value> {
        let orders: Vec<NewOrder> = orders
            .into_iter()
            .map(|mut order| {
                if order.cl_ord_id.is_none() {
                    order.cl_ord_id =
                        Some(ClientOrderId::generate(&self.order_id_prefix).to_string());
                }
                order.symbol = Some(self.symbol.clone());
                if post_only {
                    order.exec_inst = Some(ExecInst::ParticipateDoNotInitiate);
                }
                order
            })
            .collect();

        self.execute(
            "order/bulk",
            &[],
            Some(json!({ "orders": orders })),
            Some(Method::POST),
            None,
            max_retries,
        )
        .await
    }

    /// Close the current position with a market order.
    pub async fn market_close_position(
        &self,
        mut order: NewOrder,
        max_retries: Option<u32>,
    ) -> RestResult<Value> {
        if order.cl_ord_id.is_none() {
            order.cl_ord_id = Some(ClientOrderId::generate(&self.order_id_prefix).to_string());
        }
        order.symbol = Some(self.symbol.clone());
        order.ord_type = Some(OrderType::Market);
        order.exec_inst = Some(ExecInst::Close);

        let body = serde_json::to_value(&order)
            .map_err(|e| RestError::unknown(format!("Failed to encode order: {e}")))?;
        self.execute("order", &[], Some(body), Some(Method::POST), None, max_retries)
            .await
    }

    /// Cancel existing orders by exchange order ID.
    pub async fn cancel_orders(
        &self,
        order_ids: &[String],
        max_retries: Option<u32>,
    ) -> RestResult<Value> {
        self.execute(
            "order",
            &[],
            Some(json!({ "orderID": order_ids })),
            Some(Method::DELETE),
            None,
            max_retries,
        )
        .await
    }

    // ------------------------------------------------------------------
    // Historical queries
    // ------------------------------------------------------------------

    /// Account trade history matching `filter`.
    pub async fn trade_history(&self, filter: &Value, count: u32) -> RestResult<Value> {
        self.filtered_query("execution/tradeHistory", filter, count).await
    }

    /// Account orders matching `filter`.
    pub async fn orders_of_account(&self, filter: &Value, count: u32) -> RestResult<Value> {
        self.filtered_query("order", filter, count).await
    }

    /// Account positions matching `filter`.
    pub async fn positions_of_account(&self, filter: &Value, count: u32) -> RestResult<Value> {
        self.filtered_query("position", filter, count).await
    }

    /// Account margin snapshot.
    pub async fn user_margin(&self) -> RestResult<Value> {
        self.execute("user/margin", &[], None, Some(Method::GET), None, None)
            .await
    }

    async fn filtered_query(&self, path: &str, filter: &Value, count: u32) -> RestResult<Value> {
        let filter_text = serde_json::to_string(filter)
            .map_err(|e| RestError::unknown(format!("Failed to encode filter: {e}")))?;
        let query = [
            ("count", count.to_string()),
            ("filter", filter_text),
        ];
        self.execute(path, &query, None, Some(Method::GET), None, None)
            .await
    }
}

fn default_verb(has_body: bool) -> Method {
    if has_body {
        Method::POST
    } else {
        Method::GET
    }
}

/// POST and PUT are not idempotent and are not retried by default.
fn default_max_retries(verb: &Method) -> u32 {
    if *verb == Method::POST || *verb == Method::PUT {
        0
    } else {
        3
    }
}

fn header_value(value: &str) -> RestResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| RestError::unknown(format!("Invalid header value: {e}")))
}

/// Pull the exchange-provided `error.message` out of a response body,
/// falling back to the raw text.
fn exchange_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(|m| m.to_lowercase())
        })
        .unwrap_or_else(|| body.to_string())
}
