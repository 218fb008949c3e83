//! The client facade.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use bmx_core::{Balances, BookLevel, OpenOrders, Trade};
use bmx_feed::{normalize, FeedCache, FeedTable};
use bmx_rest::{NewOrder, RestClient};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Default result limit for historical queries.
pub const DEFAULT_QUERY_COUNT: u32 = 500;

/// Unified exchange client: feed-state views plus authenticated REST.
///
/// Both sides are optional collaborators. The REST executor exists only
/// when an API key is configured; the feed cache only when a streaming
/// transport attaches one. Methods needing an absent side fail with
/// [`ClientError::NotConfigured`] instead of issuing doomed requests.
pub struct BitmexClient {
    rest: Option<RestClient>,
    feed: Option<Arc<dyn FeedCache>>,
    symbol: String,
    order_id_prefix: String,
}

impl BitmexClient {
    /// A client without a feed cache. The REST side exists when the
    /// config carries an API key.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        Self::build(config, None)
    }

    /// A client with a feed cache attached as well.
    pub fn with_feed(config: ClientConfig, feed: Arc<dyn FeedCache>) -> ClientResult<Self> {
        Self::build(config, Some(feed))
    }

    fn build(config: ClientConfig, feed: Option<Arc<dyn FeedCache>>) -> ClientResult<Self> {
        // No API key means no REST side at all; signing with an empty
        // secret would only produce doomed requests.
        let rest = if config.api_key.is_empty() {
            None
        } else {
            Some(RestClient::new(config.rest_config())?)
        };
        Ok(Self {
            rest,
            feed,
            symbol: config.symbol,
            order_id_prefix: config.order_id_prefix,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    fn rest(&self) -> ClientResult<&RestClient> {
        self.rest
            .as_ref()
            .ok_or(ClientError::NotConfigured("rest credentials"))
    }

    fn feed(&self) -> ClientResult<&dyn FeedCache> {
        self.feed
            .as_deref()
            .ok_or(ClientError::NotConfigured("feed cache"))
    }

    // ------------------------------------------------------------------
    // Feed-state views
    // ------------------------------------------------------------------

    /// When the given feed table last changed, if ever.
    pub fn last_feed_update(&self, table: FeedTable) -> ClientResult<Option<DateTime<Utc>>> {
        Ok(self.feed()?.last_update(table))
    }

    /// The reported state label of the configured market.
    pub fn market_state(&self) -> ClientResult<String> {
        let rows = self.feed()?.snapshot(FeedTable::Instrument);
        Ok(normalize::market_state(&rows, &self.symbol)?)
    }

    /// Whether the market is in a normal state (`Open` or `Closed`).
    pub fn is_market_in_normal_state(&self) -> ClientResult<bool> {
        Ok(normalize::is_normal_market_state(&self.market_state()?))
    }

    /// Unprocessed order book rows, as the feed delivered them.
    pub fn raw_order_book(&self) -> ClientResult<Vec<Value>> {
        Ok(self.feed()?.snapshot(FeedTable::OrderBookL2))
    }

    /// Price-sorted book view: bids descending, asks ascending.
    pub fn sorted_bids_and_asks(&self) -> ClientResult<(Vec<BookLevel>, Vec<BookLevel>)> {
        let rows = self.feed()?.snapshot(FeedTable::OrderBookL2);
        Ok(normalize::order_book(&rows)?)
    }

    /// Recent public trades ordered by `(timestamp, match_id)`;
    /// `reverse` flips the whole ordering.
    pub fn sorted_recent_trades(&self, reverse: bool) -> ClientResult<Vec<Trade>> {
        let rows = self.feed()?.snapshot(FeedTable::Trade);
        Ok(normalize::recent_trades(&rows, reverse)?)
    }

    /// This client's working orders, split by side and price-sorted.
    /// Only orders whose `clOrdID` carries the configured prefix count.
    pub fn open_orders(&self) -> ClientResult<OpenOrders> {
        let rows = self.feed()?.snapshot(FeedTable::Order);
        Ok(normalize::open_orders(&rows, &self.order_id_prefix)?)
    }

    /// Signed position size for the configured symbol, zero when flat.
    pub fn current_position_size(&self) -> ClientResult<i64> {
        let rows = self.feed()?.snapshot(FeedTable::Position);
        Ok(normalize::position_size(&rows, &self.symbol)?)
    }

    /// Unprocessed account execution rows.
    pub fn raw_account_executions(&self) -> ClientResult<Vec<Value>> {
        Ok(self.feed()?.snapshot(FeedTable::Execution))
    }

    /// Account balances in major currency units.
    pub fn balances(&self) -> ClientResult<Balances> {
        let rows = self.feed()?.snapshot(FeedTable::Margin);
        Ok(normalize::balances(&rows)?)
    }

    // ------------------------------------------------------------------
    // Order management (REST)
    // ------------------------------------------------------------------

    /// Submit orders in bulk. A no-op returning JSON null on an empty
    /// list; otherwise see [`RestClient::place_orders`].
    pub async fn place_orders(
        &self,
        orders: Vec<NewOrder>,
        post_only: bool,
        max_retries: Option<u32>,
    ) -> ClientResult<Value> {
        if orders.is_empty() {
            return Ok(Value::Null);
        }
        Ok(self.rest()?.place_orders(orders, post_only, max_retries).await?)
    }

    /// Close the current position with a market order.
    pub async fn market_close_position(
        &self,
        order: NewOrder,
        max_retries: Option<u32>,
    ) -> ClientResult<Value> {
        Ok(self.rest()?.market_close_position(order, max_retries).await?)
    }

    /// Cancel orders by exchange ID. A no-op on an empty list.
    pub async fn cancel_orders(
        &self,
        order_ids: &[String],
        max_retries: Option<u32>,
    ) -> ClientResult<Value> {
        if order_ids.is_empty() {
            return Ok(Value::Null);
        }
        Ok(self.rest()?.cancel_orders(order_ids, max_retries).await?)
    }

    /// Cancel every order currently in this client's open-orders view.
    pub async fn cancel_all_orders(&self) -> ClientResult<Value> {
        let open = self.open_orders()?;
        let ids: Vec<String> = open.to_vec().into_iter().map(|o| o.order_id).collect();
        info!(count = ids.len(), "Cancelling all open orders");
        self.cancel_orders(&ids, None).await
    }

    // ------------------------------------------------------------------
    // Historical queries (REST)
    // ------------------------------------------------------------------

    /// Raw account orders matching `filter`. `count` defaults to
    /// [`DEFAULT_QUERY_COUNT`].
    pub async fn orders_of_account(
        &self,
        filter: &Value,
        count: Option<u32>,
    ) -> ClientResult<Value> {
        let count = count.unwrap_or(DEFAULT_QUERY_COUNT);
        Ok(self.rest()?.orders_of_account(filter, count).await?)
    }

    /// Raw account positions matching `filter`. `count` defaults to
    /// [`DEFAULT_QUERY_COUNT`].
    pub async fn positions_of_account(
        &self,
        filter: &Value,
        count: Option<u32>,
    ) -> ClientResult<Value> {
        let count = count.unwrap_or(DEFAULT_QUERY_COUNT);
        Ok(self.rest()?.positions_of_account(filter, count).await?)
    }

    /// Account trade history matching `filter`, restricted to real
    /// fills (`execType == "Trade"`) on the configured symbol. `count`
    /// defaults to [`DEFAULT_QUERY_COUNT`].
    pub async fn trade_history(
        &self,
        filter: &Value,
        count: Option<u32>,
    ) -> ClientResult<Vec<Value>> {
        let count = count.unwrap_or(DEFAULT_QUERY_COUNT);
        let response = self.rest()?.trade_history(filter, count).await?;
        Ok(fills_for_symbol(response, &self.symbol))
    }

    /// Raw account margin snapshot.
    pub async fn user_margin(&self) -> ClientResult<Value> {
        Ok(self.rest()?.user_margin().await?)
    }
}

/// Keep only real fills on `symbol` from a trade-history response.
fn fills_for_symbol(response: Value, symbol: &str) -> Vec<Value> {
    match response {
        Value::Array(rows) => rows
            .into_iter()
            .filter(|row| row["symbol"] == symbol && row["execType"] == "Trade")
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bmx_feed::MemoryFeedCache;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn client_with_feed(feed: Arc<MemoryFeedCache>) -> BitmexClient {
        let config = ClientConfig {
            order_id_prefix: "mm_bmx_".to_string(),
            ..ClientConfig::default()
        };
        BitmexClient::with_feed(config, feed).expect("client")
    }

    #[test]
    fn test_feed_views_require_a_cache() {
        let client = BitmexClient::new(ClientConfig::default()).expect("client");
        assert!(matches!(
            client.market_state(),
            Err(ClientError::NotConfigured("feed cache"))
        ));
    }

    #[tokio::test]
    async fn test_rest_methods_require_credentials() {
        // default config carries no API key, so no request may be issued
        let client = BitmexClient::new(ClientConfig::default()).expect("client");

        let order = NewOrder::limit(bmx_core::OrderSide::Buy, 1, 100.0);
        assert!(matches!(
            client.place_orders(vec![order], true, None).await,
            Err(ClientError::NotConfigured("rest credentials"))
        ));
        assert!(matches!(
            client.user_margin().await,
            Err(ClientError::NotConfigured("rest credentials"))
        ));
        assert!(matches!(
            client.trade_history(&json!({}), None).await,
            Err(ClientError::NotConfigured("rest credentials"))
        ));
    }

    #[test]
    fn test_api_key_enables_the_rest_side() {
        let config = ClientConfig {
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            ..ClientConfig::default()
        };
        let client = BitmexClient::new(config).expect("client");
        assert!(client.rest().is_ok());
    }

    #[test]
    fn test_market_state_and_normality() {
        let feed = Arc::new(MemoryFeedCache::new());
        feed.replace(
            FeedTable::Instrument,
            vec![json!({"symbol": "XBTUSD", "state": "Open"})],
        );
        let client = client_with_feed(feed.clone());
        assert_eq!(client.market_state().unwrap(), "Open");
        assert!(client.is_market_in_normal_state().unwrap());

        feed.replace(
            FeedTable::Instrument,
            vec![json!({"symbol": "XBTUSD", "state": "Settlement"})],
        );
        assert!(!client.is_market_in_normal_state().unwrap());
    }

    #[test]
    fn test_sorted_views_over_the_cache() {
        let feed = Arc::new(MemoryFeedCache::new());
        feed.replace(
            FeedTable::OrderBookL2,
            vec![
                json!({"side": "Buy", "price": 100.0, "size": 10}),
                json!({"side": "Sell", "price": 110.0, "size": 5}),
                json!({"side": "Buy", "price": 105.0, "size": 20}),
            ],
        );
        feed.replace(
            FeedTable::Position,
            vec![json!({"symbol": "XBTUSD", "currentQty": -30})],
        );
        feed.replace(
            FeedTable::Margin,
            vec![json!({"withdrawableMargin": 100_000_000i64, "walletBalance": 200_000_000i64})],
        );

        let client = client_with_feed(feed);

        let (bids, asks) = client.sorted_bids_and_asks().unwrap();
        assert_eq!(bids[0].price, 105.0);
        assert_eq!(bids[1].price, 100.0);
        assert_eq!(asks[0].price, 110.0);

        assert_eq!(client.current_position_size().unwrap(), -30);

        let balances = client.balances().unwrap();
        assert_eq!(balances.withdrawable, dec!(1.0));
        assert_eq!(balances.wallet, dec!(2.0));
    }

    #[test]
    fn test_open_orders_view_uses_configured_prefix() {
        let feed = Arc::new(MemoryFeedCache::new());
        feed.replace(
            FeedTable::Order,
            vec![
                json!({
                    "orderID": "o1", "clOrdID": "mm_bmx_a", "side": "Buy",
                    "orderQty": 30, "price": 3968.0,
                    "timestamp": "2019-03-25T07:10:34.290Z"
                }),
                json!({
                    "orderID": "o2", "clOrdID": "foreign_b", "side": "Sell",
                    "orderQty": 10, "price": 3970.0,
                    "timestamp": "2019-03-25T07:10:34.290Z"
                }),
            ],
        );
        let client = client_with_feed(feed);
        let open = client.open_orders().unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open.bids[0].order_id, "o1");
    }

    #[tokio::test]
    async fn test_empty_order_lists_are_no_ops() {
        let client = BitmexClient::new(ClientConfig::default()).expect("client");
        // no HTTP request is issued, so these return immediately
        assert_eq!(client.place_orders(vec![], true, None).await.unwrap(), Value::Null);
        assert_eq!(client.cancel_orders(&[], None).await.unwrap(), Value::Null);
    }

    #[test]
    fn test_fills_for_symbol_filters_symbol_and_exec_type() {
        let response = json!([
            {"symbol": "XBTUSD", "execType": "Trade", "trdMatchID": "t1"},
            {"symbol": "XBTUSD", "execType": "Funding", "trdMatchID": "t2"},
            {"symbol": "ETHUSD", "execType": "Trade", "trdMatchID": "t3"},
        ]);
        let fills = fills_for_symbol(response, "XBTUSD");
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0]["trdMatchID"], "t1");
    }
}
