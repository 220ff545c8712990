// src/exchange.rs
use crate::error::ExchangeError;
use crate::models::{MarketsResponse, TickerResponse};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Upstream market data source.
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Ids of every market the exchange lists, e.g. `BTC-CLP`.
    async fn list_markets(&self) -> Result<Vec<String>, ExchangeError>;

    /// The ticker object for one market, unwrapped from its envelope.
    async fn fetch_ticker(&self, market_id: &str) -> Result<Value, ExchangeError>;
}

/// HTTP client for the Buda REST API (v2).
pub struct BudaClient {
    client: Client,
    base_url: String,
}

impl BudaClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ExchangeError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ExchangeError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExchangeError::Status(status.as_u16()));
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl Exchange for BudaClient {
    async fn list_markets(&self) -> Result<Vec<String>, ExchangeError> {
        let url = format!("{}/markets", self.base_url);
        let response: MarketsResponse = self.get_json(&url).await?;
        Ok(response.markets.into_iter().map(|m| m.id).collect())
    }

    async fn fetch_ticker(&self, market_id: &str) -> Result<Value, ExchangeError> {
        let url = format!("{}/markets/{}/ticker.json", self.base_url, market_id);
        let response: TickerResponse = self.get_json(&url).await?;
        Ok(response.ticker)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use warp::{Filter, Rejection, Reply};

    fn serve<F>(routes: F) -> String
    where
        F: Filter<Error = Rejection> + Clone + Send + Sync + 'static,
        F::Extract: Reply,
    {
        let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        format!("http://{}/api/v2/", addr)
    }

    fn client(base_url: &str) -> BudaClient {
        BudaClient::new(base_url, Duration::from_millis(200)).unwrap()
    }

    #[tokio::test]
    async fn lists_market_ids() {
        let routes = warp::path!("api" / "v2" / "markets").map(|| {
            warp::reply::json(&json!({
                "markets": [
                    { "id": "BTC-CLP", "name": "btc-clp" },
                    { "id": "ETH-CLP", "name": "eth-clp" }
                ]
            }))
        });
        let base = serve(routes);

        let markets = client(&base).list_markets().await.unwrap();
        assert_eq!(markets, vec!["BTC-CLP", "ETH-CLP"]);
    }

    #[tokio::test]
    async fn unwraps_ticker_envelope() {
        let routes = warp::path!("api" / "v2" / "markets" / String / "ticker.json").map(
            |market: String| {
                warp::reply::json(&json!({
                    "ticker": { "market_id": market, "last_price": ["10000000.0", "CLP"] }
                }))
            },
        );
        let base = serve(routes);

        let ticker = client(&base).fetch_ticker("BTC-CLP").await.unwrap();
        assert_eq!(ticker["market_id"], "BTC-CLP");
        assert_eq!(ticker["last_price"][0], "10000000.0");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let routes = warp::path!("api" / "v2" / "markets" / String / "ticker.json").map(
            |_market: String| {
                warp::reply::with_status(
                    warp::reply::json(&json!({ "message": "Not found" })),
                    warp::http::StatusCode::NOT_FOUND,
                )
            },
        );
        let base = serve(routes);

        let err = client(&base).fetch_ticker("XYZ-CLP").await.unwrap_err();
        assert!(matches!(err, ExchangeError::Status(404)), "got {:?}", err);
    }

    #[tokio::test]
    async fn missing_envelope_is_a_payload_error() {
        let routes = warp::path!("api" / "v2" / "markets")
            .map(|| warp::reply::json(&json!({ "data": [] })));
        let base = serve(routes);

        let err = client(&base).list_markets().await.unwrap_err();
        assert!(matches!(err, ExchangeError::Payload(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let routes = warp::path!("api" / "v2" / "markets").and_then(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Ok::<_, Rejection>(warp::reply::json(&json!({ "markets": [] })))
        });
        let base = serve(routes);

        let err = client(&base).list_markets().await.unwrap_err();
        assert!(matches!(err, ExchangeError::Timeout), "got {:?}", err);
    }

    #[tokio::test]
    async fn unreachable_upstream_is_a_network_error() {
        let err = client("http://127.0.0.1:1/api/v2")
            .list_markets()
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::Network(_)), "got {:?}", err);
    }
}
