// src/catalog.rs
use crate::exchange::Exchange;
use log::{error, info};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{self, Duration, MissedTickBehavior};

/// Immutable set of market ids as listed by the exchange.
#[derive(Debug, Default)]
pub struct Markets(HashSet<String>);

impl Markets {
    /// Exact, case-sensitive membership. Callers upper-case ids before asking.
    pub fn is_supported(&self, market_id: &str) -> bool {
        self.0.contains(market_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Markets {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Markets(iter.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum RefreshStatus {
    Updated { markets: usize },
    /// The exchange could not be reached; the previous snapshot is still served.
    Retained,
}

/// Process-wide catalog. Refresh swaps in a whole new snapshot; readers keep
/// whichever `Arc` they already hold.
#[derive(Default)]
pub struct MarketCatalog {
    current: RwLock<Arc<Markets>>,
}

impl MarketCatalog {
    #[cfg(test)]
    pub fn new(markets: Markets) -> Self {
        Self {
            current: RwLock::new(Arc::new(markets)),
        }
    }

    pub async fn snapshot(&self) -> Arc<Markets> {
        self.current.read().await.clone()
    }

    pub async fn refresh(&self, exchange: &dyn Exchange) -> RefreshStatus {
        match exchange.list_markets().await {
            Ok(ids) => {
                let markets: Markets = ids.into_iter().collect();
                let count = markets.len();
                let mut ids: Vec<&String> = markets.0.iter().collect();
                ids.sort();
                info!("Available markets ({}): {:?}", count, ids);
                *self.current.write().await = Arc::new(markets);
                RefreshStatus::Updated { markets: count }
            }
            Err(e) => {
                error!("Error fetching market list: {}", e);
                RefreshStatus::Retained
            }
        }
    }
}

/// Re-reads the market list every `period`. The first tick is skipped since
/// startup already performed a refresh.
pub async fn refresh_periodically(
    catalog: Arc<MarketCatalog>,
    exchange: Arc<dyn Exchange>,
    period: Duration,
) {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await;
    loop {
        interval.tick().await;
        catalog.refresh(exchange.as_ref()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::stub::StubExchange;

    #[tokio::test]
    async fn refresh_replaces_snapshot() {
        let catalog = MarketCatalog::new(["OLD-CLP"].into_iter().collect());
        let exchange = StubExchange::new().with_markets(&["BTC-CLP", "ETH-CLP"]);

        let before = catalog.snapshot().await;
        let status = catalog.refresh(&exchange).await;
        let after = catalog.snapshot().await;

        assert_eq!(status, RefreshStatus::Updated { markets: 2 });
        assert!(after.is_supported("BTC-CLP"));
        assert!(!after.is_supported("OLD-CLP"));
        // A snapshot taken earlier is never mutated.
        assert!(before.is_supported("OLD-CLP"));
        assert_eq!(before.len(), 1);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_markets() {
        let catalog = MarketCatalog::new(["BTC-CLP"].into_iter().collect());
        let exchange = StubExchange::new();

        assert_eq!(catalog.refresh(&exchange).await, RefreshStatus::Retained);
        assert!(catalog.snapshot().await.is_supported("BTC-CLP"));
    }

    #[tokio::test]
    async fn failed_first_refresh_leaves_catalog_empty() {
        let catalog = MarketCatalog::default();
        assert_eq!(
            catalog.refresh(&StubExchange::new()).await,
            RefreshStatus::Retained
        );
        assert!(catalog.snapshot().await.is_empty());
    }

    #[test]
    fn membership_is_case_sensitive() {
        let markets: Markets = ["BTC-CLP"].into_iter().collect();
        assert!(markets.is_supported("BTC-CLP"));
        assert!(!markets.is_supported("btc-clp"));
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_refresh_picks_up_new_listing() {
        let catalog = Arc::new(MarketCatalog::default());
        let exchange: Arc<dyn Exchange> =
            Arc::new(StubExchange::new().with_markets(&["BTC-CLP"]));

        tokio::spawn(refresh_periodically(
            catalog.clone(),
            exchange,
            Duration::from_secs(60),
        ));

        time::sleep(Duration::from_secs(30)).await;
        assert!(catalog.snapshot().await.is_empty());

        time::sleep(Duration::from_secs(60)).await;
        assert!(catalog.snapshot().await.is_supported("BTC-CLP"));
    }
}
