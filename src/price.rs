// src/price.rs
use crate::error::ExchangeError;
use crate::exchange::Exchange;
use log::warn;
use serde_json::Value;

/// Latest traded price for `market_id`, or `None` if the exchange could not provide one.
pub async fn get_price(exchange: &dyn Exchange, market_id: &str) -> Option<f64> {
    let price = match exchange.fetch_ticker(market_id).await {
        Ok(ticker) => last_price(&ticker),
        Err(e) => Err(e),
    };
    match price {
        Ok(price) => Some(price),
        Err(e) => {
            warn!("Could not get price for {}: {}", market_id, e);
            None
        }
    }
}

// `last_price` is a `[price, currency]` pair with the price as a decimal string.
fn last_price(ticker: &Value) -> Result<f64, ExchangeError> {
    let raw = ticker
        .get("last_price")
        .and_then(|pair| pair.get(0))
        .and_then(Value::as_str)
        .ok_or_else(|| ExchangeError::Payload("ticker has no last_price".to_string()))?;
    match raw.trim().parse::<f64>() {
        Ok(price) if price.is_finite() => Ok(price),
        _ => Err(ExchangeError::Payload(format!(
            "last_price {:?} is not a number",
            raw
        ))),
    }
}
