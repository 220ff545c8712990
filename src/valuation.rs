// src/valuation.rs
use crate::catalog::Markets;
use crate::error::ValuationError;
use crate::exchange::Exchange;
use crate::models::Valuation;
use crate::price::get_price;
use log::{info, warn};
use serde_json::{Map, Value};
use std::time::Instant;

/// A validated portfolio-value request, borrowed from the JSON body.
#[derive(Debug)]
pub struct PortfolioRequest<'a> {
    pub portfolio: &'a Map<String, Value>,
    pub fiat_currency: &'a str,
}

impl<'a> PortfolioRequest<'a> {
    /// Requires `portfolio` to be an object and `fiat_currency` a non-empty string.
    /// Individual holdings are not inspected here.
    pub fn from_body(body: &'a Value) -> Result<Self, ValuationError> {
        let portfolio = body.get("portfolio").and_then(Value::as_object);
        let fiat_currency = body
            .get("fiat_currency")
            .and_then(Value::as_str)
            .filter(|fiat| !fiat.is_empty());

        match (portfolio, fiat_currency) {
            (Some(portfolio), Some(fiat_currency)) => Ok(Self {
                portfolio,
                fiat_currency,
            }),
            _ => Err(ValuationError::Invalid),
        }
    }
}

/// Sums `price * quantity` over every holding that has a valid quantity, a
/// listed market and a price. Everything else is logged and skipped.
///
/// Prices are fetched one holding at a time, in request order.
pub async fn compute_value(
    exchange: &dyn Exchange,
    markets: &Markets,
    request: PortfolioRequest<'_>,
) -> Result<Valuation, ValuationError> {
    let started = Instant::now();
    let fiat = request.fiat_currency.to_uppercase();
    let mut total = 0.0;

    for (symbol, amount) in request.portfolio {
        let quantity = match amount.as_f64() {
            Some(quantity) if quantity.is_finite() && quantity >= 0.0 => quantity,
            _ => {
                warn!("Invalid quantity for {}: {}", symbol, amount);
                continue;
            }
        };

        let market_id = format!("{}-{}", symbol.to_uppercase(), fiat);
        if !markets.is_supported(&market_id) {
            warn!("Market {} not available", market_id);
            continue;
        }

        let Some(price) = get_price(exchange, &market_id).await else {
            continue;
        };
        total += price * quantity;
    }

    if !total.is_finite() {
        return Err(ValuationError::Computation(format!(
            "total is {} {}",
            total, request.fiat_currency
        )));
    }

    info!(
        "Portfolio valued in {}ms, total: {:.2} {}",
        started.elapsed().as_millis(),
        total,
        request.fiat_currency
    );
    Ok(Valuation {
        total,
        currency: request.fiat_currency.to_string(),
    })
}
