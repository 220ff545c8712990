// src/api.rs
use crate::catalog::MarketCatalog;
use crate::error::{ApiError, ValuationError};
use crate::exchange::Exchange;
use crate::models::ErrorBody;
use crate::valuation::{compute_value, PortfolioRequest};
use log::{error, info, warn};
use serde_json::Value;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

const MAX_BODY_BYTES: u64 = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub exchange: Arc<dyn Exchange>,
    pub catalog: Arc<MarketCatalog>,
}

pub fn routes(state: AppState) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let portfolio_value = warp::path!("api" / "portfolio-value")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and_then(portfolio_value_handler);

    let ticker = warp::path!("api" / "ticker" / String)
        .and(warp::get())
        .and(with_state(state))
        .and_then(ticker_handler);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_header("content-type");

    portfolio_value
        .or(ticker)
        .recover(handle_rejection)
        .with(cors)
}

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

async fn portfolio_value_handler(state: AppState, body: Value) -> Result<impl Reply, Rejection> {
    let request = PortfolioRequest::from_body(&body).map_err(|e| {
        warn!("Rejected portfolio request: {}", e);
        warp::reject::custom(ApiError::from(e))
    })?;

    let markets = state.catalog.snapshot().await;
    match compute_value(state.exchange.as_ref(), &markets, request).await {
        Ok(valuation) => Ok(warp::reply::json(&valuation)),
        Err(e) => {
            if let ValuationError::Computation(detail) = &e {
                error!("Error computing portfolio value: {}", detail);
            }
            Err(warp::reject::custom(ApiError::from(e)))
        }
    }
}

async fn ticker_handler(market: String, state: AppState) -> Result<impl Reply, Rejection> {
    match state.exchange.fetch_ticker(&market.to_uppercase()).await {
        Ok(ticker) => {
            info!("Ticker for {} retrieved.", market);
            Ok(warp::reply::json(&ticker))
        }
        Err(e) => {
            error!("Error fetching ticker for {}: {}", market, e);
            Err(warp::reject::custom(ApiError::TickerFetch(market)))
        }
    }
}

/// Renders every rejection as `{ "error": ... }` with a matching status.
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if let Some(e) = err.find::<ApiError>() {
        (e.status(), e.to_string())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if err.find::<warp::filters::body::BodyDeserializeError>().is_some()
        || err.find::<warp::reject::UnsupportedMediaType>().is_some()
        || err.find::<warp::reject::LengthRequired>().is_some()
    {
        (StatusCode::BAD_REQUEST, ValuationError::Invalid.to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Payload too large".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else {
        error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorBody { error: message }),
        status,
    ))
}
