// src/error.rs
use thiserror::Error;
use warp::http::StatusCode;
use warp::reject::Reject;

/// Failure talking to the upstream exchange.
#[derive(Debug, Clone, Error)]
pub enum ExchangeError {
    #[error("upstream request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("upstream returned HTTP {0}")]
    Status(u16),

    #[error("malformed payload: {0}")]
    Payload(String),
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExchangeError::Timeout
        } else if err.is_decode() {
            ExchangeError::Payload(err.to_string())
        } else {
            ExchangeError::Network(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ValuationError {
    #[error("Missing or invalid portfolio or fiat_currency")]
    Invalid,

    /// Carries the internal detail for the log; the message shown to clients is generic.
    #[error("Error computing portfolio value")]
    Computation(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Errors surfaced to HTTP clients as `{ "error": ... }`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Valuation(#[from] ValuationError),

    #[error("Could not fetch ticker for {0}")]
    TickerFetch(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Valuation(ValuationError::Invalid) => StatusCode::BAD_REQUEST,
            ApiError::Valuation(ValuationError::Computation(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::TickerFetch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Reject for ApiError {}
