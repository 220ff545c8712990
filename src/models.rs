// src/models.rs
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, PartialEq)]
pub struct Valuation {
    pub total: f64,
    pub currency: String,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Deserialize)]
pub struct MarketsResponse {
    pub markets: Vec<Market>,
}

#[derive(Deserialize)]
pub struct Market {
    pub id: String,
}

#[derive(Deserialize)]
pub struct TickerResponse {
    pub ticker: serde_json::Value,
}
