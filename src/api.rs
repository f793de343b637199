//! Yahoo Finance client for fetching ticker quotes.

use crate::models::QuoteRecord;
use crate::tickers::TickerSymbol;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Default quote endpoint.
pub const YAHOO_FINANCE_URL: &str = "https://query1.finance.yahoo.com/v7/finance/quote";

/// Yahoo refuses requests without a browser-looking agent.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Latest quote per symbol.
pub type QuoteMap = HashMap<TickerSymbol, QuoteRecord>;

/// Whole-batch fetch failure.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("failed to fetch quotes: {0}")]
    Request(#[source] reqwest::Error),
    #[error("quote API returned error: {0}")]
    Status(StatusCode),
    #[error("failed to parse quote response: {0}")]
    Parse(#[source] reqwest::Error),
    #[error("quote API reported an error: {0}")]
    Api(String),
}

/// Anything that can turn a batch of symbols into quote records.
///
/// Every requested symbol is present in the returned map; symbols the
/// source knows nothing about map to an all-unknown record.
pub trait QuoteFetcher: Send + Sync {
    fn fetch_quotes(
        &self,
        symbols: &[TickerSymbol],
    ) -> impl Future<Output = Result<QuoteMap, FetchError>> + Send;
}

/// Yahoo Finance API client.
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
}

impl YahooFinanceClient {
    /// Create a new client against `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

impl QuoteFetcher for YahooFinanceClient {
    async fn fetch_quotes(&self, symbols: &[TickerSymbol]) -> Result<QuoteMap, FetchError> {
        if symbols.is_empty() {
            return Ok(QuoteMap::new());
        }

        let joined = symbols
            .iter()
            .map(TickerSymbol::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}?symbols={}", self.base_url, urlencoding::encode(&joined));
        tracing::debug!(%url, "fetching quotes");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(FetchError::Request)?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let data: YahooResponse = response.json().await.map_err(FetchError::Parse)?;
        if let Some(error) = data.quote_response.error.filter(|e| !e.is_null()) {
            if data.quote_response.result.is_empty() {
                return Err(FetchError::Api(describe_api_error(&error)));
            }
            tracing::warn!(%error, "quote API reported an error with a partial result");
        }

        let mut quotes: QuoteMap = data
            .quote_response
            .result
            .into_iter()
            .filter_map(|q| {
                let symbol = TickerSymbol::parse(&q.symbol)?;
                Some((symbol, q.into_record()))
            })
            .collect();

        for symbol in symbols {
            if !quotes.contains_key(symbol) {
                tracing::warn!(%symbol, "no quote returned");
                quotes.insert(symbol.clone(), QuoteRecord::default());
            }
        }

        tracing::debug!(count = quotes.len(), "fetched quotes");
        Ok(quotes)
    }
}

/// Yahoo errors look like `{"code": ..., "description": ...}`.
fn describe_api_error(error: &Value) -> String {
    match (error.get("code"), error.get("description")) {
        (Some(Value::String(code)), Some(Value::String(description))) => {
            format!("{code}: {description}")
        }
        (_, Some(Value::String(description))) => description.clone(),
        _ => error.to_string(),
    }
}

// Yahoo Finance API response structures

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooResponse {
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    result: Vec<YahooQuote>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooQuote {
    symbol: String,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    long_name: Option<String>,
    #[serde(default)]
    regular_market_price: Option<f64>,
    #[serde(default)]
    regular_market_change: Option<f64>,
    #[serde(default)]
    regular_market_change_percent: Option<f64>,
    #[serde(default)]
    regular_market_day_high: Option<f64>,
    #[serde(default)]
    regular_market_day_low: Option<f64>,
    #[serde(default)]
    day_high: Option<f64>,
    #[serde(default)]
    day_low: Option<f64>,
    #[serde(default)]
    current_price: Option<f64>,
    #[serde(default)]
    fifty_two_week_high: Option<f64>,
    #[serde(default)]
    fifty_two_week_low: Option<f64>,
    #[serde(default)]
    bid: Option<f64>,
    #[serde(default)]
    ask: Option<f64>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl YahooQuote {
    fn into_record(self) -> QuoteRecord {
        let mut extra = self.extra;
        extra.insert("symbol".to_string(), Value::String(self.symbol));
        if let Some(short_name) = &self.short_name {
            extra.insert("shortName".to_string(), Value::String(short_name.clone()));
        }
        // Keep the names the API used so templates can ask for either spelling
        let sourced = [
            ("regularMarketPrice", self.regular_market_price),
            ("regularMarketDayHigh", self.regular_market_day_high),
            ("regularMarketDayLow", self.regular_market_day_low),
            ("currentPrice", self.current_price),
            ("dayHigh", self.day_high),
            ("dayLow", self.day_low),
        ];
        for (key, value) in sourced {
            if let Some(value) = value {
                extra.insert(key.to_string(), Value::from(value));
            }
        }

        QuoteRecord {
            fifty_two_week_low: self.fifty_two_week_low,
            fifty_two_week_high: self.fifty_two_week_high,
            day_low: self.regular_market_day_low.or(self.day_low),
            day_high: self.regular_market_day_high.or(self.day_high),
            // Yahoo reports 0 for an empty book outside trading hours
            bid: self.bid.filter(|b| *b > 0.0),
            ask: self.ask.filter(|a| *a > 0.0),
            current_price: self.regular_market_price.or(self.current_price),
            regular_market_change: self.regular_market_change,
            regular_market_change_percent: self.regular_market_change_percent,
            long_name: self.long_name.or(self.short_name),
            extra,
        }
    }
}
