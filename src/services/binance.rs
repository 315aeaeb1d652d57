//! Binance spot REST client for klines

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::BinanceConfig;
use crate::error::FeedError;
use crate::models::market::{Kline, KlineRequest};
use crate::services::market_data::PriceFeed;

const API_KEY_HEADER: &str = "X-MBX-APIKEY";

pub struct BinanceRestClient {
    base_url: String,
    api_key: String,
    timeout: Duration,
    client: Client,
}

impl BinanceRestClient {
    pub fn new(config: &BinanceConfig, timeout: Duration) -> Result<Self, FeedError> {
        let client = build_client(None, timeout)?;
        Ok(Self::with_client(
            config.base_url.clone(),
            config.api_key.clone(),
            timeout,
            client,
        ))
    }

    pub fn with_client(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        client: Client,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout,
            client,
        }
    }

    fn klines_url(&self) -> String {
        format!("{}/api/v3/klines", self.base_url)
    }
}

fn build_client(proxy: Option<&str>, timeout: Duration) -> Result<Client, FeedError> {
    let mut builder = Client::builder().timeout(timeout);
    if let Some(proxy) = proxy {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| FeedError::Transport(format!("invalid proxy {}: {}", proxy, e)))?;
        builder = builder.proxy(proxy);
    }
    builder
        .build()
        .map_err(|e| FeedError::Transport(e.to_string()))
}

#[async_trait::async_trait]
impl PriceFeed for BinanceRestClient {
    async fn fetch_klines(
        &self,
        request: &KlineRequest,
        proxy: Option<&str>,
    ) -> Result<Vec<Kline>, FeedError> {
        let proxied;
        let client = match proxy {
            Some(p) => {
                proxied = build_client(Some(p), self.timeout)?;
                &proxied
            }
            None => &self.client,
        };

        debug!(
            symbol = %request.symbol,
            interval = %request.interval,
            limit = request.limit,
            proxy = proxy.unwrap_or("none"),
            "Requesting klines"
        );

        let limit = request.limit.to_string();
        let response = client
            .get(self.klines_url())
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[
                ("symbol", request.symbol.as_str()),
                ("interval", request.interval.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| FeedError::Decode(e.to_string()))?;

        parse_klines(&body)
    }
}

/// Parse the klines payload: an array of arrays where index 4 is the close
pub fn parse_klines(body: &Value) -> Result<Vec<Kline>, FeedError> {
    let rows = body
        .as_array()
        .ok_or_else(|| FeedError::Decode("expected a JSON array of klines".to_string()))?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| parse_row(row).map_err(|e| FeedError::Decode(format!("kline {}: {}", i, e))))
        .collect()
}

fn parse_row(row: &Value) -> Result<Kline, String> {
    let fields = row.as_array().ok_or("not an array")?;
    if fields.len() < 7 {
        return Err(format!("expected at least 7 fields, got {}", fields.len()));
    }

    Ok(Kline {
        open_time: timestamp(&fields[0])?,
        open: price(&fields[1])?,
        high: price(&fields[2])?,
        low: price(&fields[3])?,
        close: price(&fields[4])?,
        volume: price(&fields[5])?,
        close_time: timestamp(&fields[6])?,
    })
}

fn price(value: &Value) -> Result<f64, String> {
    let parsed = match value {
        Value::String(s) => s.parse::<f64>().map_err(|e| format!("{:?}: {}", s, e))?,
        Value::Number(n) => n.as_f64().ok_or("number out of range")?,
        other => return Err(format!("unexpected price value {}", other)),
    };
    if !parsed.is_finite() {
        return Err(format!("non-finite price {}", parsed));
    }
    Ok(parsed)
}

fn timestamp(value: &Value) -> Result<DateTime<Utc>, String> {
    let millis = value.as_i64().ok_or("timestamp is not an integer")?;
    DateTime::from_timestamp_millis(millis).ok_or_else(|| format!("timestamp {} out of range", millis))
}
