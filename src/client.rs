use anyhow::{bail, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{FetchError, FetchResult};
use crate::model::{AssetQuote, HistoricalSeries, PricePoint};

const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, Deserialize)]
struct CoinDetail {
    id: String,
    symbol: String,
    name: String,
    #[serde(default)]
    market_data: Option<MarketData>,
}

#[derive(Debug, Default, Deserialize)]
struct MarketData {
    #[serde(default)]
    current_price: HashMap<String, Option<f64>>,
    #[serde(default)]
    market_cap: HashMap<String, Option<f64>>,
    #[serde(default)]
    total_volume: HashMap<String, Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct MarketChart {
    prices: Vec<(f64, f64)>,
}

/// Thin wrapper over one pooled `reqwest::Client` pointed at a CoinGecko-style API.
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    http: reqwest::Client,
    base: Url,
    currency: String,
}

impl CoinGeckoClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("crypto-tracker/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .gzip(true).brotli(true).deflate(true)
            .build()
            .context("failed to build upstream HTTP client")?;

        let base = Url::parse(&config.api_url)
            .with_context(|| format!("invalid upstream url {}", config.api_url))?;
        if base.cannot_be_a_base() {
            bail!("upstream url {} cannot carry a path", config.api_url);
        }

        Ok(Self {
            http,
            base,
            currency: config.quote_currency.clone(),
        })
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Current price and market stats for one coin in the configured currency.
    pub async fn coin(&self, id: &str, cancel: &CancellationToken) -> FetchResult<AssetQuote> {
        let url = self.endpoint(&["coins", id]);
        let detail: CoinDetail = self.get_json(url, &[], cancel).await?;
        tracing::debug!("Fetched detail for {}: {} ({})", id, detail.name, detail.symbol);

        let market = detail.market_data.unwrap_or_default();
        let pick = |m: &HashMap<String, Option<f64>>| m.get(&self.currency).copied().flatten();

        let current_price = pick(&market.current_price).ok_or_else(|| FetchError::MissingPrice {
            currency: self.currency.clone(),
        })?;

        Ok(AssetQuote {
            id: detail.id,
            symbol: detail.symbol,
            name: detail.name,
            current_price,
            market_cap: pick(&market.market_cap),
            total_volume: pick(&market.total_volume),
            historical_data: HistoricalSeries::default(),
        })
    }

    /// Price series covering the last `days` days, oldest first.
    pub async fn market_chart(
        &self,
        id: &str,
        days: u32,
        cancel: &CancellationToken,
    ) -> FetchResult<HistoricalSeries> {
        let url = self.endpoint(&["coins", id, "market_chart"]);
        let days = days.to_string();
        let query = [("vs_currency", self.currency.as_str()), ("days", days.as_str())];
        let chart: MarketChart = self.get_json(url, &query, cancel).await?;
        tracing::debug!("Fetched {} historical prices for {}", chart.prices.len(), id);

        let points = chart
            .prices
            .into_iter()
            .map(|(ts, price)| PricePoint {
                timestamp: ts as i64,
                price,
            })
            .collect();
        Ok(HistoricalSeries::from_points(points))
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
        cancel: &CancellationToken,
    ) -> FetchResult<T> {
        let request = async {
            let resp = self.http.get(url).query(query).send().await?;
            let status = resp.status();
            let body = resp.text().await?;
            if !status.is_success() {
                return Err(FetchError::Status {
                    status,
                    body: truncate(&body, MAX_ERROR_BODY),
                });
            }
            Ok(serde_json::from_str(&body)?)
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            res = request => res,
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
