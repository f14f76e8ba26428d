use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.coingecko.com/api/v3";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub quote_currency: String,
    /// Upper bound on lookups in flight per phase.
    pub concurrency: usize,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
    pub dedupe_ids: bool,
    pub listen_addr: SocketAddr,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            quote_currency: "inr".to_string(),
            concurrency: 8,
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            pool_max_idle_per_host: 16,
            pool_idle_timeout: Duration::from_secs(90),
            dedupe_ids: false,
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: env::var("COINGECKO_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            quote_currency: env::var("QUOTE_CURRENCY")
                .ok()
                .and_then(|c| normalize_currency(&c))
                .unwrap_or(defaults.quote_currency),
            concurrency: parse_var("FETCH_CONCURRENCY")
                .unwrap_or(defaults.concurrency)
                .max(1),
            timeout: parse_var("UPSTREAM_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            connect_timeout: parse_var("UPSTREAM_CONNECT_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            pool_max_idle_per_host: parse_var("UPSTREAM_POOL_MAX_IDLE")
                .unwrap_or(defaults.pool_max_idle_per_host),
            pool_idle_timeout: parse_var("UPSTREAM_POOL_IDLE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.pool_idle_timeout),
            dedupe_ids: parse_var("DEDUPE_IDS").unwrap_or(defaults.dedupe_ids),
            listen_addr: parse_var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
        }
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }
}

/// Blank values count as unset.
fn normalize_currency(raw: &str) -> Option<String> {
    let c = raw.trim();
    if c.is_empty() {
        None
    } else {
        Some(c.to_lowercase())
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring unparsable {}={:?}", name, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.quote_currency, "inr");
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(!config.dedupe_ids);
        assert_eq!(config.listen_addr.port(), 8080);
    }

    #[test]
    fn blank_currency_is_treated_as_unset() {
        assert_eq!(normalize_currency(""), None);
        assert_eq!(normalize_currency("  \t"), None);
        assert_eq!(normalize_currency(" USD "), Some("usd".to_string()));
    }

    #[test]
    fn with_api_url_overrides_base() {
        let config = Config::default().with_api_url("http://127.0.0.1:1234");
        assert_eq!(config.api_url, "http://127.0.0.1:1234");
    }
}
