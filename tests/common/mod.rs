#![allow(dead_code)]

use crypto_tracker::Config;
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub fn config(server: &ServerGuard) -> Config {
    config_for(server.url())
}

pub fn config_for(url: String) -> Config {
    let mut config = Config::default().with_api_url(url);
    config.timeout = Duration::from_secs(5);
    config
}

/// One canned 200 response, sent after `delay`.
pub struct Route {
    pub path: String,
    pub delay: Duration,
    pub body: String,
}

impl Route {
    pub fn new(path: &str, body: String) -> Self {
        Self {
            path: path.to_string(),
            delay: Duration::ZERO,
            body,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Upstream whose responses can be held back per path, unlike mockito which
/// answers from its own thread. Unknown paths get a 404. Returns the base url.
pub async fn scripted_upstream(routes: Vec<Route>) -> std::io::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let url = format!("http://{}", listener.local_addr()?);
    let routes = Arc::new(routes);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let routes = routes.clone();
            tokio::spawn(async move {
                let mut head = Vec::new();
                let mut chunk = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => head.extend_from_slice(&chunk[..n]),
                    }
                }

                let head = String::from_utf8_lossy(&head);
                let target = head.split_whitespace().nth(1).unwrap_or_default();
                let path = target.split('?').next().unwrap_or_default();
                let (status, delay, body) = match routes.iter().find(|r| r.path == path) {
                    Some(r) => ("200 OK", r.delay, r.body.clone()),
                    None => ("404 Not Found", Duration::ZERO, r#"{"error":"coin not found"}"#.to_string()),
                };

                tokio::time::sleep(delay).await;
                let response = format!(
                    "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    Ok(url)
}

pub fn coin_body(id: &str, symbol: &str, name: &str, price: f64) -> String {
    json!({
        "id": id,
        "symbol": symbol,
        "name": name,
        "market_data": {
            "current_price": { "inr": price, "usd": price / 80.0 },
            "market_cap": { "inr": price * 1_000.0 },
            "total_volume": { "inr": price * 10.0 }
        }
    })
    .to_string()
}

/// `points` daily prices, emitted newest first to exercise sorting.
pub fn chart_body(points: usize) -> String {
    let day_ms = 86_400_000i64;
    let prices: Vec<_> = (0..points)
        .rev()
        .map(|i| json!([1_700_000_000_000i64 + i as i64 * day_ms, 100.0 + i as f64]))
        .collect();
    json!({ "prices": prices, "market_caps": [], "total_volumes": [] }).to_string()
}

/// Unregistered mock builders; callers finish them with `create_async`.
pub fn mock_coin(server: &mut ServerGuard, id: &str, symbol: &str, name: &str, price: f64) -> Mock {
    server
        .mock("GET", format!("/coins/{id}").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(coin_body(id, symbol, name, price))
}

pub fn mock_missing_coin(server: &mut ServerGuard, id: &str) -> Mock {
    server
        .mock("GET", format!("/coins/{id}").as_str())
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"coin not found"}"#)
}

pub fn mock_chart(server: &mut ServerGuard, id: &str, days: u32, points: usize) -> Mock {
    server
        .mock("GET", format!("/coins/{id}/market_chart").as_str())
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("vs_currency".into(), "inr".into()),
            Matcher::UrlEncoded("days".into(), days.to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chart_body(points))
}
