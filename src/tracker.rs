use anyhow::Result;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::client::CoinGeckoClient;
use crate::config::Config;
use crate::error::FetchResult;
use crate::model::{FetchRequest, TrackerResponse};
use crate::{fetch, history};

/// Runs the price phase to completion, then the history phase, and
/// assembles the combined response.
#[derive(Debug, Clone)]
pub struct Tracker {
    client: CoinGeckoClient,
    concurrency: usize,
    dedupe_ids: bool,
}

impl Tracker {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: CoinGeckoClient::new(config)?,
            concurrency: config.concurrency.max(1),
            dedupe_ids: config.dedupe_ids,
        })
    }

    pub async fn track(
        &self,
        request: FetchRequest,
        cancel: &CancellationToken,
    ) -> FetchResult<TrackerResponse> {
        let fetched_at = Utc::now();
        let request = if self.dedupe_ids { request.dedup() } else { request };
        tracing::debug!(
            "Tracking {} ids over {} in {}",
            request.ids.len(),
            request.range.as_str(),
            self.client.currency()
        );

        let mut batch =
            fetch::fetch_quotes(&self.client, &request.ids, self.concurrency, cancel).await?;
        let history_lookups = history::enrich(
            &self.client,
            &mut batch.quotes,
            request.range,
            self.concurrency,
            cancel,
        )
        .await;
        batch.lookups.extend(history_lookups);

        Ok(TrackerResponse {
            crypto_data: batch.quotes,
            lookups: batch.lookups,
            time_range: request.range,
            fetched_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send<T: Send>(_: &T) {}

    // axum handlers must be Send; this fails to compile if the pipeline isn't.
    #[test]
    fn track_future_is_send() {
        let tracker = Tracker::new(&Config::default()).unwrap();
        let cancel = CancellationToken::new();
        let fut = tracker.track(FetchRequest::parse("bitcoin,bitcoin", Some("7d")), &cancel);
        assert_send(&fut);
    }
}
