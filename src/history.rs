use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use tokio_util::sync::CancellationToken;

use crate::client::CoinGeckoClient;
use crate::model::{AssetQuote, HistoricalSeries, LookupStatus, Phase, TimeRange};

/// Attaches a price series to each quote, matched by id.
///
/// One lookup per distinct id; every quote sharing that id gets the same
/// series, or stays empty if the lookup failed.
pub async fn enrich(
    client: &CoinGeckoClient,
    quotes: &mut [AssetQuote],
    range: TimeRange,
    concurrency: usize,
    cancel: &CancellationToken,
) -> Vec<LookupStatus> {
    let days = range.days();
    let ids: Vec<String> = {
        let mut seen = HashSet::new();
        quotes
            .iter()
            .filter(|q| seen.insert(q.id.as_str()))
            .map(|q| q.id.clone())
            .collect()
    };

    let results: Vec<_> = stream::iter(ids)
        .map(|id| async move {
            let res = client.market_chart(&id, days, cancel).await;
            (id, res)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut series: HashMap<String, HistoricalSeries> = HashMap::with_capacity(results.len());
    let mut lookups = Vec::with_capacity(results.len());
    for (id, res) in results {
        match res {
            Ok(s) => {
                lookups.push(LookupStatus::success(id.as_str(), Phase::History));
                series.insert(id, s);
            }
            Err(e) => {
                tracing::warn!("Error fetching historical data for {}: {}", id, e);
                lookups.push(LookupStatus::failure(id, Phase::History, e));
            }
        }
    }

    let mut attached = 0;
    for quote in quotes.iter_mut() {
        if let Some(s) = series.get(&quote.id) {
            quote.historical_data = s.clone();
            attached += 1;
        }
    }

    tracing::info!("Attached {}-day history to {}/{} quotes", days, attached, quotes.len());
    lookups
}
