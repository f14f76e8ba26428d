use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::client::CoinGeckoClient;
use crate::error::{FetchError, FetchResult};
use crate::model::{AssetQuote, LookupStatus, Phase};

#[derive(Debug, Default)]
pub struct PriceBatch {
    pub quotes: Vec<AssetQuote>,
    pub lookups: Vec<LookupStatus>,
}

/// Looks up every id with at most `concurrency` requests in flight.
///
/// Individual failures are logged and reported in `lookups`; they never fail
/// the batch. The only error is being handed nothing to fetch.
pub async fn fetch_quotes(
    client: &CoinGeckoClient,
    ids: &[String],
    concurrency: usize,
    cancel: &CancellationToken,
) -> FetchResult<PriceBatch> {
    if ids.is_empty() {
        return Err(FetchError::NoIdentifiers);
    }

    let results: Vec<_> = stream::iter(ids.to_vec())
        .map(|id| async move {
            let res = client.coin(&id, cancel).await;
            (id, res)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut batch = PriceBatch {
        quotes: Vec::with_capacity(results.len()),
        lookups: Vec::with_capacity(results.len()),
    };
    for (id, res) in results {
        match res {
            Ok(quote) => {
                batch.lookups.push(LookupStatus::success(id.as_str(), Phase::Price));
                batch.quotes.push(quote);
            }
            Err(e) => {
                tracing::warn!("Error fetching price for {:?}: {}", id, e);
                batch.lookups.push(LookupStatus::failure(id.as_str(), Phase::Price, e));
            }
        }
    }

    tracing::info!("Fetched {}/{} prices", batch.quotes.len(), ids.len());
    Ok(batch)
}
