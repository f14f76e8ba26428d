pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod history;
pub mod model;
pub mod tracker;

pub use client::CoinGeckoClient;
pub use config::Config;
pub use error::FetchError;
pub use model::{AssetQuote, FetchRequest, HistoricalSeries, LookupStatus, TimeRange, TrackerResponse};
pub use tracker::Tracker;
