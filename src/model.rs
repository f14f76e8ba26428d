use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl TimeRange {
    /// Unrecognized selectors fall back to the 24h window.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "7d" => TimeRange::Week,
            "30d" => TimeRange::Month,
            "1y" => TimeRange::Year,
            _ => TimeRange::Day,
        }
    }

    pub fn days(self) -> u32 {
        match self {
            TimeRange::Day => 1,
            TimeRange::Week => 7,
            TimeRange::Month => 30,
            TimeRange::Year => 365,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeRange::Day => "24h",
            TimeRange::Week => "7d",
            TimeRange::Month => "30d",
            TimeRange::Year => "1y",
        }
    }
}

impl Serialize for TimeRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub ids: Vec<String>,
    pub range: TimeRange,
}

impl FetchRequest {
    /// Splits a comma-separated id list. Empty pieces are kept so they fail
    /// their own lookup instead of vanishing.
    pub fn parse(ids: &str, range: Option<&str>) -> Self {
        Self {
            ids: ids.split(',').map(|id| id.trim().to_string()).collect(),
            range: range.map(TimeRange::parse).unwrap_or_default(),
        }
    }

    /// Drops repeated ids, keeping the first occurrence.
    pub fn dedup(mut self) -> Self {
        let mut seen = HashSet::new();
        self.ids.retain(|id| seen.insert(id.clone()));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    /// Unix epoch milliseconds.
    pub timestamp: i64,
    pub price: f64,
}

impl Serialize for PricePoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.timestamp, self.price).serialize(serializer)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HistoricalSeries(Vec<PricePoint>);

impl HistoricalSeries {
    pub fn from_points(mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        Self(points)
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.0.first()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetQuote {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub current_price: f64,
    pub market_cap: Option<f64>,
    pub total_volume: Option<f64>,
    pub historical_data: HistoricalSeries,
}

impl AssetQuote {
    /// Percent move from the first point of the attached series to the current price.
    pub fn change_pct(&self) -> Option<f64> {
        let start = self.historical_data.first()?.price;
        if start == 0.0 {
            return None;
        }
        Some((self.current_price - start) / start * 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Price,
    History,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupStatus {
    pub id: String,
    pub phase: Phase,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl LookupStatus {
    pub fn success(id: impl Into<String>, phase: Phase) -> Self {
        Self {
            id: id.into(),
            phase,
            ok: true,
            reason: None,
        }
    }

    pub fn failure(id: impl Into<String>, phase: Phase, reason: impl ToString) -> Self {
        Self {
            id: id.into(),
            phase,
            ok: false,
            reason: Some(reason.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerResponse {
    pub crypto_data: Vec<AssetQuote>,
    pub lookups: Vec<LookupStatus>,
    pub time_range: TimeRange,
    pub fetched_at: DateTime<Utc>,
}

impl TrackerResponse {
    pub fn failures(&self) -> impl Iterator<Item = &LookupStatus> {
        self.lookups.iter().filter(|l| !l.ok)
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
}
