use axum::{extract::State, http::StatusCode, response::Result, Form, Json};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::api::SharedTracker;
use crate::model::{FetchRequest, HealthResponse, TrackerResponse};

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

#[derive(Debug, Deserialize)]
pub struct FetchForm {
    #[serde(rename = "cryptoIDs", default)]
    crypto_ids: String,
    #[serde(rename = "timeRange")]
    time_range: Option<String>,
}

pub async fn fetch_crypto_data(
    State(tracker): State<SharedTracker>,
    Form(form): Form<FetchForm>,
) -> Result<Json<TrackerResponse>, (StatusCode, String)> {
    // Lookups still in flight are cancelled if the client goes away.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let request = FetchRequest::parse(&form.crypto_ids, form.time_range.as_deref());

    match tracker.track(request, &cancel).await {
        Ok(response) => Ok(Json(response)),
        Err(err) => {
            tracing::error!("Error fetching crypto prices: {}", err);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Error fetching crypto prices".to_string()))
        }
    }
}
