use std::{path::PathBuf, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Html,
    routing::{get, post},
    Json, Router,
};

use crate::error::ServiceError;
use crate::features::{Derived, FeatureFrame, FeatureRow};
use crate::host::ModelHost;
use crate::types::{CarInput, HealthOut, PredictionOut};

// ---------- Server state ----------

#[derive(Clone)]
pub struct AppState {
    pub host: Arc<ModelHost>,
    pub templates_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(host: ModelHost, templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            host: Arc::new(host),
            templates_dir: Arc::new(templates_dir.into()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/predict", post(predict))
        .with_state(state)
}

/// 2 decimals, ties to even (12345.125 -> 12345.12).
pub fn round_price(x: f64) -> f64 {
    (x * 100.0).round_ties_even() / 100.0
}

// ---------- Handlers ----------

// Liveness only: does not look at the model.
async fn health() -> Json<HealthOut> {
    Json(HealthOut {
        status: "healthy".to_string(),
    })
}

async fn index(State(state): State<AppState>) -> Html<String> {
    let path = state.templates_dir.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => Html(content),
        Err(e) => {
            tracing::warn!("index template unavailable at {}: {}", path.display(), e);
            Html(FALLBACK_INDEX.to_string())
        }
    }
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<CarInput>, JsonRejection>,
) -> Result<Json<PredictionOut>, ServiceError> {
    let Json(payload) = payload.map_err(|rej| ServiceError::Validation {
        status: rej.status(),
        detail: rej.body_text(),
    })?;

    let model = state
        .host
        .get()
        .inspect_err(|_| tracing::warn!("predict called with no model loaded"))?;

    let derived = Derived::from_input(&payload);
    tracing::debug!(
        "predict manufacturer={} model={} age={} mileage_per_year={:.1} vintage={}",
        payload.manufacturer,
        payload.model,
        derived.age,
        derived.mileage_per_year,
        derived.vintage
    );
    let frame = FeatureFrame::single(FeatureRow::from_input(&payload));

    // CPU-bound: keep it off the async workers
    let outputs = tokio::task::spawn_blocking(move || model.predict(&frame))
        .await
        .map_err(|e| ServiceError::Inference(e.to_string()))?
        .map_err(|e| {
            tracing::error!("inference failed: {}", e);
            ServiceError::from(e)
        })?;

    let raw = outputs
        .first()
        .copied()
        .ok_or_else(|| ServiceError::Inference("model returned no output".to_string()))?;

    Ok(Json(PredictionOut {
        predicted_price_gbp: round_price(raw),
    }))
}

const FALLBACK_INDEX: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Car Price Prediction API</title></head>
<body>
<h1>Car Price Prediction API</h1>
<ul>
<li>GET /health - liveness check</li>
<li>POST /predict - predict a car price in GBP</li>
</ul>
</body>
</html>"#;
