use askama::Template;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use super::{parse_features, AppState};
use crate::error::RequestError;
use crate::ml::{FeatureRange, ModelInfo, PredictorStatus, FEATURE_RANGES};

// === Front-end page ===

pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: &'static str,
    pub default_value: f64,
}

impl FormField {
    fn from_range(range: &FeatureRange) -> Self {
        let (label, step, default_value) = match range.name {
            "square_feet" => ("Square feet", "1", 2000.0),
            "bedrooms" => ("Bedrooms", "1", 3.0),
            "bathrooms" => ("Bathrooms", "0.5", 2.0),
            "age_years" => ("Age (years)", "1", 10.0),
            "garage_spaces" => ("Garage spaces", "1", 2.0),
            "location_score" => ("Location score", "1", 7.0),
            other => (other, "1", range.min),
        };

        Self {
            name: range.name,
            label,
            min: range.min,
            max: range.max,
            step,
            default_value,
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub fields: Vec<FormField>,
}

pub async fn index() -> Response {
    let page = IndexTemplate {
        fields: FEATURE_RANGES.iter().map(FormField::from_range).collect(),
    };

    match page.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Failed to render index page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
        }
    }
}

// === Prediction ===

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub success: bool,
    pub predicted_price: f64,
    pub metadata: Value,
}

pub async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PredictionResponse>, RequestError> {
    let payload = parse_payload(&body)?;
    let features = parse_features(&payload)?;
    let estimate = state.predictor.predict(&features)?;

    debug!("Predicted {:.2} for {:?}", estimate, features);

    Ok(Json(PredictionResponse {
        success: true,
        predicted_price: round_cents(estimate),
        metadata: payload,
    }))
}

/// Empty bodies count as an empty object
fn parse_payload(body: &[u8]) -> Result<Value, RequestError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(body).map_err(|e| RequestError::InputFormat(e.to_string()))
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// === Health ===

#[derive(Debug, Serialize)]
pub struct ModelHealth {
    pub status: PredictorStatus,
    #[serde(flatten)]
    pub info: Option<ModelInfo>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub model: ModelHealth,
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let predictor = &state.predictor;
    let code = if predictor.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(HealthResponse {
        status: if predictor.is_ready() { "ok" } else { "unavailable" },
        version: env!("CARGO_PKG_VERSION"),
        model: ModelHealth {
            status: predictor.status(),
            info: predictor.model_info(),
        },
    }))
}
