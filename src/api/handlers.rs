//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;

use super::AppState;
use super::types::{CitiesResponse, ErrorResponse, PredictRequest, PredictResponse};
use crate::error::PredictionError;
use crate::features::InputError;
use crate::metrics::{self, PredictionResult};
use crate::predictor::ModelMetadata;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn invalid_input(details: Vec<InputError>) -> ApiError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorResponse {
            error: "invalid input".to_string(),
            details,
        }),
    )
}

/// Malformed or mistyped bodies get the same JSON error shape as range
/// failures, with axum's status (400, 415 or 422).
fn unreadable_body(rejection: JsonRejection) -> ApiError {
    (
        rejection.status(),
        Json(ErrorResponse {
            error: rejection.body_text(),
            details: Vec::new(),
        }),
    )
}

/// Bad input is the caller's fault; a failing model is ours.
fn prediction_failed(err: PredictionError) -> ApiError {
    let status = match err {
        PredictionError::Input(_) | PredictionError::Feature(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PredictionError::Predict(_) => {
            tracing::error!(error = %err, "prediction failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            details: Vec::new(),
        }),
    )
}

/// Predicts peak power for one set of conditions.
///
/// `POST /predict` → 200 + `PredictResponse` JSON
/// Out-of-range field or rejected city → 422 + `ErrorResponse`
pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(req) = body.map_err(unreadable_body)?;
    let (weather, system) = req.into_inputs().map_err(invalid_input)?;
    let kw = metrics::predict_peak(&state.model, &weather, &system, state.policy)
        .map_err(prediction_failed)?;
    Ok(Json(PredictResponse {
        predicted_power_kw: kw,
        message: "Prediction successful".to_string(),
    }))
}

/// Peak power plus the derived daily metrics.
///
/// `POST /predict/summary` → 200 + `PredictionResult` JSON
pub async fn predict_summary(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let Json(req) = body.map_err(unreadable_body)?;
    let (weather, system) = req.into_inputs().map_err(invalid_input)?;
    metrics::predict_summary(&state.model, &weather, &system, state.policy)
        .map(Json)
        .map_err(prediction_failed)
}

/// `GET /metadata` → 200 + `ModelMetadata` JSON
pub async fn get_metadata(State(state): State<Arc<AppState>>) -> Json<ModelMetadata> {
    Json(state.model.metadata().clone())
}

/// `GET /cities` → 200 + `CitiesResponse` JSON
pub async fn get_cities(State(state): State<Arc<AppState>>) -> Json<CitiesResponse> {
    Json(CitiesResponse {
        cities: state
            .model
            .schema()
            .cities()
            .iter()
            .map(str::to_string)
            .collect(),
    })
}
