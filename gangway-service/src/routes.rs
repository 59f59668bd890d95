use crate::error::AppError;
use crate::state::SharedState;
use axum::extract::{Path, State};
use axum::Json;
use gangway_core::{ApiKeyStatus, Envelope, KeyValidation};
use serde::Serialize;
use std::collections::BTreeMap;

/// Warning attached to every validation response, valid or not. The check
/// never leaves this process and must not be read as authoritative.
const VALIDATION_WARNING: &str =
    "format check only: the key was not verified against the provider";

#[derive(Serialize)]
pub struct VersionResponse {
    version: &'static str,
}

#[derive(Serialize)]
pub struct PlatformResponse {
    platform: &'static str,
}

#[derive(Serialize)]
pub struct ExistsResponse {
    exists: bool,
}

#[derive(Serialize)]
pub struct KeyResponse {
    key: Option<String>,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    success: bool,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    mode: &'static str,
}

// GET /api/app/version
pub async fn app_version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
    })
}

// GET /api/app/platform
pub async fn app_platform() -> Json<PlatformResponse> {
    Json(PlatformResponse {
        platform: std::env::consts::OS,
    })
}

// GET /api/api-keys/has-any
pub async fn has_any_keys(
    State(state): State<SharedState>,
) -> Result<Json<ExistsResponse>, AppError> {
    Ok(Json(ExistsResponse {
        exists: state.keys.has_any()?,
    }))
}

// GET /api/api-keys/all
pub async fn list_keys(
    State(state): State<SharedState>,
) -> Result<Json<BTreeMap<String, ApiKeyStatus>>, AppError> {
    Ok(Json(state.keys.list()?))
}

// GET /api/api-keys/{provider}/exists
pub async fn key_exists(
    State(state): State<SharedState>,
    Path(provider): Path<String>,
) -> Result<Json<ExistsResponse>, AppError> {
    Ok(Json(ExistsResponse {
        exists: state.keys.exists(&provider)?,
    }))
}

// GET /api/api-keys/{provider}
pub async fn get_key(
    State(state): State<SharedState>,
    Path(provider): Path<String>,
) -> Result<Json<KeyResponse>, AppError> {
    Ok(Json(KeyResponse {
        key: state.keys.get(&provider)?,
    }))
}

// POST /api/api-keys/{provider}
//
// The body is taken as a raw value so a missing or non-string `key` is a
// 400 with the wire error shape, not a framework rejection.
pub async fn store_key(
    State(state): State<SharedState>,
    Path(provider): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<SuccessResponse>, AppError> {
    let key = match body.get("key").and_then(|value| value.as_str()) {
        Some(key) if !key.trim().is_empty() => key,
        _ => return Err(AppError::bad_request("key must be a non-empty string")),
    };
    let label = body.get("label").and_then(|value| value.as_str());

    state.keys.set(&provider, key, label)?;
    tracing::info!(provider = %provider, "stored API key");
    Ok(Json(SuccessResponse { success: true }))
}

// DELETE /api/api-keys/{provider}
pub async fn delete_key(
    State(state): State<SharedState>,
    Path(provider): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.keys.delete(&provider)?;
    tracing::info!(provider = %provider, "deleted API key");
    Ok(Json(SuccessResponse { success: true }))
}

// POST /api/api-keys/{provider}/validate
//
// Storing and validating are decoupled on purpose: a key can be stored
// without ever being validated, and validation never stores anything.
pub async fn validate_key(
    Path(_provider): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Json<KeyValidation> {
    let key = body.get("key").and_then(|value| value.as_str()).unwrap_or("");
    Json(validate_format(key))
}

fn validate_format(key: &str) -> KeyValidation {
    if key.trim().is_empty() {
        KeyValidation {
            valid: false,
            error: Some("API key must be a non-empty string".to_string()),
            warning: VALIDATION_WARNING.to_string(),
        }
    } else {
        KeyValidation {
            valid: true,
            error: None,
            warning: VALIDATION_WARNING.to_string(),
        }
    }
}

// POST /api/events/emit
//
// Dev convenience: push one envelope to every connected event client.
pub async fn emit_event(
    State(state): State<SharedState>,
    Json(envelope): Json<Envelope>,
) -> Result<Json<SuccessResponse>, AppError> {
    let frame = serde_json::to_string(&envelope).map_err(AppError::internal)?;
    // send() only errs when nobody is listening, which is fine here.
    let receivers = state.events.send(frame).unwrap_or(0);
    tracing::debug!(channel = %envelope.channel, receivers, "event emitted");
    Ok(Json(SuccessResponse { success: true }))
}

// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        mode: "browser",
    })
}
