//! HTTP API for the DocArc license service.
//!
//! Three surfaces:
//! - an unauthenticated device-fingerprint endpoint (needed pre-login so
//!   the activation screen can show the device code),
//! - end-user check/activate endpoints consumed by the login gate,
//! - admin CRUD over licenses, gated on a shared admin token checked
//!   before any store access.
//!
//! Business failures keep HTTP 200 and surface as
//! `{success: false, error: <localized message>}`; details are logged
//! server-side only. Only the admin gate returns a non-200 status.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{delete, get, post},
    Router,
};
use docarc_license::{DerivationMethod, DeviceCode, DeviceSignals, DERIVATION_VERSION};
use docarc_store::{Audit, LicenseService, LicenseSummary, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

// User-visible failure messages (localized, deliberately unspecific).
const MSG_CHECK_FAILED: &str = "检查授权状态失败";
const MSG_EXPIRED: &str = "系统授权已过期，请联系管理员续费";
const MSG_ACTIVATE_FAILED: &str = "激活失败";
const MSG_DUPLICATE_DEVICE: &str = "该设备已绑定授权";
const MSG_OPERATION_FAILED: &str = "操作失败";
const MSG_FORBIDDEN: &str = "forbidden";

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    service: Arc<LicenseService>,
    admin_token: String,
}

impl AppState {
    #[must_use]
    pub fn new(service: Arc<LicenseService>, admin_token: String) -> Self {
        Self {
            service,
            admin_token,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FingerprintResponse {
    pub device_code: String,
    pub method: DerivationMethod,
    pub version: u32,
    pub fingerprint: DeviceSignals,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct CheckRequest {
    pub device_code: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CheckResponse {
    pub success: bool,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ActivateRequest {
    pub device_code: String,
    pub auth_code: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StatusResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CreateLicenseRequest {
    pub device_code: String,
    pub duration_days: u32,
    pub name: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RenewRequest {
    pub additional_days: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LicenseResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<docarc_store::License>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct LicensesResponse {
    pub success: bool,
    pub licenses: Vec<LicenseSummary>,
}

/// Build the HTTP API router with the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/device-fingerprint", get(fingerprint_handler))
        .route("/api/v1/license/check", post(check_handler))
        .route("/api/v1/license/activate", post(activate_handler))
        .route(
            "/api/v1/admin/licenses",
            get(list_handler).post(create_handler),
        )
        .route("/api/v1/admin/licenses/{id}/renew", post(renew_handler))
        .route("/api/v1/admin/licenses/{id}", delete(delete_handler))
        .with_state(state)
}

async fn fingerprint_handler() -> Json<FingerprintResponse> {
    let signals = DeviceSignals::collect();
    let code = DeviceCode::derive(&signals);
    Json(FingerprintResponse {
        device_code: code.as_str().to_string(),
        method: code.method(),
        version: DERIVATION_VERSION,
        fingerprint: signals,
    })
}

async fn check_handler(
    State(state): State<AppState>,
    Json(req): Json<CheckRequest>,
) -> Json<CheckResponse> {
    match state.service.check(req.device_code.as_deref()) {
        Ok(check) => Json(CheckResponse {
            success: true,
            valid: check.valid,
            expire_time: check.expire_time,
            error: (!check.valid).then(|| MSG_EXPIRED.to_string()),
        }),
        Err(err) => {
            warn!("license check failed: {err}");
            Json(CheckResponse {
                success: false,
                valid: false,
                expire_time: None,
                error: Some(MSG_CHECK_FAILED.to_string()),
            })
        }
    }
}

async fn activate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ActivateRequest>,
) -> Json<StatusResponse> {
    let ip = client_ip(&headers);
    let audit = Audit {
        operator: "self-service",
        ip: ip.as_deref(),
    };
    match state.service.activate(&req.device_code, &req.auth_code, audit) {
        Ok(license) => {
            info!(device = %license.device_code, "device activated");
            Json(StatusResponse {
                success: true,
                error: None,
            })
        }
        Err(err) => {
            // Anti-oracle: every failure reads the same to the end user.
            warn!(device = %req.device_code, "activation rejected: {err}");
            Json(StatusResponse {
                success: false,
                error: Some(MSG_ACTIVATE_FAILED.to_string()),
            })
        }
    }
}

async fn create_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateLicenseRequest>,
) -> (StatusCode, Json<LicenseResponse>) {
    if let Err(forbidden) = require_admin(&state, &headers) {
        return (
            forbidden,
            Json(LicenseResponse {
                success: false,
                license: None,
                error: Some(MSG_FORBIDDEN.to_string()),
            }),
        );
    }
    let ip = client_ip(&headers);
    let audit = Audit {
        operator: "admin",
        ip: ip.as_deref(),
    };
    match state
        .service
        .create(&req.device_code, req.duration_days, req.name.as_deref(), audit)
    {
        Ok(license) => (
            StatusCode::OK,
            Json(LicenseResponse {
                success: true,
                license: Some(license),
                error: None,
            }),
        ),
        Err(err) => {
            warn!(device = %req.device_code, "license create failed: {err}");
            let message = match err {
                StoreError::DuplicateDevice(_) => MSG_DUPLICATE_DEVICE,
                _ => MSG_OPERATION_FAILED,
            };
            (
                StatusCode::OK,
                Json(LicenseResponse {
                    success: false,
                    license: None,
                    error: Some(message.to_string()),
                }),
            )
        }
    }
}

async fn renew_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<RenewRequest>,
) -> (StatusCode, Json<LicenseResponse>) {
    if let Err(forbidden) = require_admin(&state, &headers) {
        return (
            forbidden,
            Json(LicenseResponse {
                success: false,
                license: None,
                error: Some(MSG_FORBIDDEN.to_string()),
            }),
        );
    }
    let ip = client_ip(&headers);
    let audit = Audit {
        operator: "admin",
        ip: ip.as_deref(),
    };
    match state.service.renew(&id, req.additional_days, audit) {
        Ok(license) => (
            StatusCode::OK,
            Json(LicenseResponse {
                success: true,
                license: Some(license),
                error: None,
            }),
        ),
        Err(err) => {
            warn!(license = %id, "license renew failed: {err}");
            (
                StatusCode::OK,
                Json(LicenseResponse {
                    success: false,
                    license: None,
                    error: Some(MSG_OPERATION_FAILED.to_string()),
                }),
            )
        }
    }
}

async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> (StatusCode, Json<LicenseResponse>) {
    if let Err(forbidden) = require_admin(&state, &headers) {
        return (
            forbidden,
            Json(LicenseResponse {
                success: false,
                license: None,
                error: Some(MSG_FORBIDDEN.to_string()),
            }),
        );
    }
    let ip = client_ip(&headers);
    let audit = Audit {
        operator: "admin",
        ip: ip.as_deref(),
    };
    match state.service.delete(&id, audit) {
        Ok(license) => (
            StatusCode::OK,
            Json(LicenseResponse {
                success: true,
                license: Some(license),
                error: None,
            }),
        ),
        Err(err) => {
            warn!(license = %id, "license delete failed: {err}");
            (
                StatusCode::OK,
                Json(LicenseResponse {
                    success: false,
                    license: None,
                    error: Some(MSG_OPERATION_FAILED.to_string()),
                }),
            )
        }
    }
}

async fn list_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<serde_json::Value>) {
    if let Err(forbidden) = require_admin(&state, &headers) {
        return (
            forbidden,
            Json(serde_json::json!({ "success": false, "error": MSG_FORBIDDEN })),
        );
    }
    match state.service.list() {
        Ok(licenses) => {
            let body = LicensesResponse {
                success: true,
                licenses,
            };
            (
                StatusCode::OK,
                Json(serde_json::to_value(body).unwrap_or_default()),
            )
        }
        Err(err) => {
            warn!("license list failed: {err}");
            (
                StatusCode::OK,
                Json(serde_json::json!({ "success": false, "error": MSG_OPERATION_FAILED })),
            )
        }
    }
}

/// Checks the shared admin token before any store access.
///
/// The session/role layer is an external collaborator; deployments put this
/// service behind it and configure a token only the admin console holds.
fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), StatusCode> {
    let presented = headers
        .get("x-admin-token")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !state.admin_token.is_empty() && presented == state.admin_token {
        Ok(())
    } else {
        Err(StatusCode::FORBIDDEN)
    }
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
}
