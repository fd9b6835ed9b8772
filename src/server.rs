//! Prediction HTTP API.
//!
//! Serves the [`PredictionEngine`] over JSON. The engine and audit log are
//! built once at startup and shared by every handler through [`AppState`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/ml/predict` | Anonymous prediction |
//! | `POST` | `/api/ml/predict-authenticated` | Prediction for the user in `X-User-Id` |
//! | `GET`  | `/api/ml/symptoms/list` | All symptoms, sorted |
//! | `GET`  | `/api/ml/symptoms/search?q=&limit=` | Substring search over symptoms |
//! | `GET`  | `/api/ml/diseases/list` | All diseases, sorted |
//! | `GET`  | `/api/ml/model/info` | Classifier kind, counts, training metadata |
//! | `POST` | `/api/ml/validate-symptoms` | Per-token validation with suggestions |
//! | `GET`  | `/api/ml/history?limit=` | Audit history for the user in `X-User-Id` |
//! | `GET`  | `/api/ml/health` | Probe prediction and asset counts |
//! | `GET`  | `/api/health` | Liveness (returns version) |
//!
//! # Status codes
//!
//! Prediction endpoints return the [`PredictionResult`] body with `200` on
//! success, `400` when no supplied symptom is known, and `500` for internal
//! failures. Malformed requests are rejected before prediction:
//!
//! ```json
//! { "success": false, "message": "At least one symptom is required",
//!   "error": { "code": "bad_request", "message": "At least one symptom is required" } }
//! ```
//!
//! # Identity
//!
//! Authentication happens upstream. The gateway forwards the verified user
//! id in the `X-User-Id` header; requests without it get `401`.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        ConnectInfo, Query, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use medpredict_core::{
    AuditLogEntry, AuditSink, PredictionEngine, PredictionResult, SymptomValidation,
};

use crate::assets;
use crate::audit_store::SqliteAuditLog;
use crate::config::Config;
use crate::db;
use crate::migrate;

/// Header carrying the caller identity established by the upstream gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    engine: Arc<PredictionEngine>,
    audit: Arc<dyn AuditSink>,
}

/// Load assets, open the audit database and serve until terminated.
///
/// Asset problems abort here, before the listener is bound.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let (engine, _summary) = assets::load_engine(config)?;

    let pool = db::connect(config).await?;
    migrate::migrate_pool(&pool).await?;
    let audit: Arc<dyn AuditSink> = Arc::new(SqliteAuditLog::new(pool));

    run_server_with(config, Arc::new(engine), audit).await
}

/// Serve an already-built engine and audit sink.
pub async fn run_server_with(
    config: &Config,
    engine: Arc<PredictionEngine>,
    audit: Arc<dyn AuditSink>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let cors = cors_layer(&config.server.cors_origins)?;

    let state = AppState {
        config: Arc::new(config.clone()),
        engine,
        audit,
    };

    let ml = Router::new()
        .route("/predict", post(handle_predict))
        .route("/predict-authenticated", post(handle_predict_authenticated))
        .route("/symptoms/list", get(handle_symptoms_list))
        .route("/symptoms/search", get(handle_symptoms_search))
        .route("/diseases/list", get(handle_diseases_list))
        .route("/model/info", get(handle_model_info))
        .route("/validate-symptoms", post(handle_validate))
        .route("/history", get(handle_history))
        .route("/health", get(handle_ml_health));

    let app = Router::new()
        .nest("/api/ml", ml)
        .route("/api/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!(addr = %bind_addr, "prediction server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return Ok(layer.allow_origin(Any));
    }
    let parsed = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o).with_context(|| format!("Invalid CORS origin: {}", o))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(layer.allow_origin(parsed))
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            message: self.message.clone(),
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn unauthorized(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::UNAUTHORIZED,
        code: "unauthorized",
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal",
        message: message.into(),
    }
}

// ============ Request helpers ============

/// Extract the caller identity, rejecting requests without one.
fn require_user(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| unauthorized("Authentication required"))
}

/// The `symptoms` array of a JSON request body, as strings.
fn symptoms_array(body: Result<Json<Value>, JsonRejection>) -> Result<Vec<String>, AppError> {
    let Json(body) = body.map_err(|_| bad_request("No data provided"))?;
    let items = body
        .as_object()
        .ok_or_else(|| bad_request("No data provided"))?
        .get("symptoms")
        .and_then(Value::as_array)
        .ok_or_else(|| bad_request("Symptoms list is required and must be an array"))?;

    items
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| bad_request("Every symptom must be a string"))
        })
        .collect()
}

fn prediction_symptoms(
    body: Result<Json<Value>, JsonRejection>,
    max_symptoms: usize,
) -> Result<Vec<String>, AppError> {
    let symptoms = symptoms_array(body)?;
    if symptoms.is_empty() {
        return Err(bad_request("At least one symptom is required"));
    }
    if symptoms.len() > max_symptoms {
        return Err(bad_request(format!(
            "Too many symptoms provided (maximum {})",
            max_symptoms
        )));
    }
    Ok(symptoms)
}

fn status_for(result: &PredictionResult) -> StatusCode {
    match result.failure_kind() {
        None => StatusCode::OK,
        Some(kind) if kind.is_user_error() => StatusCode::BAD_REQUEST,
        Some(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn model_version(engine: &PredictionEngine) -> String {
    engine
        .classifier_info()
        .metadata
        .get("version")
        .and_then(Value::as_str)
        .unwrap_or(env!("CARGO_PKG_VERSION"))
        .to_string()
}

/// Record a successful prediction. Write failures are logged, never returned.
async fn record_prediction(
    audit: &dyn AuditSink,
    user_id: Option<&str>,
    symptoms: &[String],
    result: &PredictionResult,
    metadata: BTreeMap<String, String>,
) -> Option<String> {
    if !result.success {
        return None;
    }
    let entry = AuditLogEntry::new(user_id, symptoms, result, metadata);
    match audit.record(&entry).await {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, user = %entry.user_id, "failed to record prediction");
            None
        }
    }
}

// ============ POST /api/ml/predict ============

#[derive(Serialize)]
struct PredictionResponse {
    #[serde(flatten)]
    result: PredictionResult,
    timestamp: String,
    model_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prediction_id: Option<String>,
}

async fn handle_predict(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<PredictionResponse>), AppError> {
    let symptoms = prediction_symptoms(body, state.config.api.max_symptoms)?;
    let result = state.engine.predict(&symptoms);
    info!(
        success = result.success,
        disease = ?result.predicted_disease,
        "anonymous prediction"
    );

    let metadata = BTreeMap::from([
        ("source".to_string(), "anonymous_prediction".to_string()),
        ("ip_address".to_string(), peer.ip().to_string()),
    ]);
    record_prediction(state.audit.as_ref(), None, &symptoms, &result, metadata).await;

    Ok((
        status_for(&result),
        Json(PredictionResponse {
            timestamp: Utc::now().to_rfc3339(),
            model_version: model_version(&state.engine),
            user_id: None,
            prediction_id: None,
            result,
        }),
    ))
}

// ============ POST /api/ml/predict-authenticated ============

async fn handle_predict_authenticated(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<PredictionResponse>), AppError> {
    let user_id = require_user(&headers)?;
    let symptoms = prediction_symptoms(body, state.config.api.max_symptoms)?;
    let result = state.engine.predict(&symptoms);
    info!(
        user = %user_id,
        success = result.success,
        disease = ?result.predicted_disease,
        "authenticated prediction"
    );

    let mut metadata = BTreeMap::from([
        ("source".to_string(), "authenticated_prediction".to_string()),
        ("ip_address".to_string(), peer.ip().to_string()),
    ]);
    if let Some(agent) = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
    {
        metadata.insert("user_agent".to_string(), agent.to_string());
    }
    let prediction_id = record_prediction(
        state.audit.as_ref(),
        Some(&user_id),
        &symptoms,
        &result,
        metadata,
    )
    .await;

    Ok((
        status_for(&result),
        Json(PredictionResponse {
            timestamp: Utc::now().to_rfc3339(),
            model_version: model_version(&state.engine),
            user_id: Some(user_id),
            prediction_id,
            result,
        }),
    ))
}

// ============ GET /api/ml/symptoms/list ============

#[derive(Serialize)]
struct SymptomListResponse {
    success: bool,
    symptoms: Vec<String>,
    total_count: usize,
}

async fn handle_symptoms_list(State(state): State<AppState>) -> Json<SymptomListResponse> {
    let mut symptoms: Vec<String> = state
        .engine
        .all_symptoms()
        .into_iter()
        .map(str::to_string)
        .collect();
    symptoms.sort();
    Json(SymptomListResponse {
        success: true,
        total_count: symptoms.len(),
        symptoms,
    })
}

// ============ GET /api/ml/symptoms/search ============

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
    limit: Option<usize>,
}

#[derive(Serialize)]
struct SearchResponse {
    success: bool,
    query: String,
    symptoms: Vec<String>,
    count: usize,
}

async fn handle_symptoms_search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse>, AppError> {
    let Query(params) = params.map_err(|_| bad_request("limit must be a non-negative integer"))?;
    let api = &state.config.api;

    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(bad_request("Query parameter \"q\" is required"));
    }
    if query.chars().count() < api.search_min_query_len {
        return Err(bad_request(format!(
            "Query must be at least {} characters long",
            api.search_min_query_len
        )));
    }
    let limit = params
        .limit
        .unwrap_or(api.search_default_limit)
        .min(api.search_max_limit);

    let symptoms: Vec<String> = state
        .engine
        .search(query, limit)
        .into_iter()
        .map(str::to_string)
        .collect();

    Ok(Json(SearchResponse {
        success: true,
        query: query.to_string(),
        count: symptoms.len(),
        symptoms,
    }))
}

// ============ GET /api/ml/diseases/list ============

#[derive(Serialize)]
struct DiseaseListResponse {
    success: bool,
    diseases: Vec<String>,
    total_count: usize,
}

async fn handle_diseases_list(State(state): State<AppState>) -> Json<DiseaseListResponse> {
    let mut diseases: Vec<String> = state
        .engine
        .all_diseases()
        .into_iter()
        .map(str::to_string)
        .collect();
    diseases.sort();
    Json(DiseaseListResponse {
        success: true,
        total_count: diseases.len(),
        diseases,
    })
}

// ============ GET /api/ml/model/info ============

#[derive(Serialize)]
struct ModelInfoResponse {
    success: bool,
    model_info: ModelInfo,
}

#[derive(Serialize)]
struct ModelInfo {
    kind: String,
    features: Option<usize>,
    labels: usize,
    total_symptoms: usize,
    total_diseases: usize,
    version: String,
    metadata: Value,
}

async fn handle_model_info(State(state): State<AppState>) -> Json<ModelInfoResponse> {
    let info = state.engine.classifier_info();
    Json(ModelInfoResponse {
        success: true,
        model_info: ModelInfo {
            version: model_version(&state.engine),
            kind: info.kind,
            features: info.n_features,
            labels: info.labels.len(),
            total_symptoms: state.engine.vocabulary().len(),
            total_diseases: state.engine.all_diseases().len(),
            metadata: info.metadata,
        },
    })
}

// ============ POST /api/ml/validate-symptoms ============

#[derive(Serialize)]
struct ValidationResponse {
    success: bool,
    #[serde(flatten)]
    validation: SymptomValidation,
}

async fn handle_validate(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ValidationResponse>, AppError> {
    let symptoms = symptoms_array(body)?;
    let validation = state
        .engine
        .validate(&symptoms, state.config.api.suggestion_limit);
    Ok(Json(ValidationResponse {
        success: true,
        validation,
    }))
}

// ============ GET /api/ml/history ============

#[derive(Deserialize)]
struct HistoryParams {
    limit: Option<usize>,
}

#[derive(Serialize)]
struct HistoryResponse {
    success: bool,
    user_id: String,
    history: Vec<AuditLogEntry>,
    count: usize,
}

async fn handle_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<HistoryResponse>, AppError> {
    let user_id = require_user(&headers)?;
    let Query(params) = params.map_err(|_| bad_request("limit must be a non-negative integer"))?;
    let limit = params
        .limit
        .unwrap_or(state.config.api.history_default_limit);

    let history = state.audit.history(&user_id, limit).await.map_err(|e| {
        warn!(error = %e, user = %user_id, "failed to read prediction history");
        internal("Error fetching prediction history")
    })?;

    Ok(Json(HistoryResponse {
        success: true,
        user_id,
        count: history.len(),
        history,
    }))
}

// ============ GET /api/ml/health ============

#[derive(Serialize)]
struct MlHealthResponse {
    status: &'static str,
    message: &'static str,
    test_prediction: bool,
    model_loaded: bool,
    symptoms_count: usize,
    diseases_count: usize,
    timestamp: String,
}

/// Runs a probe prediction over the first vocabulary symptom. `503` when the
/// probe does not succeed.
async fn handle_ml_health(State(state): State<AppState>) -> (StatusCode, Json<MlHealthResponse>) {
    let probe: Vec<&str> = state.engine.all_symptoms().into_iter().take(1).collect();
    let ok = state.engine.predict(&probe).success;

    let (status, body_status, message) = if ok {
        (StatusCode::OK, "healthy", "ML prediction service is operational")
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "unhealthy",
            "Probe prediction failed",
        )
    };

    (
        status,
        Json(MlHealthResponse {
            status: body_status,
            message,
            test_prediction: ok,
            model_loaded: true,
            symptoms_count: state.engine.vocabulary().len(),
            diseases_count: state.engine.all_diseases().len(),
            timestamp: Utc::now().to_rfc3339(),
        }),
    )
}

// ============ GET /api/health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
