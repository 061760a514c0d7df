use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use predictor_core::domain::contract::ContractResponse;
use predictor_core::domain::health::HealthStatus;
use predictor_core::domain::sales::SalesForecastResponse;
use predictor_core::error::{PredictionError, ValidationError};
use predictor_core::models::ModelStore;
use predictor_core::service::PredictionService;
use predictor_core::validate::BODY_FIELD;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = predictor_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let store = ModelStore::load(&settings.model_paths());
    let status = store.status();
    if !(status.sales_forecast && status.contract_prediction) {
        tracing::warn!(
            sales_forecast = status.sales_forecast,
            contract_prediction = status.contract_prediction,
            models_dir = %settings.models_dir.display(),
            "model artifacts missing; starting API in degraded mode"
        );
    }

    let state = AppState {
        service: PredictionService::new(Arc::new(store)),
    };
    let app = router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[derive(Debug, Clone)]
struct AppState {
    service: PredictionService,
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/predict/sales", post(predict_sales))
        .route("/api/predict/contract", post(predict_contract))
        .fallback(not_found)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(state.service.health())
}

async fn predict_sales(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SalesForecastResponse>, ApiError> {
    let Json(payload) = payload.map_err(ApiError::from)?;
    Ok(Json(state.service.predict_sales(&payload)?))
}

async fn predict_contract(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ContractResponse>, ApiError> {
    let Json(payload) = payload.map_err(ApiError::from)?;
    Ok(Json(state.service.predict_contract(&payload)?))
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"status": "error", "message": "endpoint not found"})),
    )
}

async fn index() -> Json<Value> {
    Json(json!({
        "api": "Sales forecast and contract prediction",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/api/predict/sales": {
                "method": "POST",
                "description": "Forecast daily sales for the next N days",
                "parameters": {
                    "days": "Number of days to forecast, 1-365 (int)"
                },
                "example": {"days": 7}
            },
            "/api/predict/contract": {
                "method": "POST",
                "description": "Predict whether a client will take the product",
                "parameters": {
                    "age": "Client age, 18-100 (int)",
                    "job": "Job (str)",
                    "marital": "married, single, divorced (str)",
                    "education": "primary, secondary, tertiary, unknown (str)",
                    "default": "Has credit in default: yes, no (str)",
                    "balance": "Account balance (int)",
                    "housing": "Has a housing loan: yes, no (str)",
                    "loan": "Has a personal loan: yes, no (str)",
                    "contact": "cellular, telephone, unknown (str)",
                    "day": "Day of month, 1-31 (int)",
                    "month": "jan..dec (str)",
                    "campaign": "Contacts during this campaign, >= 1 (int)",
                    "pdays": "Days since last contact, -1 if never (int)",
                    "previous": "Contacts before this campaign, >= 0 (int)",
                    "poutcome": "success, failure, other, unknown (str)"
                },
                "example": {
                    "age": 35,
                    "job": "technician",
                    "marital": "married",
                    "education": "secondary",
                    "default": "no",
                    "balance": 1500,
                    "housing": "yes",
                    "loan": "no",
                    "contact": "cellular",
                    "day": 15,
                    "month": "may",
                    "campaign": 2,
                    "pdays": -1,
                    "previous": 0,
                    "poutcome": "unknown"
                }
            },
            "/health": {
                "method": "GET",
                "description": "API and model status"
            }
        }
    }))
}

#[derive(Debug)]
struct ApiError(PredictionError);

impl From<PredictionError> for ApiError {
    fn from(err: PredictionError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(ValidationError::new(BODY_FIELD, rejection.body_text()).into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            PredictionError::Validation(errors) => {
                let first = errors.first();
                let body = json!({
                    "status": "error",
                    "message": format!("invalid field '{}': {}", first.field, first.reason),
                    "errors": errors.errors(),
                });
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            PredictionError::ModelUnavailable(kind) => {
                tracing::warn!(model = %kind, "prediction requested for unavailable model");
                let body = json!({
                    "status": "error",
                    "message": format!("model '{kind}' is not available"),
                });
                (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
            }
            err @ PredictionError::FeatureShape(_) => {
                let err = anyhow::Error::new(err);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "classifier input inconsistent with validated request");
                let body = json!({"status": "error", "message": "internal server error"});
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &predictor_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
