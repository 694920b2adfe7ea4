use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::bot::{self, Update};
use crate::config::BotConfig;
use crate::notify::Notifier;
use crate::quotes::Aggregator;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BotConfig>,
    pub aggregator: Arc<Aggregator>,
    pub notifier: Arc<Notifier>,
}

impl AppState {
    pub fn new(config: BotConfig, aggregator: Aggregator, notifier: Notifier) -> Self {
        Self {
            config: Arc::new(config),
            aggregator: Arc::new(aggregator),
            notifier: Arc::new(notifier),
        }
    }

    /// Production wiring: CriptoYa sources + Telegram delivery.
    pub fn from_config(config: BotConfig) -> anyhow::Result<Self> {
        let aggregator = Aggregator::from_config(&config)?;
        let notifier = Notifier::from_config(&config);
        Ok(Self::new(config, aggregator, notifier))
    }
}

pub fn router(state: AppState) -> Router {
    let webhook_path = format!("/{}", state.config.secret_path);

    Router::new()
        .route("/", get(root))
        .route(&webhook_path, post(telegram_webhook))
        .route("/send", get(scheduled_tick))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "ok": true, "time": Utc::now().timestamp() }))
}

// Always 200: Telegram retries deliveries that fail, which would spam the chat.
async fn telegram_webhook(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    let update = Update::from_slice(&body);
    let cmd = bot::handle_update(&state, &update).await;
    tracing::debug!(?cmd, "webhook handled");
    Json(json!({ "ok": true }))
}

#[derive(serde::Deserialize)]
struct TickQuery {
    #[serde(default)]
    key: Option<String>,
}

async fn scheduled_tick(
    State(state): State<AppState>,
    Query(q): Query<TickQuery>,
) -> Result<Json<Value>, ApiError> {
    if q.key.as_deref() != Some(state.config.cron_key.as_str()) {
        tracing::warn!("scheduled tick rejected: bad key");
        return Err(ApiError::Unauthorized);
    }
    bot::broadcast_prices(&state).await?;
    Ok(Json(json!({ "sent": true })))
}

#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "bad key" }))).into_response()
            }
            ApiError::Internal(e) => {
                tracing::error!(error = %format!("{e:#}"), "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": e.to_string() })),
                )
                    .into_response()
            }
        }
    }
}
