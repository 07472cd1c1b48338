use std::env;
use std::net::SocketAddr;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use database::{conversation, webhook_event, Database};
use webhook_core::{Processor, WebhookPayload};

#[derive(Clone)]
struct AppState {
    db: Database,
    verify_token: Option<String>,
}

/// Query parameters Meta sends on the challenge-verification request.
#[derive(Debug, Deserialize)]
struct VerifyParams {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReceiveAck {
    status: String,
    webhook_id: Option<i64>,
}

#[derive(Debug, Serialize)]
struct Health {
    status: String,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let addr = env::var("WEBHOOK_API_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:webhooks.db?mode=rwc".to_string());
    let verify_token = env::var("WEBHOOK_VERIFY_TOKEN")
        .ok()
        .filter(|token| !token.is_empty());
    if verify_token.is_none() {
        warn!("WEBHOOK_VERIFY_TOKEN is not set; challenge verification will reject all attempts");
    }

    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to database");
    db.migrate().await.expect("Failed to run migrations");

    let state = AppState { db, verify_token };

    let app = Router::new()
        .route("/health", get(health))
        .route("/webhook", get(verify_webhook).post(receive_webhook))
        .route("/conversations", get(list_conversations))
        .with_state(state);

    let addr: SocketAddr = addr.parse().expect("Invalid WEBHOOK_API_ADDR");
    info!(%addr, "Webhook gateway listening");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
    })
}

/// Challenge verification: echo the challenge back when the caller presents
/// the configured secret in subscribe mode, reject otherwise.
async fn verify_webhook(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Result<String, ApiError> {
    let token_matches = state
        .verify_token
        .as_deref()
        .is_some_and(|expected| params.verify_token.as_deref() == Some(expected));

    if params.mode.as_deref() == Some("subscribe") && token_matches {
        info!("webhook challenge verified");
        Ok(params.challenge.unwrap_or_default())
    } else {
        Err(ApiError::InvalidVerifyToken)
    }
}

/// Webhook receipt: append the raw payload to the event log, then run the
/// processing core. Storage trouble is logged but never turns into an error
/// response; Meta retries deliveries that don't come back 200.
async fn receive_webhook(
    State(state): State<AppState>,
    Json(raw): Json<serde_json::Value>,
) -> Json<ReceiveAck> {
    let webhook_id = match webhook_event::insert_event(state.db.pool(), &raw).await {
        Ok(id) => {
            info!(webhook_id = id, "webhook payload stored");
            Some(id)
        }
        Err(err) => {
            error!(error = %err, "failed to store webhook payload");
            None
        }
    };

    let payload: WebhookPayload = match serde_json::from_value(raw) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "payload does not match the webhook shape");
            WebhookPayload::default()
        }
    };

    let summary = Processor::new(state.db.clone()).process(&payload).await;
    info!(
        messages = summary.messages.len(),
        statuses = summary.statuses.len(),
        contacts = summary.contacts.len(),
        upserts = summary.upserts.len(),
        upsert_failures = summary.upsert_failures,
        "webhook processed"
    );

    Json(ReceiveAck {
        status: "ok".to_string(),
        webhook_id,
    })
}

async fn list_conversations(
    State(state): State<AppState>,
) -> Result<Json<Vec<database::Conversation>>, ApiError> {
    let conversations = conversation::list_conversations(state.db.pool())
        .await
        .map_err(ApiError::Database)?;
    Ok(Json(conversations))
}

#[derive(Debug)]
enum ApiError {
    InvalidVerifyToken,
    Database(database::DatabaseError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidVerifyToken => {
                warn!("Rejected webhook verification attempt");
                let body = serde_json::json!({
                    "error": {
                        "message": "Invalid verify token",
                        "type": "verification_error"
                    }
                });
                (StatusCode::FORBIDDEN, Json(body)).into_response()
            }
            ApiError::Database(err) => {
                error!(error = %err, "Database error while serving request");
                let body = serde_json::json!({
                    "error": {
                        "message": "Internal storage error",
                        "type": "storage_error"
                    }
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}
