use axum::{
    routing::{get, post},
    Router,
    extract::{Json, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::{AppError, Result};
use crate::api::auth::AdminUser;
use crate::api::models::{
    ChatRequest, ChatResponse, DeleteSubmissionRequest, StatusUpdateRequest, SubmissionsQuery,
};
use crate::api::response;
use crate::prompt;
use crate::store::{FormCategory, Record};
use crate::AppState;

const EMPTY_MESSAGE_REPLY: &str = "Please ask something about the college 😊";
const DISABLED_REPLY: &str = "Chatbot is currently disabled (API Key missing).";
const BUSY_REPLY: &str = "🤖 Scaling issues! Please try again later.";

const GENERATION_TEMPERATURE: f32 = 0.5;
const GENERATION_MAX_TOKENS: u32 = 500;

// Outer bound on the whole generation call, on top of the client timeout.
const GENERATION_TIMEOUT: Duration = Duration::from_secs(35);

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/chat", post(chat_handler))
        .route("/api/content", get(get_content).post(update_content))
        .route("/api/submit-form", post(submit_form))
        .route("/api/register-event", post(register_event))
        .route(
            "/api/submissions",
            get(list_submissions).post(delete_submission),
        )
        .route("/api/submissions/status", post(update_status))
        .route("/api/export/:category", get(export_csv))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn chat_handler(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Response {
    match process_chat_request(&state, &req.message).await {
        Ok(text) => (StatusCode::OK, Json(ChatResponse { response: text })).into_response(),
        Err(AppError::CapabilityUnavailable) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ChatResponse {
                response: DISABLED_REPLY.to_string(),
            }),
        )
            .into_response(),
        Err(err) => {
            // The caller only ever sees the fixed busy message.
            error!("Chat pipeline failure: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ChatResponse {
                    response: BUSY_REPLY.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Resolves a chat message through the layered pipeline: capability check,
/// empty-input check, knowledge-base match, then snapshot + generation.
/// Each layer is terminal on success.
async fn process_chat_request(state: &AppState, message: &str) -> Result<String> {
    let generator = state
        .generator
        .as_ref()
        .ok_or(AppError::CapabilityUnavailable)?;

    let message = message.trim();
    if message.is_empty() {
        return Ok(EMPTY_MESSAGE_REPLY.to_string());
    }

    if let Some(answer) = state.kb.find_answer(message) {
        info!("Knowledge base answered: {message}");
        return Ok(answer.to_string());
    }

    let snapshot = state.snapshot.get().await;
    let prompt = prompt::compose(&state.college_info, &snapshot, message);
    let instruction = prompt::system_instruction(&state.college_info);

    let reply = tokio::time::timeout(
        GENERATION_TIMEOUT,
        generator.generate(
            &prompt,
            &instruction,
            GENERATION_TEMPERATURE,
            GENERATION_MAX_TOKENS,
        ),
    )
    .await
    .map_err(|_| AppError::Generation("generation call timed out".to_string()))??;

    Ok(reply)
}

async fn get_content(State(state): State<AppState>) -> Result<Json<Value>> {
    let content = state
        .store
        .read_content()
        .await?
        .ok_or_else(|| AppError::NotFound("No content".to_string()))?;
    Ok(Json(content))
}

async fn update_content(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse> {
    state.store.write_content(&body).await?;
    Ok(response::success())
}

async fn submit_form(
    State(state): State<AppState>,
    Json(body): Json<Record>,
) -> Result<impl IntoResponse> {
    let form_type = body
        .get("form_type")
        .and_then(Value::as_str)
        .unwrap_or("contact");
    // Public intake only routes to the two submission categories.
    let category = if form_type == "admission" {
        FormCategory::Admission
    } else {
        FormCategory::Contact
    };

    state.store.append(category, body).await.map_err(|err| {
        error!("Failed to persist submission: {err}");
        AppError::Store("Could not save your submission. Please try again later.".to_string())
    })?;
    Ok(response::success())
}

async fn register_event(
    State(state): State<AppState>,
    Json(body): Json<Record>,
) -> Result<impl IntoResponse> {
    state
        .store
        .append(FormCategory::Registration, body)
        .await
        .map_err(|err| {
            error!("Failed to persist registration: {err}");
            AppError::Store("Could not save your registration. Please try again later.".to_string())
        })?;
    Ok(response::success())
}

async fn list_submissions(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(query): Query<SubmissionsQuery>,
) -> Result<Json<Vec<Record>>> {
    let category = FormCategory::from_form_type(query.form_type.as_deref().unwrap_or("contact"));
    Ok(Json(state.store.list(category).await?))
}

async fn export_csv(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Response> {
    let form_category = FormCategory::from_export_name(&category)
        .ok_or_else(|| AppError::NotFound(format!("Unknown category: {category}")))?;

    let bytes = state
        .store
        .export_csv(form_category)
        .await?
        .ok_or_else(|| AppError::NotFound("No data".to_string()))?;

    let headers = [
        (
            header::CONTENT_TYPE,
            "text/csv; charset=utf-8".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={category}.csv"),
        ),
    ];
    Ok((headers, bytes).into_response())
}

async fn update_status(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<impl IntoResponse> {
    let category = FormCategory::from_form_type(req.form_type.as_deref().unwrap_or("contact"));
    state
        .store
        .update_status(category, req.index, &req.status)
        .await?;
    Ok(response::success())
}

async fn delete_submission(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<DeleteSubmissionRequest>,
) -> Result<impl IntoResponse> {
    let category = FormCategory::from_form_type(req.form_type.as_deref().unwrap_or("contact"));
    state.store.delete(category, req.index).await?;
    Ok(response::success())
}
