//! Conversational search endpoint.
//!
//! POST /chat runs the advisor pipeline once: extract filters from the
//! message, merge them with the manual ones, query the catalog, and summarize.
//! The caller owns the conversation history and sends it back each turn.

use axum::Json;
use axum::extract::State;

use caradvisor_types::chat::{ChatReply, ChatRequest};

use crate::http::error::AppError;
use crate::http::extractors::json::AppJson;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

/// POST /chat - Answer one chat message.
pub async fn chat(
    State(state): State<AppState>,
    AppJson(body): AppJson<ChatRequest>,
) -> Result<Json<ApiResponse<ChatReply>>, AppError> {
    let clock = RequestClock::start();
    let reply = state.advisor_service.chat(body).await?;
    if reply.suggest_comparison {
        return Ok(Json(clock.respond(reply).with_link("compare", "/cars/compare")));
    }
    Ok(Json(clock.respond(reply)))
}
