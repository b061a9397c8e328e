//! Assistant chat route.

use axum::{Json, extract::State};
use tracing::instrument;

use super::extract::ApiJson;
use crate::ai::{ChatMessage, ChatReply, ChatTurn, render_system_prompt};
use crate::db::{CategoryRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::models::ProductFilter;
use crate::state::AppState;

/// POST /api/ai/chat
///
/// 503 when no API key is configured.
#[instrument(skip(state, turn), fields(history = turn.history.len()))]
pub async fn chat(
    State(state): State<AppState>,
    ApiJson(turn): ApiJson<ChatTurn>,
) -> Result<Json<ChatReply>> {
    let client = state
        .ai()
        .ok_or_else(|| AppError::ServiceUnavailable("The assistant is not configured".to_string()))?;

    let conversation = turn.into_messages()?;

    let settings = state.store_settings().await?;
    let filter = ProductFilter {
        category_id: None,
        in_stock: Some(true),
    };
    let products = ProductRepository::new(state.pool()).list(&filter).await?;
    let categories = CategoryRepository::new(state.pool()).list().await?;
    let system = render_system_prompt(&settings, &products, &categories)?;

    let mut messages = Vec::with_capacity(conversation.len() + 1);
    messages.push(ChatMessage::system(system));
    messages.extend(conversation);

    let reply = client.chat(&messages).await?;
    Ok(Json(ChatReply { reply }))
}
