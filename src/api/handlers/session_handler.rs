use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::session_dto::*, handlers::find_session},
    error::AppError,
};

pub async fn create_session(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let session = state.sessions.create();
    state.metrics.record_session_created();
    debug!("Created session: {}", session.id());

    let response = CreateSessionResponse {
        id: session.id(),
        created_at: session.created_at(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Getting session: {}", id);

    let session = find_session(&state, &id)?;
    Ok(Json(SessionResponse::from(session.snapshot())))
}

pub async fn list_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Listing history: {}", id);

    let session = find_session(&state, &id)?;
    let items: Vec<HistoryItem> = session.history().iter().map(HistoryItem::from).collect();

    let response = HistoryListResponse {
        session_id: session.id(),
        total: items.len(),
        items,
    };

    Ok(Json(response))
}

/// 读取已存储的问答，不会重新查询
pub async fn get_history_entry(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, usize)>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Selecting history entry {} of session {}", index, id);

    let session = find_session(&state, &id)?;
    Ok(Json(session.select(index)?))
}
