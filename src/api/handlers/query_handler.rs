use std::time::Instant;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::{info, warn};

use crate::{
    api::{app_state::AppState, dto::query_dto::*, handlers::find_session},
    error::AppError,
    session::SessionError,
};

/// 提交问题，成功时返回写入历史的记录
pub async fn submit_query(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SubmitQueryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = find_session(&state, &id)?;

    let started = Instant::now();
    let result = session
        .submit(&request.query, state.orchestrator.as_ref())
        .await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(entry) => {
            state.metrics.record_query(elapsed_ms, true);
            info!(
                session = %session.id(),
                index = entry.index,
                expression = entry.expression.as_deref().unwrap_or("-"),
                elapsed_ms,
                "Query completed"
            );
            Ok(Json(SubmitQueryResponse { entry, elapsed_ms }))
        }
        Err(e) => {
            // 空问题和忙碌不算一次问答
            if matches!(e, SessionError::Agent(_)) {
                state.metrics.record_query(elapsed_ms, false);
            }
            warn!(session = %session.id(), error = %e, elapsed_ms, "Query rejected");
            Err(e.into())
        }
    }
}
