use crate::api::handlers::dataset_handler::*;
use axum::{Router, routing::get};

use crate::api::app_state::AppState;

pub fn create_dataset_router() -> Router<AppState> {
    Router::new().route("/dataset", get(dataset_info))
}
