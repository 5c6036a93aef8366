use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::Response};
use tracing::info;

use crate::{db, error::AppResult, web, AppState};

/// Lists every product. Mounted as the router fallback, so any method and
/// any path end up here.
pub async fn list_products(State(state): State<AppState>) -> AppResult<Response> {
    let start = Instant::now();
    let products = db::fetch_all_products(&state.db).await?;
    let elapsed = start.elapsed();

    info!(
        count = products.len(),
        elapsed_ms = elapsed.as_millis(),
        "Listed products"
    );

    Ok(web::respond(&products, StatusCode::OK)?)
}
