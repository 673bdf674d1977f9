//! Item catalogue routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use stockledger_core::NewItem;
use stockledger_shared::{AppError, types::ItemCode};
use tracing::info;

use crate::{AppState, error::ApiError, extractors::RequestActor};

/// Creates the item routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/items", post(register_item))
        .route("/items/{code}", get(get_item).delete(remove_item))
}

fn parse_code(code: &str) -> Result<ItemCode, ApiError> {
    ItemCode::parse(code)
        .ok_or_else(|| AppError::Validation("Item code must not be blank".to_string()).into())
}

/// POST `/items` - Register a catalogue item with its opening quantity.
async fn register_item(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Json(payload): Json<NewItem>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state.engine.register_item(payload).await?;
    info!(item_code = %item.code, actor_id = %actor.id, "Item registered");
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET `/items/{code}` - Get an item with its current quantity.
async fn get_item(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let code = parse_code(&code)?;
    Ok(Json(state.engine.item(&code).await?))
}

/// DELETE `/items/{code}` - Remove an item from the catalogue.
async fn remove_item(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let code = parse_code(&code)?;
    state.engine.remove_item(&code).await?;
    info!(item_code = %code, actor_id = %actor.id, "Item removal requested");
    Ok(StatusCode::NO_CONTENT)
}
