//! Account routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use stockledger_core::{MovementOrder, NewAccount};
use stockledger_shared::types::AccountId;
use tracing::info;

use crate::{AppState, error::ApiError, extractors::RequestActor};

/// Creates the account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", post(register_account))
        .route("/accounts/{account_id}", get(get_account))
        .route("/accounts/{account_id}/recalculate", post(recalculate))
        .route("/accounts/{account_id}/movements", get(list_movements))
}

/// Query parameters for listing an account's movements.
#[derive(Debug, Deserialize)]
pub struct ListMovementsQuery {
    /// `asc` (oldest first, default) or `desc`.
    pub order: Option<MovementOrder>,
}

/// POST `/accounts` - Register an account.
async fn register_account(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Json(payload): Json<NewAccount>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.engine.register_account(payload).await?;
    info!(account_id = %account.id, actor_id = %actor.id, "Account registered");
    Ok((StatusCode::CREATED, Json(account)))
}

/// GET `/accounts/{account_id}` - Get an account with its balance.
async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<AccountId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.engine.account(account_id).await?))
}

/// POST `/accounts/{account_id}/recalculate` - Rebuild running balances.
async fn recalculate(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path(account_id): Path<AccountId>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = &state.engine;
    let report = engine
        .with_retry(|| engine.recalculate(account_id))
        .await?;
    info!(
        account_id = %account_id,
        actor_id = %actor.id,
        writes = report.writes(),
        "Recalculation requested"
    );
    Ok(Json(report))
}

/// GET `/accounts/{account_id}/movements` - List an account's movements.
async fn list_movements(
    State(state): State<AppState>,
    Path(account_id): Path<AccountId>,
    Query(query): Query<ListMovementsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let movements = state
        .engine
        .list_by_account(account_id, query.order.unwrap_or_default())
        .await?;
    Ok(Json(json!({ "movements": movements })))
}
