//! Movement routes: create, lifecycle operations and listings.
//!
//! Cancel, restore and edit are retried on commit conflicts. Create is not;
//! clients retry it with an `idempotency_key`.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use stockledger_core::{
    CancelOutcome, CreateMovementInput, EditMovementInput, EditOutcome, LineItemInput,
    LineItemsInput, Movement, MovementKind, RecalculationReport, RestoreOutcome,
};
use stockledger_shared::types::{AccountId, MovementId};

use crate::{AppState, error::ApiError, extractors::RequestActor};

/// Creates the movement routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/movements", post(create_movement).get(list_by_time_range))
        .route("/movements/{movement_id}", get(get_movement).patch(edit_movement))
        .route("/movements/{movement_id}/cancel", post(cancel_movement))
        .route("/movements/{movement_id}/restore", post(restore_movement))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a movement.
#[derive(Debug, Deserialize)]
pub struct CreateMovementRequest {
    /// Owning account; the nil UUID addresses the walk-in account.
    pub account_id: AccountId,
    /// Name used when the account does not exist yet.
    pub account_name: Option<String>,
    /// `outflow` or `inflow`.
    pub kind: MovementKind,
    /// Positive amount.
    pub amount: Decimal,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Business timestamp (RFC 3339); now when absent.
    pub timestamp: Option<DateTime<Utc>>,
    /// Item lines for sales and purchases.
    pub lines: Option<LineItemsInput>,
    /// Key that deduplicates retried creates.
    pub idempotency_key: Option<String>,
}

/// Request body for cancelling a movement.
#[derive(Debug, Default, Deserialize)]
pub struct CancelMovementRequest {
    /// Optional reason.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Request body for editing a movement. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct EditMovementRequest {
    /// New kind.
    pub kind: Option<MovementKind>,
    /// New amount.
    pub amount: Option<Decimal>,
    /// New description.
    pub description: Option<String>,
    /// New lines (line-itemed movements only).
    pub lines: Option<Vec<LineItemInput>>,
    /// Optional reason.
    pub reason: Option<String>,
}

/// Query parameters for listing movements by time.
#[derive(Debug, Deserialize)]
pub struct TimeRangeQuery {
    /// Inclusive start.
    pub from: DateTime<Utc>,
    /// Exclusive end.
    pub to: DateTime<Utc>,
}

/// Response for a create.
#[derive(Debug, Serialize)]
pub struct CreateMovementResponse {
    /// The created movement, or the earlier one on a deduplicated retry.
    pub movement: Movement,
    /// True when an earlier create with the same key was returned.
    pub deduplicated: bool,
    /// Inline recalculation report.
    pub recalculation: Option<RecalculationReport>,
}

/// Response for cancel, restore and edit.
///
/// `outcome` is one of `cancelled`, `already_cancelled`, `restored`,
/// `not_cancelled`, `modified` or `replaced`.
#[derive(Debug, Serialize)]
pub struct MovementOutcomeResponse {
    /// What happened.
    pub outcome: &'static str,
    /// The movement carrying the current values.
    pub movement: Movement,
    /// The cancelled original of a replacing edit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original: Option<Movement>,
    /// Inline recalculation report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recalculation: Option<RecalculationReport>,
}

impl MovementOutcomeResponse {
    fn new(
        outcome: &'static str,
        movement: Movement,
        recalculation: Option<RecalculationReport>,
    ) -> Self {
        Self {
            outcome,
            movement,
            original: None,
            recalculation,
        }
    }
}

impl From<CancelOutcome> for MovementOutcomeResponse {
    fn from(outcome: CancelOutcome) -> Self {
        match outcome {
            CancelOutcome::Cancelled {
                movement,
                recalculation,
            } => Self::new("cancelled", movement, recalculation),
            CancelOutcome::AlreadyCancelled { movement } => {
                Self::new("already_cancelled", movement, None)
            }
        }
    }
}

impl From<RestoreOutcome> for MovementOutcomeResponse {
    fn from(outcome: RestoreOutcome) -> Self {
        match outcome {
            RestoreOutcome::Restored {
                movement,
                recalculation,
            } => Self::new("restored", movement, recalculation),
            RestoreOutcome::NotCancelled { movement } => Self::new("not_cancelled", movement, None),
        }
    }
}

impl From<EditOutcome> for MovementOutcomeResponse {
    fn from(outcome: EditOutcome) -> Self {
        match outcome {
            EditOutcome::Modified {
                movement,
                recalculation,
            } => Self::new("modified", movement, recalculation),
            EditOutcome::Replaced {
                original,
                replacement,
                recalculation,
            } => Self {
                original: Some(original),
                ..Self::new("replaced", replacement, recalculation)
            },
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/movements` - Create a movement.
///
/// Returns 201 for a new movement and 200 for a deduplicated retry.
async fn create_movement(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Json(payload): Json<CreateMovementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .engine
        .create(CreateMovementInput {
            account_id: payload.account_id,
            account_name: payload.account_name,
            kind: payload.kind,
            amount: payload.amount,
            description: payload.description,
            timestamp: payload.timestamp,
            lines: payload.lines,
            idempotency_key: payload.idempotency_key,
            actor,
        })
        .await?;

    let status = if outcome.deduplicated {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((
        status,
        Json(CreateMovementResponse {
            movement: outcome.movement,
            deduplicated: outcome.deduplicated,
            recalculation: outcome.recalculation,
        }),
    ))
}

/// GET `/movements/{movement_id}` - Get a movement.
async fn get_movement(
    State(state): State<AppState>,
    Path(movement_id): Path<MovementId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.engine.movement(movement_id).await?))
}

/// GET `/movements?from=&to=` - List movements in a time range.
async fn list_by_time_range(
    State(state): State<AppState>,
    Query(query): Query<TimeRangeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let movements = state
        .engine
        .list_by_time_range(query.from, query.to)
        .await?;
    Ok(Json(json!({ "movements": movements })))
}

/// POST `/movements/{movement_id}/cancel` - Cancel a movement.
async fn cancel_movement(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path(movement_id): Path<MovementId>,
    Json(payload): Json<CancelMovementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = &state.engine;
    let outcome = engine
        .with_retry(|| engine.cancel(movement_id, payload.reason.clone(), actor.clone()))
        .await?;
    Ok(Json(MovementOutcomeResponse::from(outcome)))
}

/// POST `/movements/{movement_id}/restore` - Restore a cancelled movement.
async fn restore_movement(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path(movement_id): Path<MovementId>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = &state.engine;
    let outcome = engine
        .with_retry(|| engine.restore(movement_id, actor.clone()))
        .await?;
    Ok(Json(MovementOutcomeResponse::from(outcome)))
}

/// PATCH `/movements/{movement_id}` - Edit a movement.
async fn edit_movement(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path(movement_id): Path<MovementId>,
    Json(payload): Json<EditMovementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = EditMovementInput {
        kind: payload.kind,
        amount: payload.amount,
        description: payload.description,
        lines: payload.lines,
        reason: payload.reason,
        actor,
    };
    let engine = &state.engine;
    let outcome = engine
        .with_retry(|| engine.edit(movement_id, input.clone()))
        .await?;
    Ok(Json(MovementOutcomeResponse::from(outcome)))
}
