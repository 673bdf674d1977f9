//! Request extractors.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use stockledger_core::Actor;
use stockledger_shared::{AppError, types::ActorId};

use crate::error::ApiError;

/// Header carrying the acting user's id.
pub const ACTOR_ID_HEADER: &str = "x-actor-id";
/// Header carrying the acting user's display name.
pub const ACTOR_NAME_HEADER: &str = "x-actor-name";

/// The user performing a mutation, taken from the `X-Actor-Id` and
/// `X-Actor-Name` headers.
///
/// Identity is asserted by the caller; the ledger only records it.
///
/// ```ignore
/// async fn handler(RequestActor(actor): RequestActor) -> impl IntoResponse {
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequestActor(pub Actor);

fn actor_from_headers(headers: &HeaderMap) -> Option<Actor> {
    let id: ActorId = headers
        .get(ACTOR_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.trim().parse().ok())?;
    let name = headers
        .get(ACTOR_NAME_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map_or_else(|| id.to_string(), str::to_string);
    Some(Actor::new(id, name))
}

impl<S> FromRequestParts<S> for RequestActor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        actor_from_headers(&parts.headers)
            .map(RequestActor)
            .ok_or_else(|| {
                AppError::MissingActor(
                    "X-Actor-Id header with a valid UUID is required".to_string(),
                )
                .into()
            })
    }
}
