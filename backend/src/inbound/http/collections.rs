//! Collection workflow handlers: dispatch, dashboards and status changes.
//!
//! ```text
//! GET /api/v1/collections/open?lat=&lon=
//! GET /api/v1/collections/active
//! GET /api/v1/collections/awaiting-processing
//! GET /api/v1/collections/{id}
//! POST /api/v1/collections/{id}/status
//! ```
//!
//! The literal paths must be registered before `/collections/{id}`.

use actix_web::{get, post, web};

use crate::domain::{CollectionId, CollectorLocation, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{
    CollectionBody, CollectionViewBody, OpenCollectionsQuery, RankingResponse, TransitionRequest,
    TransitionResponse,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_status, parse_uuid, required_text};

fn collection_id(raw: &str) -> Result<CollectionId, Error> {
    parse_uuid(raw, FieldName::new("id")).map(CollectionId::from_uuid)
}

/// Open pickups for the signed-in collector.
///
/// With a valid `lat`/`lon` the list is nearest first; otherwise it falls back
/// to oldest first and, for unusable input, reports a `malformed_input`
/// warning instead of failing.
#[utoipa::path(
    get,
    path = "/api/v1/collections/open",
    params(OpenCollectionsQuery),
    responses(
        (status = 200, description = "Ranked open pickups", body = RankingResponse),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Collectors only", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["collections"],
    operation_id = "rankOpenCollections"
)]
#[get("/collections/open")]
pub async fn open_collections(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<OpenCollectionsQuery>,
) -> ApiResult<web::Json<RankingResponse>> {
    let actor = state.actor(&session).await?;
    let location = CollectorLocation::from_query(query.lat.as_deref(), query.lon.as_deref());
    let ranking = state.collections_query.rank_open(actor, location).await?;
    Ok(web::Json(RankingResponse::from(ranking)))
}

/// Pickups the signed-in collector currently holds.
#[utoipa::path(
    get,
    path = "/api/v1/collections/active",
    responses(
        (status = 200, description = "Active pickups", body = [CollectionBody]),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Collectors only", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["collections"],
    operation_id = "myActiveCollections"
)]
#[get("/collections/active")]
pub async fn active_collections(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<CollectionBody>>> {
    let actor = state.actor(&session).await?;
    let active = state.collections_query.active(actor).await?;
    Ok(web::Json(active.iter().map(CollectionBody::from).collect()))
}

/// Deliveries waiting for a recycler.
#[utoipa::path(
    get,
    path = "/api/v1/collections/awaiting-processing",
    responses(
        (status = 200, description = "Delivered pickups", body = [CollectionBody]),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Recyclers only", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["collections"],
    operation_id = "awaitingProcessing"
)]
#[get("/collections/awaiting-processing")]
pub async fn awaiting_processing(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<CollectionBody>>> {
    let actor = state.actor(&session).await?;
    let delivered = state.collections_query.awaiting_processing(actor).await?;
    Ok(web::Json(delivered.iter().map(CollectionBody::from).collect()))
}

/// One pickup with the statuses the caller may request next.
#[utoipa::path(
    get,
    path = "/api/v1/collections/{id}",
    params(("id" = String, Path, description = "Collection id")),
    responses(
        (status = 200, description = "Collection", body = CollectionViewBody),
        (status = 400, description = "Invalid id", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["collections"],
    operation_id = "getCollection"
)]
#[get("/collections/{id}")]
pub async fn get_collection(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<CollectionViewBody>> {
    let actor = state.actor(&session).await?;
    let id = collection_id(&path)?;
    let view = state.collections_query.get(actor, id).await?;
    Ok(web::Json(CollectionViewBody::from(view)))
}

/// Move a pickup to a new status.
///
/// Requesting the current status is a no-op reported with `changed: false`.
/// Processing a delivery credits the citizen in the same unit of work.
#[utoipa::path(
    post,
    path = "/api/v1/collections/{id}/status",
    params(("id" = String, Path, description = "Collection id")),
    request_body = TransitionRequest,
    responses(
        (status = 200, description = "Transition outcome", body = TransitionResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Not allowed for this actor", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Transition not allowed from the current status",
            body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["collections"],
    operation_id = "attemptTransition"
)]
#[post("/collections/{id}/status")]
pub async fn attempt_transition(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<TransitionRequest>,
) -> ApiResult<web::Json<TransitionResponse>> {
    let actor = state.actor(&session).await?;
    let id = collection_id(&path)?;
    let raw_status = required_text(payload.into_inner().status, FieldName::new("status"))?;
    let requested = parse_status(&raw_status, FieldName::new("status"))?;
    let outcome = state
        .collections
        .attempt_transition(actor, id, requested)
        .await?;
    Ok(web::Json(TransitionResponse::from(outcome)))
}

#[cfg(test)]
#[path = "collections_tests.rs"]
mod tests;
