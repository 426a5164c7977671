//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every REST endpoint, the request and response bodies
//! from [`crate::inbound::http::schemas`], the domain error payload and the
//! session cookie security scheme. Swagger UI serves it in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{
    CollectionStatus, Error, ErrorCode, RankingWarning, ResidueStatus, Role,
};
use crate::inbound::http::schemas::{
    CollectionBody, CollectionViewBody, PickupBody, PickupRequestBody, PointsHistoryResponse,
    PointsTransactionBody, ProfileResponse, RankedCollectionBody, RankingResponse,
    RedemptionBody, RedemptionResponse, RegisterRequest, ResidueBody, RewardBody,
    TransitionRequest, TransitionResponse,
};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/accounts.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "ReciclAI backend API",
        description = "Pickup requests, collection dispatch and lifecycle, and loyalty points.",
        license(name = "MIT")
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::accounts::register,
        crate::inbound::http::accounts::current_account,
        crate::inbound::http::accounts::logout,
        crate::inbound::http::pickups::request_pickup,
        crate::inbound::http::pickups::my_pickups,
        crate::inbound::http::collections::open_collections,
        crate::inbound::http::collections::active_collections,
        crate::inbound::http::collections::awaiting_processing,
        crate::inbound::http::collections::get_collection,
        crate::inbound::http::collections::attempt_transition,
        crate::inbound::http::rewards::list_rewards,
        crate::inbound::http::rewards::redeem_reward,
        crate::inbound::http::rewards::my_redemptions,
        crate::inbound::http::points::points_history,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        Role,
        CollectionStatus,
        ResidueStatus,
        RankingWarning,
        RegisterRequest,
        ProfileResponse,
        PickupRequestBody,
        PickupBody,
        ResidueBody,
        CollectionBody,
        CollectionViewBody,
        RankedCollectionBody,
        RankingResponse,
        TransitionRequest,
        TransitionResponse,
        RewardBody,
        RedemptionBody,
        RedemptionResponse,
        PointsTransactionBody,
        PointsHistoryResponse,
    )),
    tags(
        (name = "accounts", description = "Registration and session"),
        (name = "pickups", description = "Citizen pickup requests"),
        (name = "collections", description = "Dispatch and the collection lifecycle"),
        (name = "rewards", description = "Points ledger and reward redemption"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
