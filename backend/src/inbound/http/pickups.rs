//! Citizen pickup handlers.
//!
//! ```text
//! POST /api/v1/pickups
//! GET /api/v1/pickups/mine
//! ```

use actix_web::{HttpResponse, get, post, web};

use crate::domain::Error;
use crate::domain::ResidueDraft;
use crate::domain::ports::PickupRequest;
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{PickupBody, PickupRequestBody};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, coordinate, required_text};

/// Report a residue and ask for it to be collected.
#[utoipa::path(
    post,
    path = "/api/v1/pickups",
    request_body = PickupRequestBody,
    responses(
        (status = 201, description = "Pickup requested", body = PickupBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Citizens only", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["pickups"],
    operation_id = "requestPickup"
)]
#[post("/pickups")]
pub async fn request_pickup(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<PickupRequestBody>,
) -> ApiResult<HttpResponse> {
    let actor = state.actor(&session).await?;
    let PickupRequestBody {
        residue_type,
        weight_kg,
        units,
        notes,
        latitude,
        longitude,
    } = payload.into_inner();
    let request = PickupRequest {
        residue: ResidueDraft {
            residue_type: required_text(residue_type, FieldName::new("residueType"))?,
            weight_kg,
            units,
            notes,
        },
        location: coordinate(latitude, longitude)?,
    };

    let details = state.collections.request_pickup(actor, request).await?;
    Ok(HttpResponse::Created().json(PickupBody::from(&details)))
}

/// The citizen's pickups with their residues, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/pickups/mine",
    responses(
        (status = 200, description = "Pickups", body = [PickupBody]),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Citizens only", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["pickups"],
    operation_id = "myPickups"
)]
#[get("/pickups/mine")]
pub async fn my_pickups(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<PickupBody>>> {
    let actor = state.actor(&session).await?;
    let pickups = state.collections_query.my_pickups(actor).await?;
    Ok(web::Json(pickups.iter().map(PickupBody::from).collect()))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::domain::{CollectionStatus, Role};
    use crate::inbound::http::test_utils::{TestPorts, call_as, json_body};
    use crate::test_support::{actor, collection_in};

    fn routes(cfg: &mut web::ServiceConfig) {
        cfg.service(request_pickup).service(my_pickups);
    }

    #[rstest]
    #[actix_web::test]
    async fn pickup_request_reaches_the_service() {
        let citizen = actor(Role::Citizen);
        let details = collection_in(citizen, actor(Role::Collector), CollectionStatus::Requested);
        let mut ports = TestPorts::signed_in(citizen);
        ports
            .collections
            .expect_request_pickup()
            .withf(move |who, request| {
                *who == citizen
                    && request.residue.units == Some(10)
                    && request.location.latitude() == -5.1136
            })
            .times(1)
            .return_once(move |_, _| Ok(details));

        let res = call_as(
            ports.into_state(),
            routes,
            Some(citizen.user_id()),
            TestRequest::post().uri("/pickups").set_json(json!({
                "residueType": "Garrafa PET",
                "units": 10,
                "latitude": -5.1136,
                "longitude": -42.8487,
            })),
        )
        .await;

        assert_eq!(res.status(), StatusCode::CREATED);
        let body = json_body(res).await;
        assert_eq!(body["collection"]["status"], json!("requested"));
        assert_eq!(body["residue"]["status"], json!("pickup_requested"));
    }

    #[rstest]
    #[case(json!({"units": 10, "latitude": -5.1, "longitude": -42.8}), "residueType")]
    #[case(json!({"residueType": "Vidro", "latitude": -5.1}), "longitude")]
    #[case(json!({"residueType": "Vidro", "latitude": 95.0, "longitude": -42.8}), "location")]
    #[actix_web::test]
    async fn malformed_pickups_never_reach_the_service(
        #[case] payload: serde_json::Value,
        #[case] field: &str,
    ) {
        let citizen = actor(Role::Citizen);

        let res = call_as(
            TestPorts::signed_in(citizen).into_state(),
            routes,
            Some(citizen.user_id()),
            TestRequest::post().uri("/pickups").set_json(payload),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(res).await["details"]["field"], json!(field));
    }

    #[rstest]
    #[actix_web::test]
    async fn collectors_cannot_request_pickups() {
        let collector = actor(Role::Collector);
        let mut ports = TestPorts::signed_in(collector);
        ports
            .collections
            .expect_request_pickup()
            .return_once(|_, _| Err(Error::forbidden("only citizens can request pickups")));

        let res = call_as(
            ports.into_state(),
            routes,
            Some(collector.user_id()),
            TestRequest::post().uri("/pickups").set_json(json!({
                "residueType": "Vidro",
                "weightKg": 3.0,
                "latitude": -5.1,
                "longitude": -42.8,
            })),
        )
        .await;

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[rstest]
    #[actix_web::test]
    async fn my_pickups_lists_each_with_its_residue() {
        let citizen = actor(Role::Citizen);
        let collector = actor(Role::Collector);
        let pickups = vec![
            collection_in(citizen, collector, CollectionStatus::EnRoute),
            collection_in(citizen, collector, CollectionStatus::Requested),
        ];
        let mut ports = TestPorts::signed_in(citizen);
        ports
            .collections_query
            .expect_my_pickups()
            .return_once(move |_| Ok(pickups));

        let res = call_as(
            ports.into_state(),
            routes,
            Some(citizen.user_id()),
            TestRequest::get().uri("/pickups/mine"),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body[0]["collection"]["status"], json!("en_route"));
        assert_eq!(body[1]["residue"]["residueType"], json!("Garrafa PET"));
    }
}
