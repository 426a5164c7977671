//! HTTP round trip over the in-memory store: three users drive one pickup
//! from request to processing through the REST API.

use std::sync::Arc;

use actix_http::Request;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::BoxBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use mockable::DefaultClock;
use reciclai::domain::{AccountService, CollectionService, PointsAward, RewardsService};
use reciclai::inbound::http::accounts::{current_account, logout, register};
use reciclai::inbound::http::collections::{
    active_collections, attempt_transition, awaiting_processing, get_collection,
    open_collections,
};
use reciclai::inbound::http::pickups::{my_pickups, request_pickup};
use reciclai::inbound::http::points::points_history;
use reciclai::inbound::http::rewards::{list_rewards, my_redemptions, redeem_reward};
use reciclai::inbound::http::state::{HttpState, HttpStatePorts};
use reciclai::outbound::memory::InMemoryStore;
use rstest::rstest;
use serde_json::{Value, json};

fn http_state() -> web::Data<HttpState> {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(DefaultClock);
    let accounts = Arc::new(AccountService::new(store.clone(), clock.clone()));
    let collections = Arc::new(CollectionService::new(
        store.clone(),
        clock.clone(),
        PointsAward::default(),
    ));
    let rewards = Arc::new(RewardsService::new(store, clock));
    web::Data::new(HttpState::new(HttpStatePorts {
        accounts: accounts.clone(),
        accounts_query: accounts,
        collections: collections.clone(),
        collections_query: collections,
        rewards: rewards.clone(),
        rewards_query: rewards,
    }))
}

async fn app(
    state: web::Data<HttpState>,
) -> impl Service<Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error> {
    let session = SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".into())
        .cookie_secure(false)
        .build();
    test::init_service(
        App::new().app_data(state).wrap(reciclai::Trace).service(
            web::scope("/api/v1")
                .wrap(session)
                .service(register)
                .service(current_account)
                .service(logout)
                .service(request_pickup)
                .service(my_pickups)
                .service(open_collections)
                .service(active_collections)
                .service(awaiting_processing)
                .service(get_collection)
                .service(attempt_transition)
                .service(list_rewards)
                .service(my_redemptions)
                .service(redeem_reward)
                .service(points_history),
        ),
    )
    .await
}

fn session_cookie<B>(res: &ServiceResponse<B>) -> Cookie<'static> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie")
        .into_owned()
}

#[rstest]
#[actix_web::test]
async fn pickup_travels_from_request_to_points() {
    let app = app(http_state()).await;

    let mut cookies = Vec::new();
    for (username, role) in [
        ("maria", "citizen"),
        ("joao", "collector"),
        ("coop", "recycler"),
    ] {
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/accounts")
                .set_json(json!({ "username": username, "role": role }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        cookies.push(session_cookie(&res));
    }
    let [citizen, collector, recycler]: [Cookie<'static>; 3] =
        cookies.try_into().expect("three sessions");

    let pickup: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/pickups")
            .cookie(citizen.clone())
            .set_json(json!({
                "residueType": "glass",
                "units": 10,
                "latitude": -5.1136,
                "longitude": -42.8487
            }))
            .to_request(),
    )
    .await;
    assert_eq!(pickup["collection"]["status"], "requested");
    assert_eq!(pickup["residue"]["status"], "pickup_requested");
    let id = pickup["collection"]["id"]
        .as_str()
        .expect("collection id")
        .to_owned();

    let ranking: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/collections/open?lat=-5.10&lon=-42.80")
            .cookie(collector.clone())
            .to_request(),
    )
    .await;
    assert_eq!(ranking["collections"][0]["collection"]["id"], id.as_str());
    assert!(ranking["collections"][0]["distanceKm"].is_number());

    for status in ["assigned", "en_route", "collected", "delivered_to_recycler"] {
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/api/v1/collections/{id}/status"))
                .cookie(collector.clone())
                .set_json(json!({ "status": status }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK, "moving to {status}");
    }

    let processed: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/collections/{id}/status"))
            .cookie(recycler)
            .set_json(json!({ "status": "processed" }))
            .to_request(),
    )
    .await;
    assert_eq!(processed["collection"]["status"], "processed");
    assert_eq!(processed["pointsAwarded"], 10);

    let history: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/points")
            .cookie(citizen)
            .to_request(),
    )
    .await;
    assert_eq!(history["balance"], 10);
    assert_eq!(
        history["transactions"].as_array().map(Vec::len),
        Some(1)
    );
}

#[rstest]
#[actix_web::test]
async fn protected_routes_require_a_session() {
    let app = app(http_state()).await;

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/points").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let catalogue = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/rewards").to_request(),
    )
    .await;
    assert_eq!(catalogue.status(), StatusCode::OK);
}
