//! Points history handler.
//!
//! ```text
//! GET /api/v1/points
//! ```

use actix_web::{get, web};

use crate::domain::Error;
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::PointsHistoryResponse;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Balance and every ledger entry, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/points",
    responses(
        (status = 200, description = "Points history", body = PointsHistoryResponse),
        (status = 401, description = "Not signed in", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["rewards"],
    operation_id = "pointsHistory"
)]
#[get("/points")]
pub async fn points_history(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<PointsHistoryResponse>> {
    let actor = state.actor(&session).await?;
    let statement = state.rewards_query.points_history(actor).await?;
    Ok(web::Json(PointsHistoryResponse::from(statement)))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::domain::{CollectionId, PointsLedger, PointsStatement, Role};
    use crate::inbound::http::test_utils::{TestPorts, call_as, json_body};
    use crate::test_support::{actor, fixture_timestamp};

    fn routes(cfg: &mut web::ServiceConfig) {
        cfg.service(points_history);
    }

    #[rstest]
    #[actix_web::test]
    async fn history_reports_balance_and_entries() {
        let citizen = actor(Role::Citizen);
        let credit = PointsLedger::award_for_collection(
            citizen.user_id(),
            CollectionId::random(),
            10,
            fixture_timestamp(),
        )
        .expect("positive award");
        let mut ports = TestPorts::signed_in(citizen);
        ports
            .rewards_query
            .expect_points_history()
            .withf(move |who| *who == citizen)
            .return_once(move |_| {
                Ok(PointsStatement {
                    balance: 10,
                    transactions: vec![credit],
                })
            });

        let res = call_as(
            ports.into_state(),
            routes,
            Some(citizen.user_id()),
            TestRequest::get().uri("/points"),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["balance"], json!(10));
        assert_eq!(body["transactions"][0]["points"], json!(10));
    }

    #[rstest]
    #[actix_web::test]
    async fn history_requires_a_session() {
        let res = call_as(
            TestPorts::default().into_state(),
            routes,
            None,
            TestRequest::get().uri("/points"),
        )
        .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
