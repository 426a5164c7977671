//! Reward catalogue and redemption handlers.
//!
//! ```text
//! GET /api/v1/rewards
//! POST /api/v1/rewards/{id}/redeem
//! GET /api/v1/rewards/redemptions
//! ```

use actix_web::{HttpResponse, get, post, web};

use crate::domain::{Error, RewardId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{RedemptionBody, RedemptionResponse, RewardBody};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_uuid};

/// Active rewards, cheapest first.
#[utoipa::path(
    get,
    path = "/api/v1/rewards",
    responses(
        (status = 200, description = "Reward catalogue", body = [RewardBody]),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["rewards"],
    operation_id = "listRewards",
    security([])
)]
#[get("/rewards")]
pub async fn list_rewards(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<RewardBody>>> {
    let rewards = state.rewards_query.catalogue().await?;
    Ok(web::Json(rewards.iter().map(RewardBody::from).collect()))
}

/// Spend points on a reward.
#[utoipa::path(
    post,
    path = "/api/v1/rewards/{id}/redeem",
    params(("id" = String, Path, description = "Reward id")),
    responses(
        (status = 201, description = "Reward redeemed", body = RedemptionResponse),
        (status = 400, description = "Invalid id", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 404, description = "Unknown reward", body = Error),
        (status = 409, description = "Reward inactive or balance too low", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["rewards"],
    operation_id = "redeemReward"
)]
#[post("/rewards/{id}/redeem")]
pub async fn redeem_reward(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let actor = state.actor(&session).await?;
    let reward_id = parse_uuid(&path, FieldName::new("id")).map(RewardId::from_uuid)?;
    let receipt = state.rewards.redeem(actor, reward_id).await?;
    Ok(HttpResponse::Created().json(RedemptionResponse::from(receipt)))
}

/// The signed-in user's redemptions, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/rewards/redemptions",
    responses(
        (status = 200, description = "Redemptions", body = [RedemptionBody]),
        (status = 401, description = "Not signed in", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["rewards"],
    operation_id = "myRedemptions"
)]
#[get("/rewards/redemptions")]
pub async fn my_redemptions(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<RedemptionBody>>> {
    let actor = state.actor(&session).await?;
    let redemptions = state.rewards_query.redemptions(actor).await?;
    Ok(web::Json(redemptions.iter().map(RedemptionBody::from).collect()))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;
    use chrono::Duration;
    use rstest::rstest;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::domain::ports::RedemptionReceipt;
    use crate::domain::{Role, UserReward};
    use crate::inbound::http::test_utils::{TestPorts, call_as, json_body};
    use crate::outbound::memory::default_rewards;
    use crate::test_support::{actor, fixture_timestamp};

    fn routes(cfg: &mut web::ServiceConfig) {
        cfg.service(list_rewards)
            .service(my_redemptions)
            .service(redeem_reward);
    }

    #[rstest]
    #[actix_web::test]
    async fn catalogue_is_public() {
        let mut ports = TestPorts::default();
        ports
            .rewards_query
            .expect_catalogue()
            .return_once(|| Ok(default_rewards()));

        let res = call_as(
            ports.into_state(),
            routes,
            None,
            TestRequest::get().uri("/rewards"),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body.as_array().map(Vec::len), Some(3));
    }

    #[rstest]
    #[actix_web::test]
    async fn redemption_returns_the_remaining_balance() {
        let citizen = actor(Role::Citizen);
        let reward = default_rewards()
            .into_iter()
            .find(|reward| reward.cost == 20)
            .expect("seeded reward");
        let reward_id = reward.id;
        let mut ports = TestPorts::signed_in(citizen);
        ports
            .rewards
            .expect_redeem()
            .withf(move |who, id| *who == citizen && *id == reward_id)
            .times(1)
            .return_once(move |_, _| {
                Ok(RedemptionReceipt {
                    user_reward: UserReward {
                        id: Uuid::new_v4(),
                        user_id: citizen.user_id(),
                        reward_id,
                        reward_name: reward.name,
                        redeemed_at: fixture_timestamp(),
                    },
                    cost: reward.cost,
                    balance: 0,
                })
            });

        let res = call_as(
            ports.into_state(),
            routes,
            Some(citizen.user_id()),
            TestRequest::post().uri(&format!("/rewards/{reward_id}/redeem")),
        )
        .await;

        assert_eq!(res.status(), StatusCode::CREATED);
        let body = json_body(res).await;
        assert_eq!(body["cost"], json!(20));
        assert_eq!(body["balance"], json!(0));
        assert_eq!(body["redemption"]["rewardName"], json!("Muda de árvore"));
    }

    #[rstest]
    #[case(Error::insufficient_balance("balance 19 is below cost 20"), StatusCode::CONFLICT)]
    #[case(Error::reward_inactive("reward is no longer offered"), StatusCode::CONFLICT)]
    #[case(Error::not_found("reward not found"), StatusCode::NOT_FOUND)]
    #[actix_web::test]
    async fn redemption_failures_map_to_statuses(
        #[case] failure: Error,
        #[case] status: StatusCode,
    ) {
        let citizen = actor(Role::Citizen);
        let code = failure.code();
        let mut ports = TestPorts::signed_in(citizen);
        ports
            .rewards
            .expect_redeem()
            .return_once(move |_, _| Err(failure));

        let res = call_as(
            ports.into_state(),
            routes,
            Some(citizen.user_id()),
            TestRequest::post().uri(&format!("/rewards/{}/redeem", RewardId::random())),
        )
        .await;

        assert_eq!(res.status(), status);
        assert_eq!(json_body(res).await["code"], json!(code));
    }

    #[rstest]
    #[actix_web::test]
    async fn redemptions_list_newest_first() {
        let citizen = actor(Role::Citizen);
        let rewards = default_rewards();
        let records: Vec<UserReward> = rewards
            .iter()
            .zip(0..)
            .map(|(reward, age)| UserReward {
                id: Uuid::new_v4(),
                user_id: citizen.user_id(),
                reward_id: reward.id,
                reward_name: reward.name.clone(),
                redeemed_at: fixture_timestamp() - Duration::days(age),
            })
            .collect();
        let mut ports = TestPorts::signed_in(citizen);
        ports
            .rewards_query
            .expect_redemptions()
            .return_once(move |_| Ok(records));

        let res = call_as(
            ports.into_state(),
            routes,
            Some(citizen.user_id()),
            TestRequest::get().uri("/rewards/redemptions"),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body[0]["rewardName"], json!("Vale-feira R$ 10"));
    }
}
