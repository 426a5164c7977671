//! Ledger behaviour over the in-memory store: balances track history and
//! redemptions debit exactly once.

use std::sync::Arc;

use reciclai::domain::ports::{RewardsCommand, RewardsQuery};
use reciclai::domain::{ErrorCode, PointsAward, Reward, RewardId, Role};
use reciclai::outbound::memory::InMemoryStore;
use rstest::rstest;
use uuid::Uuid;

mod support;

use support::World;

fn reward(cost: u64, active: bool) -> Reward {
    Reward {
        id: RewardId::from_uuid(Uuid::from_u128(cost.into())),
        name: format!("reward-{cost}"),
        description: None,
        cost,
        active,
    }
}

fn world_with(rewards: Vec<Reward>, award: u64) -> World {
    World::over(
        Arc::new(InMemoryStore::with_rewards(rewards)),
        PointsAward::new(award).expect("positive award"),
    )
}

#[rstest]
#[tokio::test]
async fn balance_equals_the_sum_of_the_history() {
    let world = world_with(vec![reward(15, true)], 10);
    let citizen = world.register("maria", Role::Citizen).await;
    let collector = world.register("joao", Role::Collector).await;
    let recycler = world.register("coop", Role::Recycler).await;

    for _ in 0..3 {
        world.complete_pickup(citizen, collector, recycler).await;
    }
    world
        .rewards
        .redeem(citizen, reward(15, true).id)
        .await
        .expect("balance covers the cost");

    let statement = world
        .rewards
        .points_history(citizen)
        .await
        .expect("history loads");
    assert_eq!(statement.balance, 15);
    assert_eq!(statement.transactions.len(), 4);
    assert_eq!(statement.ledger_total(), 15);
}

#[rstest]
#[tokio::test]
async fn redeeming_with_the_exact_balance_empties_it() {
    let world = world_with(vec![reward(20, true)], 20);
    let citizen = world.register("maria", Role::Citizen).await;
    let collector = world.register("joao", Role::Collector).await;
    let recycler = world.register("coop", Role::Recycler).await;
    world.complete_pickup(citizen, collector, recycler).await;

    let receipt = world
        .rewards
        .redeem(citizen, reward(20, true).id)
        .await
        .expect("exact balance is enough");

    assert_eq!(receipt.balance, 0);
    assert_eq!(receipt.cost, 20);
    let redemptions = world
        .rewards
        .redemptions(citizen)
        .await
        .expect("redemptions load");
    assert_eq!(redemptions.len(), 1);
}

#[rstest]
#[tokio::test]
async fn redeeming_one_point_short_changes_nothing() {
    let world = world_with(vec![reward(20, true)], 19);
    let citizen = world.register("maria", Role::Citizen).await;
    let collector = world.register("joao", Role::Collector).await;
    let recycler = world.register("coop", Role::Recycler).await;
    world.complete_pickup(citizen, collector, recycler).await;

    let error = world
        .rewards
        .redeem(citizen, reward(20, true).id)
        .await
        .expect_err("balance falls short");

    assert_eq!(error.code(), ErrorCode::InsufficientBalance);
    let statement = world
        .rewards
        .points_history(citizen)
        .await
        .expect("history loads");
    assert_eq!(statement.balance, 19);
    assert_eq!(statement.transactions.len(), 1);
    assert!(
        world
            .rewards
            .redemptions(citizen)
            .await
            .expect("redemptions load")
            .is_empty()
    );
}

#[rstest]
#[tokio::test]
async fn inactive_rewards_are_refused() {
    let world = world_with(vec![reward(5, false)], 10);
    let citizen = world.register("maria", Role::Citizen).await;
    let collector = world.register("joao", Role::Collector).await;
    let recycler = world.register("coop", Role::Recycler).await;
    world.complete_pickup(citizen, collector, recycler).await;

    let error = world
        .rewards
        .redeem(citizen, reward(5, false).id)
        .await
        .expect_err("reward is inactive");

    assert_eq!(error.code(), ErrorCode::RewardInactive);
    assert!(world.rewards.catalogue().await.expect("catalogue").is_empty());
}

#[rstest]
#[tokio::test]
async fn unknown_rewards_are_not_found() {
    let world = World::new();
    let citizen = world.register("maria", Role::Citizen).await;

    let error = world
        .rewards
        .redeem(citizen, RewardId::random())
        .await
        .expect_err("reward does not exist");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn concurrent_redemptions_never_overdraw() {
    let world = Arc::new(world_with(vec![reward(20, true)], 30));
    let citizen = world.register("maria", Role::Citizen).await;
    let collector = world.register("joao", Role::Collector).await;
    let recycler = world.register("coop", Role::Recycler).await;
    world.complete_pickup(citizen, collector, recycler).await;

    let attempts = [0, 1].map(|_| {
        let world = Arc::clone(&world);
        tokio::spawn(async move { world.rewards.redeem(citizen, reward(20, true).id).await })
    });
    let mut succeeded = 0;
    for attempt in attempts {
        if attempt.await.expect("redeem task completes").is_ok() {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 1);
    let statement = world
        .rewards
        .points_history(citizen)
        .await
        .expect("history loads");
    assert_eq!(statement.balance, 10);
    assert_eq!(statement.ledger_total(), 10);
}
