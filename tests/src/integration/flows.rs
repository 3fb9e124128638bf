//! # Integration Test Flows
//!
//! Progression (01) publishes committed events on the shared bus; the
//! recommendation sync (02) consumes purchase events from it.
//!
//! ## Flows Tested
//!
//! 1. **Progression → bus**: events arrive in commit order, only after commit
//! 2. **Bus → recommendation sync**: each purchase forwards the full owned set
//! 3. **Sync failures**: logged and dropped, the purchase stands

use std::sync::Arc;
use std::time::Duration;

use ql_01_progression::{ProgressionApi, ProgressionError, QuestStatus};
use ql_02_recommendation_sync::{AddUsersRequest, RecommendationSyncHandler};
use shared_bus::{EventFilter, EventTopic, ProgressionEvent, Subscription};
use shared_types::entities::QuestId;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::fixtures::{MockRecommendations, World};

fn drain(sub: &mut Subscription) -> Vec<ProgressionEvent> {
    let mut events = Vec::new();
    while let Ok(Some(event)) = sub.try_recv() {
        events.push(event);
    }
    events
}

fn spawn_sync(
    world: &World,
    client: Arc<MockRecommendations>,
) -> (watch::Sender<bool>, JoinHandle<()>) {
    let (tx, rx) = watch::channel(false);
    let handler = RecommendationSyncHandler::new(client, &world.bus, rx);
    (tx, tokio::spawn(handler.run()))
}

// =============================================================================
// PROGRESSION → EVENT BUS
// =============================================================================

#[test]
fn test_lifecycle_events_arrive_in_commit_order() {
    let world = World::new();
    let mut sub = world.bus.subscribe(EventFilter::all());
    let user = world.user("ada", 100);
    let quest = world.quest("Morning routine", 10, 2, 40);

    world.service.purchase(user.id, quest.id).unwrap();
    for task in &quest.tasks {
        world.service.complete_task(user.id, quest.id, task.id).unwrap();
    }
    world.service.complete_quest(user.id, quest.id).unwrap();

    let events = drain(&mut sub);
    let topics: Vec<EventTopic> = events.iter().map(ProgressionEvent::topic).collect();
    assert_eq!(
        topics,
        vec![
            EventTopic::Purchases,
            EventTopic::QuestLifecycle, // implicit start
            EventTopic::Tasks,
            EventTopic::Tasks,
            EventTopic::QuestLifecycle, // completed
            EventTopic::Levels,
        ]
    );

    // 80 task xp + 50 bonus crosses the level 2 threshold at 100
    assert_eq!(
        events.last(),
        Some(&ProgressionEvent::LevelUp {
            user_id: user.id,
            previous_level: 1,
            new_level: 2,
        })
    );
    let after = world.service.user(user.id).unwrap();
    assert_eq!(after.experience, 130);
    assert_eq!(after.balance, 100 - 10 + 2 + 5);
}

#[test]
fn test_rejected_operations_publish_nothing() {
    let world = World::new();
    let mut sub = world.bus.subscribe(EventFilter::all());
    let user = world.user("ada", 5);
    let quest = world.quest("Morning routine", 10, 2, 10);

    assert_eq!(
        world.service.purchase(user.id, quest.id),
        Err(ProgressionError::InsufficientFunds {
            required: 10,
            available: 5,
        })
    );
    assert!(world
        .service
        .complete_task(user.id, quest.id, quest.tasks[0].id)
        .is_err());
    assert!(world.service.complete_quest(user.id, quest.id).is_err());

    assert!(drain(&mut sub).is_empty());
}

#[test]
fn test_user_filter_only_sees_own_events() {
    let world = World::new();
    let ada = world.user("ada", 100);
    let bob = world.user("bob", 100);
    let quest = world.quest("Morning routine", 10, 1, 10);
    let mut bob_sub = world.bus.subscribe(EventFilter::for_users(vec![bob.id]));

    world.service.purchase(ada.id, quest.id).unwrap();
    world.service.purchase(bob.id, quest.id).unwrap();

    let events = drain(&mut bob_sub);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].users(), vec![bob.id]);
}

// =============================================================================
// EVENT BUS → RECOMMENDATION SYNC
// =============================================================================

#[tokio::test]
async fn test_purchases_forward_owned_quest_ids() {
    let world = World::new();
    let client = Arc::new(MockRecommendations::default());
    let (shutdown, handle) = spawn_sync(&world, Arc::clone(&client));

    let user = world.user("ada", 100);
    let evening = world.quest("Evening walk", 10, 1, 10);
    let morning = world.quest("Morning routine", 10, 1, 10);

    world.service.purchase(user.id, morning.id).unwrap();
    world.service.purchase(user.id, evening.id).unwrap();

    let requests = client.wait_for(2).await;
    assert_eq!(
        requests,
        vec![
            AddUsersRequest::single(user.id, vec![morning.id]),
            AddUsersRequest::single(user.id, vec![evening.id, morning.id]),
        ]
    );

    // Non-purchase traffic is not forwarded
    world
        .service
        .complete_task(user.id, morning.id, morning.tasks[0].id)
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(client.requests().len(), 2);

    shutdown.send(true).unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_sync_failure_does_not_undo_purchase() {
    let world = World::new();
    let client = Arc::new(MockRecommendations::failing());
    let (shutdown, handle) = spawn_sync(&world, Arc::clone(&client));

    let user = world.user("ada", 50);
    let quest = world.quest("Morning routine", 20, 1, 10);

    let receipt = world.service.purchase(user.id, quest.id).unwrap();
    assert_eq!(receipt.balance, 30);
    client.wait_for(1).await;

    let view = world.service.progress(user.id, quest.id).unwrap();
    assert_eq!(
        view.progress.row().map(|row| row.status),
        Some(QuestStatus::Purchased)
    );
    assert_eq!(world.service.user(user.id).unwrap().balance, 30);
    assert_eq!(world.service.quest_ids_for_user(user.id).unwrap(), vec![quest.id]);

    // The handler keeps running after a failure
    let second = world.quest("Evening walk", 10, 1, 10);
    world.service.purchase(user.id, second.id).unwrap();
    client.wait_for(2).await;

    shutdown.send(true).unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_rolled_back_purchase_is_not_synced() {
    let world = World::new();
    let client = Arc::new(MockRecommendations::default());
    let (shutdown, handle) = spawn_sync(&world, Arc::clone(&client));

    let user = world.user("ada", 100);
    let quest = world.quest("Morning routine", 10, 3, 10);

    // Debit and user quest row are staged; the first task row fails
    world.store.fail_after_writes(3);
    assert!(matches!(
        world.service.purchase(user.id, quest.id),
        Err(ProgressionError::PersistenceFailure(_))
    ));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(client.requests().is_empty());
    assert!(world
        .service
        .quest_ids_for_user(user.id)
        .unwrap()
        .is_empty());

    world.service.purchase(user.id, quest.id).unwrap();
    assert_eq!(
        client.wait_for(1).await,
        vec![AddUsersRequest::single(user.id, vec![QuestId(1)])]
    );

    shutdown.send(true).unwrap();
    handle.await.unwrap();
}
