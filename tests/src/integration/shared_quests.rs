//! # Shared Quest Flows
//!
//! Two friends enrolled in one quest, from creation to the joint reward,
//! observed through the bus and the recommendation sync.

use std::sync::Arc;

use ql_01_progression::{
    LedgerKind, ProgressionApi, ProgressionError, QuestCompletion, QuestStatus,
    SharedQuestStatus,
};
use ql_02_recommendation_sync::{AddUsersRequest, RecommendationSyncHandler};
use shared_bus::{EventFilter, EventTopic, ProgressionEvent};
use tokio::sync::watch;

use super::fixtures::{MockRecommendations, World};

#[tokio::test]
async fn test_shared_quest_end_to_end() {
    let world = World::new();
    let client = Arc::new(MockRecommendations::default());
    let (shutdown, rx) = watch::channel(false);
    let handle = tokio::spawn(
        RecommendationSyncHandler::new(Arc::clone(&client), &world.bus, rx).run(),
    );
    let mut shared_sub = world
        .bus
        .subscribe(EventFilter::topics(vec![EventTopic::SharedQuests]));

    let ada = world.user("ada", 40);
    let bob = world.user("bob", 40);
    world.friendships.request(ada.id, bob.id);
    assert!(world.friendships.accept(ada.id, bob.id));
    let quest = world.quest("Couch to 5k", 25, 2, 30);

    // Creation: both enrolled, both started, both synced
    let shared = world
        .service
        .create_shared_quest(ada.id, bob.id, quest.id)
        .unwrap();
    assert_eq!(shared.status, SharedQuestStatus::Active);
    for user in [ada.id, bob.id] {
        let view = world.service.progress(user, quest.id).unwrap();
        assert_eq!(view.progress.status(), Some(QuestStatus::Started));
        assert_eq!(view.shared_quest.as_ref().map(|s| s.id), Some(shared.id));
        assert_eq!(world.service.user(user).unwrap().balance, 15);
    }
    let mut requests = client.wait_for(2).await;
    requests.sort_by_key(|r| r.users[0].user_id);
    assert_eq!(
        requests,
        vec![
            AddUsersRequest::single(ada.id, vec![quest.id]),
            AddUsersRequest::single(bob.id, vec![quest.id]),
        ]
    );

    // Ada finishes first and has to wait for Bob
    for task in &quest.tasks {
        world.service.complete_task(ada.id, quest.id, task.id).unwrap();
    }
    assert_eq!(
        world.service.complete_quest(ada.id, quest.id),
        Err(ProgressionError::PartnerIncomplete {
            quest_id: quest.id,
            partner_id: bob.id,
        })
    );
    world.service.complete_task(bob.id, quest.id, quest.tasks[0].id).unwrap();
    world.service.complete_task(bob.id, quest.id, quest.tasks[1].id).unwrap();

    // One call rewards both
    let completion = world.service.complete_quest(ada.id, quest.id).unwrap();
    match completion {
        QuestCompletion::Shared {
            shared_quest_id,
            actor,
            partner,
        } => {
            assert_eq!(shared_quest_id, shared.id);
            assert_eq!(actor.user_id, ada.id);
            assert_eq!(partner.map(|p| p.user_id), Some(bob.id));
        }
        other => panic!("expected shared completion, got {:?}", other),
    }

    for user in [ada.id, bob.id] {
        let after = world.service.user(user).unwrap();
        assert_eq!(after.experience, 60 + 50);
        assert_eq!(after.level, 2);
        assert_eq!(after.balance, 15 + 2 + 5);

        let ledger = world.service.ledger(user).unwrap();
        let kinds: Vec<LedgerKind> = ledger.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LedgerKind::Spent,
                LedgerKind::Earned,
                LedgerKind::Earned,
                LedgerKind::Earned,
            ]
        );
        assert_eq!(
            ledger.last().map(|e| e.description.as_str()),
            Some("Completed quest: Couch to 5k")
        );
        let view = world.service.progress(user, quest.id).unwrap();
        assert_eq!(view.progress.status(), Some(QuestStatus::Completed));
        assert!(view.shared_quest.is_none());
    }

    // Bob's quest is already finalized
    assert_eq!(
        world.service.complete_quest(bob.id, quest.id),
        Err(ProgressionError::NotStarted {
            user_id: bob.id,
            quest_id: quest.id,
        })
    );

    let mut shared_events = Vec::new();
    while let Ok(Some(event)) = shared_sub.try_recv() {
        shared_events.push(event);
    }
    assert_eq!(
        shared_events,
        vec![
            ProgressionEvent::SharedQuestCreated {
                shared_quest_id: shared.id,
                quest_id: quest.id,
                user_a: ada.id,
                user_b: bob.id,
            },
            ProgressionEvent::SharedQuestCompleted {
                shared_quest_id: shared.id,
                quest_id: quest.id,
                user_a: ada.id,
                user_b: bob.id,
            },
        ]
    );

    shutdown.send(true).unwrap();
    handle.await.unwrap();
}

#[test]
fn test_partner_without_funds_enrolls_nobody() {
    let world = World::new();
    let mut sub = world.bus.subscribe(EventFilter::all());
    let ada = world.user("ada", 100);
    let bob = world.user("bob", 10);
    world.friendships.befriend(ada.id, bob.id);
    let quest = world.quest("Couch to 5k", 25, 2, 30);

    assert_eq!(
        world.service.create_shared_quest(ada.id, bob.id, quest.id),
        Err(ProgressionError::InsufficientFunds {
            required: 25,
            available: 10,
        })
    );

    assert_eq!(world.service.user(ada.id).unwrap().balance, 100);
    for user in [ada.id, bob.id] {
        assert!(world.service.progress(user, quest.id).unwrap().progress.is_absent());
        assert!(world.service.ledger(user).unwrap().is_empty());
    }
    assert_eq!(sub.try_recv().unwrap(), None);
}

#[test]
fn test_pending_request_is_not_a_friendship() {
    let world = World::new();
    let ada = world.user("ada", 100);
    let bob = world.user("bob", 100);
    let quest = world.quest("Couch to 5k", 25, 2, 30);
    world.friendships.request(ada.id, bob.id);

    assert_eq!(
        world.service.create_shared_quest(ada.id, bob.id, quest.id),
        Err(ProgressionError::NotFriends {
            user_a: ada.id,
            user_b: bob.id,
        })
    );

    // Once accepted, either side can create the shared quest
    world.friendships.accept(ada.id, bob.id);
    assert!(world
        .service
        .create_shared_quest(bob.id, ada.id, quest.id)
        .is_ok());
}
