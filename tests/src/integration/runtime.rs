//! # Runtime Flows
//!
//! The assembled runtime: configuration, catalog seeding, the HTTP
//! recommendation client and (with the `rocksdb` feature) durable storage.

use ql_01_progression::ProgressionApi;
use quest_runtime::{QuestRuntime, RuntimeConfig};
use shared_types::entities::{QuestId, UserId};

use super::fixtures::MockHttpServer;

const CATALOG: &str = r#"
    [[quests]]
    title = "Morning routine"
    price = 10
    reward_xp = 50
    reward_coin = 5
    time_limit_hours = 24
    is_sequential = true

    [[quests.tasks]]
    order = 1
    title = "Drink water"
    base_xp_reward = 10
    base_coin_reward = 1

    [[quests.tasks]]
    order = 2
    title = "Stretch"
    base_xp_reward = 10
    base_coin_reward = 1

    [[users]]
    username = "ada"
    balance = 100

    [[users]]
    username = "bob"
    balance = 100

    [[friendships]]
    user_a = 1
    user_b = 2
"#;

fn config_with_catalog(dir: &tempfile::TempDir) -> RuntimeConfig {
    let path = dir.path().join("catalog.toml");
    std::fs::write(&path, CATALOG).unwrap();
    let mut config = RuntimeConfig::default();
    config.seed.catalog = Some(path);
    config
}

#[tokio::test]
async fn test_runtime_posts_purchases_to_recommendation_service() {
    let server = MockHttpServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_with_catalog(&dir);
    config.recommendation.base_url = server.base_url.clone();

    let runtime = QuestRuntime::new(config).unwrap();
    runtime.start().await.unwrap();
    let api = runtime.container().progression.clone();

    api.create_shared_quest(UserId(1), UserId(2), QuestId(1))
        .unwrap();

    let mut bodies = server.wait_for(2).await;
    bodies.sort();
    assert_eq!(
        bodies,
        vec![
            r#"{"users":[{"user_id":1,"quest_ids":[1]}]}"#.to_string(),
            r#"{"users":[{"user_id":2,"quest_ids":[1]}]}"#.to_string(),
        ]
    );

    runtime.shutdown().await;
}

#[tokio::test]
async fn test_sequential_rule_follows_configuration() {
    let dir = tempfile::tempdir().unwrap();

    let mut strict = config_with_catalog(&dir);
    strict.recommendation.enabled = false;
    let runtime = QuestRuntime::new(strict).unwrap();
    runtime.start().await.unwrap();
    let api = runtime.container().progression.clone();
    api.purchase(UserId(1), QuestId(1)).unwrap();
    let second = api.quest(QuestId(1)).unwrap().tasks[1].id;
    assert!(api.complete_task(UserId(1), QuestId(1), second).is_err());
    runtime.shutdown().await;

    let mut relaxed = config_with_catalog(&dir);
    relaxed.recommendation.enabled = false;
    relaxed.progression.enforce_sequential = false;
    let runtime = QuestRuntime::new(relaxed).unwrap();
    runtime.start().await.unwrap();
    let api = runtime.container().progression.clone();
    api.purchase(UserId(1), QuestId(1)).unwrap();
    assert!(api.complete_task(UserId(1), QuestId(1), second).is_ok());
    runtime.shutdown().await;
}

#[cfg(feature = "rocksdb")]
#[tokio::test]
async fn test_rocksdb_state_survives_restart() {
    use quest_runtime::container::config::StorageBackend;
    use super::fixtures::quest_form;
    use ql_01_progression::QuestStatus;

    let dir = tempfile::tempdir().unwrap();
    let config = || {
        let mut config = config_with_catalog(&dir);
        config.recommendation.enabled = false;
        config.storage.backend = StorageBackend::Rocksdb;
        config.storage.data_dir = dir.path().join("db");
        config.storage.sync_writes = false;
        config
    };

    {
        let runtime = QuestRuntime::new(config()).unwrap();
        runtime.start().await.unwrap();
        let api = runtime.container().progression.clone();
        let quest = api.quest(QuestId(1)).unwrap();
        api.purchase(UserId(1), quest.id).unwrap();
        api.complete_task(UserId(1), quest.id, quest.tasks[0].id)
            .unwrap();
        runtime.shutdown().await;
    }

    let runtime = QuestRuntime::new(config()).unwrap();
    runtime.start().await.unwrap();
    let api = runtime.container().progression.clone();

    // Seeding was skipped: still two users, balances carried over
    assert!(api.user(UserId(3)).is_err());
    let ada = api.user(UserId(1)).unwrap();
    assert_eq!(ada.balance, 100 - 10 + 1);
    assert_eq!(ada.experience, 10);
    assert_eq!(api.ledger(UserId(1)).unwrap().len(), 2);

    let view = api.progress(UserId(1), QuestId(1)).unwrap();
    assert_eq!(view.progress.status(), Some(QuestStatus::Started));
    assert_eq!(view.tasks.iter().filter(|t| t.is_completed()).count(), 1);

    // Friendships are reloaded from the catalog on every start
    let walk = api
        .register_quest(quest_form("Evening walk", 10, 1, 10, false))
        .unwrap();
    assert!(api
        .create_shared_quest(UserId(1), UserId(2), walk.id)
        .is_ok());
    runtime.shutdown().await;
}
