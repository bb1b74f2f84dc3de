//! End-to-end tests: registry + session + JSON file store on a temp directory.

use std::sync::Arc;
use std::time::Duration;

use danci_drill::{
    CardKind, Curriculum, FixedRandom, JsonFileStore, ProgressStore, ProgressiveScheduler,
    SchedulerConfig, SchedulerFactory, SessionRegistry, StoreError,
};

fn letters() -> Curriculum {
    Curriculum::new(["A", "B", "C", "D", "E"]).unwrap()
}

/// Registry whose schedulers never take the review branch.
fn registry(store: Arc<JsonFileStore>, debounce: Duration) -> SessionRegistry {
    let factory: SchedulerFactory = Arc::new(|_identity: &str| {
        ProgressiveScheduler::builder(letters())
            .config(SchedulerConfig::default())
            .random(FixedRandom::NEVER)
    });
    SessionRegistry::with_factory(store, factory, debounce)
}

#[tokio::test]
async fn test_progress_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path()));

    let before = {
        let registry = registry(store.clone(), Duration::from_secs(60));
        let session = registry.session("learner").await.unwrap();
        for _ in 0..12 {
            let card = session.next_card().unwrap();
            session.mark_correct(&card.item);
        }
        registry.flush_all().await.unwrap();
        session.snapshot()
    };
    assert!(!before.mastered_cards.is_empty());

    let registry = registry(store, Duration::from_secs(60));
    let session = registry.session("learner").await.unwrap();
    let after = session.snapshot();

    assert_eq!(after.learning_cards, before.learning_cards);
    assert_eq!(after.mastered_cards, before.mastered_cards);
    assert_eq!(after.card_id_counter, before.card_id_counter);
    assert_eq!(session.stats().total_correct, 12);
}

#[tokio::test]
async fn test_debounced_save_reaches_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path()));
    let registry = registry(store.clone(), Duration::from_millis(10));

    let session = registry.session("learner").await.unwrap();
    session.mark_correct("A");
    session.mark_correct("A");

    let mut saved = None;
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        if let Some(snapshot) = store.load("learner").await.unwrap() {
            saved = Some(snapshot);
            break;
        }
    }

    let saved = saved.expect("debounced save never landed");
    assert_eq!(saved.learning_cards.len(), 1);
    assert_eq!(saved.learning_cards[0].correct_streak, 2);
    assert_eq!(saved.stats.map(|s| s.total_correct), Some(2));
}

#[tokio::test]
async fn test_identities_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path()));
    let registry = registry(store.clone(), Duration::from_secs(60));

    let first = registry.switch_to("first").await.unwrap();
    first.mark_correct("A");
    first.mark_incorrect("A");
    first.flush().await.unwrap();

    let second = registry.switch_to("second").await.unwrap();
    assert!(first.is_discarded());
    assert_eq!(second.stats().total_correct, 0);
    assert_eq!(second.stats().total_incorrect, 0);

    let first_again = registry.switch_to("first").await.unwrap();
    assert!(!Arc::ptr_eq(&first, &first_again));
    assert_eq!(first_again.stats().total_correct, 1);
    assert_eq!(first_again.stats().total_incorrect, 1);
    assert!(!store.exists("second").await.unwrap());
}

#[tokio::test]
async fn test_reset_removes_stored_progress() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path()));
    let registry = registry(store.clone(), Duration::from_secs(60));

    let session = registry.session("learner").await.unwrap();
    session.mark_correct("A");
    session.flush().await.unwrap();
    let path = store.path_for("learner").unwrap();
    assert!(path.exists());

    session.reset().await.unwrap();

    assert!(!path.exists());
    assert!(!store.exists("learner").await.unwrap());
    let progress = session.progress();
    assert_eq!(progress.learning, 1);
    assert_eq!(progress.mastered, 0);
    let card = session.next_card().unwrap();
    assert_eq!(card.item, "A");
    assert_eq!(card.kind, CardKind::New);
}

#[tokio::test]
async fn test_legacy_document_restores() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path()));
    let legacy = r#"{
        "learningCards": [
            {"noteValue": "B", "correctStreak": 1, "totalCorrect": 2, "totalIncorrect": 1, "lastSeen": 5}
        ],
        "masteredCards": [
            {"noteValue": "A", "correctStreak": 4, "totalCorrect": 4, "totalIncorrect": 0,
             "lastSeen": 3, "masteredAt": 3, "reviewCount": 1},
            {"noteValue": "Z", "correctStreak": 3, "totalCorrect": 3}
        ],
        "cardIdCounter": 9
    }"#;
    std::fs::write(store.path_for("learner").unwrap(), legacy).unwrap();

    let registry = registry(store, Duration::from_secs(60));
    let session = registry.session("learner").await.unwrap();
    let stats = session.stats();

    assert_eq!(stats.progress.learning, 1);
    assert_eq!(stats.progress.mastered, 1);
    assert_eq!(stats.total_correct, 6);
    assert_eq!(stats.total_incorrect, 1);
    assert_eq!(session.next_card().unwrap().id, "card_9");
}

#[tokio::test]
async fn test_unreadable_document_is_not_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path()));
    let path = store.path_for("learner").unwrap();
    std::fs::write(&path, "{not json").unwrap();

    let registry = registry(store, Duration::from_millis(10));
    let result = registry.session("learner").await;

    assert!(matches!(result, Err(StoreError::Serialization(_))));
    assert!(registry.identities().await.is_empty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{not json");
}
