use research_store::types::{
    Hypothesis, HypothesisCategory, HypothesisConfidence, HypothesisId, HypothesisState,
};
use research_store::{
    HypothesisStorage, IndexFailurePolicy, IndexFilter, StorageConfig, StoreError,
};

fn hypothesis(id: &str, statement: &str) -> Hypothesis {
    Hypothesis::new(
        HypothesisId::parse(id).expect("test id should parse"),
        statement,
        HypothesisCategory::Mechanistic,
        HypothesisConfidence::High,
    )
}

fn storage(dir: &tempfile::TempDir, auto_rebuild: bool) -> HypothesisStorage {
    HypothesisStorage::new(StorageConfig::new(dir.path()).with_auto_rebuild_index(auto_rebuild))
}

#[tokio::test]
async fn two_hypothesis_session_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let storage = storage(&dir, false);

    storage
        .save_hypothesis(hypothesis("H-TEST-001", "Ligand binding is cooperative"))
        .await
        .expect("first save");
    storage
        .save_hypothesis(hypothesis("H-TEST-002", "Binding is independent"))
        .await
        .expect("second save");

    let loaded = storage.load_session_hypotheses("TEST").await.unwrap();
    let ids: Vec<&str> = loaded.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["H-TEST-001", "H-TEST-002"]);

    let index = storage.rebuild_index().await.unwrap();
    assert_eq!(index.entries.len(), 2);

    assert!(storage.delete_hypothesis("H-TEST-001").await.unwrap());
    assert!(storage.get_hypothesis_by_id("H-TEST-001").await.unwrap().is_none());

    let loaded = storage.load_session_hypotheses("TEST").await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id.as_str(), "H-TEST-002");

    assert!(!storage.delete_hypothesis("H-TEST-001").await.unwrap());
}

#[tokio::test]
async fn nonexistent_session_loads_empty_without_creating_files() {
    let dir = tempfile::tempdir().unwrap();
    let storage = storage(&dir, true);

    assert!(storage.load_session_hypotheses("NONEXISTENT").await.unwrap().is_empty());
    assert!(storage.load_session_file("NONEXISTENT").await.unwrap().is_none());
    assert!(!storage
        .layout()
        .session_file(&"NONEXISTENT".parse().unwrap())
        .exists());
    assert!(storage.list_sessions().await.unwrap().is_empty());
}

#[tokio::test]
async fn index_file_presence_follows_auto_rebuild() {
    let on = tempfile::tempdir().unwrap();
    let storage_on = storage(&on, true);
    storage_on
        .save_hypothesis(hypothesis("H-AUTO-001", "x"))
        .await
        .unwrap();
    assert!(storage_on.layout().index_file().exists());

    let off = tempfile::tempdir().unwrap();
    let storage_off = storage(&off, false);
    storage_off
        .save_hypothesis(hypothesis("H-AUTO-001", "x"))
        .await
        .unwrap();
    assert!(!storage_off.layout().index_file().exists());
}

#[tokio::test]
async fn auto_rebuilt_index_tracks_every_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let storage = storage(&dir, true);

    for (n, session) in ["A", "A", "B", "C"].iter().enumerate() {
        storage
            .save_hypothesis(hypothesis(&format!("H-{session}-{:03}", n + 1), "x"))
            .await
            .unwrap();
    }
    assert_eq!(storage.load_index().await.unwrap().len(), 4);

    storage.delete_hypothesis("H-B-003").await.unwrap();
    let index = storage.load_index().await.unwrap();
    assert_eq!(index.len(), 3);
    assert_eq!(index.len(), storage.get_all_hypotheses().await.unwrap().len());
}

#[tokio::test]
async fn session_timestamps_through_the_gateway() {
    let dir = tempfile::tempdir().unwrap();
    let storage = storage(&dir, false);

    storage.save_hypothesis(hypothesis("H-T-001", "a")).await.unwrap();
    let first = storage.load_session_file("T").await.unwrap().unwrap();

    storage.save_hypothesis(hypothesis("H-T-002", "b")).await.unwrap();
    storage
        .save_hypothesis(hypothesis("H-T-001", "a, edited").with_state(HypothesisState::Active))
        .await
        .unwrap();
    let last = storage.load_session_file("T").await.unwrap().unwrap();

    assert_eq!(last.created_at, first.created_at);
    assert!(last.updated_at > first.updated_at);
    assert_eq!(last.hypotheses[0].created_at, first.hypotheses[0].created_at);
    assert_eq!(last.hypotheses[0].statement, "a, edited");
}

#[tokio::test]
async fn corrupt_session_surfaces_everywhere_it_is_read() {
    let dir = tempfile::tempdir().unwrap();
    let storage = HypothesisStorage::new(
        StorageConfig::new(dir.path()).with_auto_rebuild_index(false),
    );
    storage.save_hypothesis(hypothesis("H-GOOD-001", "fine")).await.unwrap();

    let bad = storage.layout().session_file(&"BAD".parse().unwrap());
    tokio::fs::write(&bad, b"{\"sessionId\":").await.unwrap();

    assert!(matches!(
        storage.load_session_hypotheses("BAD").await,
        Err(StoreError::Decode { .. })
    ));
    assert!(storage.get_hypothesis_by_id("H-BAD-001").await.is_err());
    assert!(storage.get_all_hypotheses().await.is_err());
    assert!(storage.search_hypotheses("fine").await.is_err());
    assert!(storage.rebuild_index().await.is_err());
    assert!(storage.save_hypothesis(hypothesis("H-BAD-002", "x")).await.is_err());

    // Lookups routed to healthy sessions are unaffected.
    assert!(storage.get_hypothesis_by_id("H-GOOD-001").await.unwrap().is_some());
}

#[tokio::test]
async fn skip_policy_indexes_around_corruption() {
    let dir = tempfile::tempdir().unwrap();
    let storage = HypothesisStorage::new(
        StorageConfig::new(dir.path())
            .with_auto_rebuild_index(false)
            .with_index_failure_policy(IndexFailurePolicy::SkipCorrupt),
    );
    storage
        .save_hypothesis(hypothesis("H-GOOD-001", "fine").with_state(HypothesisState::Active))
        .await
        .unwrap();
    let bad = storage.layout().session_file(&"BAD".parse().unwrap());
    tokio::fs::write(&bad, b"garbage").await.unwrap();

    let index = storage.rebuild_index().await.unwrap();
    assert_eq!(index.len(), 1);

    let active = storage.get_active_hypotheses().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id.as_str(), "H-GOOD-001");
}

#[tokio::test]
async fn search_and_filter_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let storage = storage(&dir, true);

    storage
        .save_hypothesis(
            hypothesis("H-ONE-001", "Serotonin modulates feeding")
                .with_tags(["neuro"])
                .with_state(HypothesisState::Active),
        )
        .await
        .unwrap();
    storage
        .save_hypothesis(
            hypothesis("H-TWO-001", "Feeding is circadian")
                .with_mechanism("Clock genes gate NEURO activity"),
        )
        .await
        .unwrap();

    assert!(storage.search_hypotheses("").await.unwrap().is_empty());
    assert!(storage.search_hypotheses("   ").await.unwrap().is_empty());
    assert_eq!(storage.search_hypotheses("FEEDING").await.unwrap().len(), 2);
    assert_eq!(storage.search_hypotheses("neuro").await.unwrap().len(), 2);
    assert_eq!(storage.search_hypotheses("two-0").await.unwrap().len(), 1);

    let with_mechanism = storage
        .filter_index(&IndexFilter::new().has_mechanism(true))
        .await
        .unwrap();
    assert_eq!(with_mechanism.len(), 1);
    assert_eq!(with_mechanism[0].id.as_str(), "H-TWO-001");

    let summary = storage.index_summary().await.unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.by_session.len(), 2);
}
