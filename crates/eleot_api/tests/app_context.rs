use eleot_api::{AppConfig, AppContext};
use eleot_core::db::open_db_in_memory;
use mockable::DefaultClock;
use serde_json::json;
use std::sync::Arc;

async fn context() -> AppContext {
    AppContext::from_connection(open_db_in_memory().unwrap(), Arc::new(DefaultClock)).await
}

#[tokio::test]
async fn save_list_and_get_round_trip() {
    let app = context().await;

    let saved = app
        .save_observation("u1", json!({"rubricScore": 8, "notes": "good pacing"}))
        .await;
    assert!(saved.ok, "{}", saved.message);
    let id = saved.observation_id.expect("saved id");

    let listed = app.list_observations("u1").await;
    assert!(listed.ok);
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.items[0].id, id);
    assert_eq!(listed.message, "Found 1 observation(s).");

    let detail = app.get_observation(&id).await;
    assert!(detail.ok);
    let observation = detail.observation.expect("observation exists");
    assert_eq!(observation.user_id, "u1");
    assert_eq!(observation.data["notes"], json!("good pacing"));
    assert!(detail.environment_averages.is_empty());
}

#[tokio::test]
async fn non_object_payloads_are_rejected() {
    let app = context().await;
    let saved = app.save_observation("u1", json!([1, 2, 3])).await;
    assert!(!saved.ok);
    assert!(saved.observation_id.is_none());
    assert!(saved.message.contains("JSON object"));
}

#[tokio::test]
async fn blank_user_is_reported_as_failure() {
    let app = context().await;
    let saved = app.save_observation("  ", json!({})).await;
    assert!(!saved.ok);
    assert!(saved.message.starts_with("save_observation failed"));

    let listed = app.list_observations("").await;
    assert!(!listed.ok);
    assert!(listed.items.is_empty());
}

#[tokio::test]
async fn missing_observation_is_ok_without_record() {
    let app = context().await;
    let detail = app.get_observation("missing").await;
    assert!(detail.ok);
    assert!(detail.observation.is_none());
    assert_eq!(detail.message, "Observation not found.");
}

#[tokio::test]
async fn validated_save_reports_rubric_errors_and_summarizes_scores() {
    let app = context().await;

    let rejected = app
        .save_validated_observation("u1", json!({"scores": {"A9": 3}}))
        .await;
    assert!(!rejected.ok);
    assert!(rejected.message.contains("A9"));

    let saved = app
        .save_validated_observation("u1", json!({"scores": {"C1": 4, "C2": 3}}))
        .await;
    assert!(saved.ok, "{}", saved.message);

    let detail = app
        .get_observation(saved.observation_id.as_deref().unwrap())
        .await;
    let value = serde_json::to_value(&detail).unwrap();
    assert_eq!(value["environmentAverages"], json!({"C": 3.5}));
}

#[tokio::test]
async fn relay_messages_round_trip_and_defaults_are_seeded() {
    let app = context().await;

    let endpoint = app
        .relay_message(&json!({"action": "getApiEndpoint"}))
        .await
        .expect("recognized");
    assert!(endpoint.is_ok());

    let set = app
        .relay_message(&json!({"action": "setApiKey", "apiKey": "sk-test"}))
        .await
        .expect("recognized");
    assert_eq!(serde_json::to_value(&set).unwrap(), json!({"success": true}));

    let get = app
        .relay_message(&json!({"action": "getApiKey"}))
        .await
        .expect("recognized");
    assert_eq!(serde_json::to_value(&get).unwrap(), json!({"apiKey": "sk-test"}));

    assert!(app
        .relay_message(&json!({"action": "unknownThing"}))
        .await
        .is_none());
}

#[tokio::test]
async fn bootstrap_opens_configured_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        db_path: dir.path().join("eleot.sqlite3"),
        ..AppConfig::default()
    };

    let id = {
        let app = AppContext::bootstrap(&config).await.unwrap();
        app.save_observation("u1", json!({"notes": "persisted"}))
            .await
            .observation_id
            .expect("saved id")
    };

    let reopened = AppContext::bootstrap(&config).await.unwrap();
    let detail = reopened.get_observation(&id).await;
    assert!(detail.observation.is_some());
}

#[tokio::test]
async fn bootstrap_rejects_relative_log_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        db_path: dir.path().join("eleot.sqlite3"),
        log_level: "info".to_string(),
        log_dir: Some("relative/logs".to_string()),
    };
    assert!(AppContext::bootstrap(&config).await.is_err());
}
