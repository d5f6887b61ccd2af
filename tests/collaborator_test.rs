//! Collaborator-contract tests: the AI and calendar services against a
//! mock HTTP provider. Collaborator failures must stay locally recoverable
//! and never reach store state.

use chrono::{NaiveDate, Utc};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fridge_api::config::{AiConfig, CalendarConfig};
use fridge_api::entities::food_item;
use fridge_api::models::{Category, QuantityUnit, StorageLocation};
use fridge_api::services::calendar::{CalendarService, EVENT_MARKER};
use fridge_api::services::recognition::{RecognitionService, UNCERTAIN_CONFIDENCE};

fn ai_config(base_url: String) -> AiConfig {
    AiConfig {
        api_key: Some("test-key".to_string()),
        base_url,
        model: "gpt-4o".to_string(),
        timeout_secs: 5,
    }
}

fn calendar_config(server: &MockServer) -> CalendarConfig {
    CalendarConfig {
        client_id: Some("client".to_string()),
        client_secret: Some("secret".to_string()),
        refresh_token: Some("refresh".to_string()),
        calendar_id: "primary".to_string(),
        base_url: server.uri(),
        token_url: format!("{}/token", server.uri()),
    }
}

fn chat_reply(content: &str) -> serde_json::Value {
    json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    })
}

fn sample_food(id: i32, name: &str, expiry: NaiveDate) -> food_item::Model {
    let now = Utc::now().naive_utc();
    food_item::Model {
        id,
        name: name.to_string(),
        category: Category::Dairy,
        purchase_date: expiry,
        expiry_date: expiry,
        location: StorageLocation::Refrigerated,
        quantity: 1.0,
        unit: QuantityUnit::Count,
        memo: None,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn shelf_life_parses_fenced_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
            "```json\n{\"estimated_days\": 21, \"min_days\": 14, \"max_days\": 30, \
             \"advice\": \"Keep it bagged in the crisper.\"}\n```",
        )))
        .mount(&server)
        .await;

    let service = RecognitionService::new(ai_config(server.uri())).unwrap();
    let estimate = service
        .estimate_shelf_life("apple", Category::Fruit, StorageLocation::Refrigerated)
        .await;

    assert_eq!(estimate.estimated_days, 21);
    assert_eq!(estimate.min_days, 14);
    assert_eq!(estimate.max_days, 30);
    assert_eq!(estimate.advice, "Keep it bagged in the crisper.");
}

#[tokio::test]
async fn shelf_life_falls_back_on_malformed_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_reply("I am sorry, I cannot help with that.")),
        )
        .mount(&server)
        .await;

    let service = RecognitionService::new(ai_config(server.uri())).unwrap();
    let estimate = service
        .estimate_shelf_life("apple", Category::Fruit, StorageLocation::Refrigerated)
        .await;

    assert_eq!(estimate.estimated_days, 7);
    assert_eq!(estimate.min_days, 5);
    assert_eq!(estimate.max_days, 10);
}

#[tokio::test]
async fn shelf_life_falls_back_on_transport_failure() {
    // Nothing listens here; the connection is refused.
    let service =
        RecognitionService::new(ai_config("http://127.0.0.1:1".to_string())).unwrap();
    let estimate = service
        .estimate_shelf_life("apple", Category::Fruit, StorageLocation::Frozen)
        .await;

    assert_eq!(
        (estimate.estimated_days, estimate.min_days, estimate.max_days),
        (7, 5, 10)
    );
}

#[tokio::test]
async fn photo_analysis_defaults_quantity_and_coerces_unknowns() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
            "```json\n{\"name\": \"mystery jar\", \"category\": \"pickled things\", \
             \"estimated_shelf_life_days\": 30, \"location\": \"refrigerated\", \
             \"confidence\": 40, \"detected_date\": \"2024-12-15\"}\n```",
        )))
        .mount(&server)
        .await;

    let service = RecognitionService::new(ai_config(server.uri())).unwrap();
    let analysis = service
        .analyze_food_photo(b"not really a jpeg", "image/jpeg")
        .await
        .expect("analysis");

    assert_eq!(analysis.quantity, 1.0);
    assert_eq!(analysis.category, Category::Other);
    assert_eq!(
        analysis.detected_date,
        NaiveDate::from_ymd_opt(2024, 12, 15)
    );
    assert!(analysis.confidence <= UNCERTAIN_CONFIDENCE);
}

#[tokio::test]
async fn photo_analysis_rejects_reply_missing_required_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
            "```json\n{\"name\": \"apple\"}\n```",
        )))
        .mount(&server)
        .await;

    let service = RecognitionService::new(ai_config(server.uri())).unwrap();
    let err = service
        .analyze_food_photo(b"bytes", "image/png")
        .await
        .expect_err("missing fields must fail");

    assert!(matches!(
        err,
        fridge_api::errors::ServiceError::CollaboratorError(_)
    ));
}

#[tokio::test]
async fn recipes_short_circuit_without_ingredients() {
    let server = MockServer::start().await;

    let service = RecognitionService::new(ai_config(server.uri())).unwrap();
    let text = service.suggest_recipes(&[]).await.expect("recipes");

    assert!(text.contains("no ingredients"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn recipes_pass_ingredients_to_collaborator() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("spinach"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(chat_reply("1. Spinach omelette ...")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let service = RecognitionService::new(ai_config(server.uri())).unwrap();
    let text = service
        .suggest_recipes(&["spinach".to_string(), "eggs".to_string()])
        .await
        .expect("recipes");

    assert!(text.contains("omelette"));
}

#[tokio::test]
async fn calendar_sync_counts_successes_and_failures() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-123",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    // First creation succeeds, the one for "broken" is rejected.
    Mock::given(method("POST"))
        .and(path("/calendars/primary/events"))
        .and(body_string_contains("broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "evt-1",
            "description": "created"
        })))
        .mount(&server)
        .await;

    let service = CalendarService::new(calendar_config(&server)).unwrap();
    let expiry = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    let foods = vec![
        sample_food(1, "milk", expiry),
        sample_food(2, "broken", expiry),
    ];

    let (synced, failed) = service.sync_foods(&foods).await;
    assert_eq!((synced, failed), (1, 1));
}

#[tokio::test]
async fn calendar_event_description_carries_marker() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-123",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/calendars/primary/events"))
        .and(body_string_contains(EVENT_MARKER))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "evt-9",
            "description": "created"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = CalendarService::new(calendar_config(&server)).unwrap();
    let expiry = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    let event_id = service
        .create_expiry_event(&sample_food(7, "milk", expiry))
        .await
        .expect("event");

    assert_eq!(event_id, "evt-9");
}

#[tokio::test]
async fn calendar_bulk_delete_removes_only_marked_events() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-123",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .and(query_param("q", EVENT_MARKER))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": "ours", "description": format!("Expiry reminder\n\n{EVENT_MARKER}") },
                { "id": "theirs", "description": "dentist appointment" },
                { "id": "blank" }
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/calendars/primary/events/ours"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let service = CalendarService::new(calendar_config(&server)).unwrap();
    let deleted = service.delete_expiry_events().await.expect("delete");

    assert_eq!(deleted, 1);
}

#[tokio::test]
async fn calendar_without_credentials_is_a_collaborator_error() {
    let config = CalendarConfig::default();
    let service = CalendarService::new(config).unwrap();

    let err = service.delete_expiry_events().await.expect_err("no creds");
    assert!(matches!(
        err,
        fridge_api::errors::ServiceError::CollaboratorError(_)
    ));
}
