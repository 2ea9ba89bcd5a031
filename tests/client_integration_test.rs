//! Wiremock integration tests for PredictionClient.
//!
//! These tests verify the request shapes sent to each endpoint and how
//! responses (including flagged and non-2xx ones) map to results.

use std::time::Duration;

use nutriscope::{
    AuthMode, GlucoseRequest, MealCategory, MealRecord, NutriscopeError, NutritionGoal,
    PredictionClient, PredictionService, RecommendationRequest, SessionStore, UploadFile,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn meal_image() -> UploadFile {
    UploadFile::new("meal.jpg", "image/jpeg", b"fake-jpeg-bytes".to_vec())
}

fn csv(name: &str) -> UploadFile {
    UploadFile::new(name, "text/csv", b"taxon,abundance\nBacteroides,0.31\n".to_vec())
}

fn signed_in_session(token: &str) -> SessionStore {
    let session = SessionStore::in_memory(AuthMode::Demo);
    session.login("ada@example.com", "secret").unwrap();
    session.attach_token(token).unwrap();
    session
}

// ============================================================================
// Request shapes
// ============================================================================

#[tokio::test]
async fn analyze_meal_sends_none_when_description_missing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/analyze-meal"))
        .and(body_string_contains(r#"name="image"; filename="meal.jpg""#))
        .and(body_string_contains("name=\"description\"\r\n\r\nnone\r\n"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nutrition": {"nutrition": {"carbs_pct": 40, "protein_pct": 30, "fat_pct": 30}}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = PredictionClient::with_base_url(mock_server.uri()).unwrap();
    let raw = client
        .analyze_meal(&meal_image(), None, &CancellationToken::new())
        .await
        .expect("analyze_meal should succeed");

    assert_eq!(raw["nutrition"]["nutrition"]["carbs_pct"], 40);
}

#[tokio::test]
async fn analyze_meal_sends_given_description() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/analyze-meal"))
        .and(body_string_contains("name=\"description\"\r\n\r\nrice bowl\r\n"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"nutrition": {}})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = PredictionClient::with_base_url(mock_server.uri()).unwrap();
    client
        .analyze_meal(&meal_image(), Some("rice bowl"), &CancellationToken::new())
        .await
        .expect("analyze_meal should succeed");
}

#[tokio::test]
async fn predict_glucose_sends_all_parts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict-glucose-from-all"))
        .and(body_string_contains(r#"name="image"; filename="meal.jpg""#))
        .and(body_string_contains(r#"name="bio_file"; filename="bio.csv""#))
        .and(body_string_contains(r#"name="micro_file"; filename="micro.csv""#))
        .and(body_string_contains("name=\"meal_category\"\r\n\r\ndinner\r\n"))
        .and(body_string_contains("name=\"description\"\r\n\r\nnone\r\n"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "caption": "A dish containing rice",
            "nutrition": {"carbs_pct": 55},
            "glucose_prediction": {"spike_30min": 32.5}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = PredictionClient::with_base_url(mock_server.uri()).unwrap();
    let image = meal_image();
    let bio = csv("bio.csv");
    let micro = csv("micro.csv");
    let request = GlucoseRequest {
        image: &image,
        biomarkers: &bio,
        microbiome: &micro,
        meal_category: MealCategory::Dinner,
        description: Some("   "),
    };
    let raw = client
        .predict_glucose(&request, &CancellationToken::new())
        .await
        .expect("predict_glucose should succeed");

    assert_eq!(raw["glucose_prediction"]["spike_30min"], 32.5);
}

#[tokio::test]
async fn predict_gut_health_sends_file_field() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict-gut-health"))
        .and(body_string_contains(r#"name="file"; filename="subject.csv""#))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"prediction": "Good", "probability_good": 0.82})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = PredictionClient::with_base_url(mock_server.uri()).unwrap();
    let raw = client
        .predict_gut_health(&csv("subject.csv"), &CancellationToken::new())
        .await
        .expect("predict_gut_health should succeed");

    assert_eq!(raw["prediction"], "Good");
}

#[tokio::test]
async fn recommend_meal_posts_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/recommend-meal"))
        .and(body_json(json!({
            "user_id": "default-user",
            "meal_type": "breakfast",
            "nutrition_goal": "cutting",
            "caption": "oatmeal with berries"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"recommendations": ["eggs"]})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = PredictionClient::with_base_url(mock_server.uri()).unwrap();
    let request = RecommendationRequest::new(
        "oatmeal with berries",
        MealCategory::Breakfast,
        NutritionGoal::Cutting,
    );
    let raw = client
        .recommend_meal(&request, &CancellationToken::new())
        .await
        .expect("recommend_meal should succeed");

    assert_eq!(raw["recommendations"][0], "eggs");
}

#[tokio::test]
async fn save_meal_posts_record() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/meals/save"))
        .and(body_json(json!({
            "caption": "rice bowl",
            "meal_category": "dinner",
            "nutrition": {"carbs_pct": 55.0}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "m-1"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = PredictionClient::with_base_url(mock_server.uri()).unwrap();
    let mut record = MealRecord {
        caption: "rice bowl".to_string(),
        meal_category: MealCategory::Dinner,
        ..MealRecord::default()
    };
    record.nutrition.carbs_pct = Some(55.0);

    let raw = client
        .save_meal(&record, &CancellationToken::new())
        .await
        .expect("save_meal should succeed");
    assert_eq!(raw["id"], "m-1");
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn bearer_token_attached_from_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict-gut-health"))
        .and(header("Authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"prediction": "Good"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = PredictionClient::builder()
        .base_url(mock_server.uri())
        .session(signed_in_session("tok-123"))
        .build()
        .unwrap();

    client
        .predict_gut_health(&csv("subject.csv"), &CancellationToken::new())
        .await
        .expect("authorized request should succeed");
}

#[tokio::test]
async fn no_authorization_header_without_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict-gut-health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"prediction": "Good"})))
        .mount(&mock_server)
        .await;

    let client = PredictionClient::with_base_url(mock_server.uri()).unwrap();
    client
        .predict_gut_health(&csv("subject.csv"), &CancellationToken::new())
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn unauthorized_response_signs_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/analyze-meal"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expired"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = signed_in_session("stale");
    let client = PredictionClient::builder()
        .base_url(mock_server.uri())
        .session(session.clone())
        .build()
        .unwrap();

    let err = client
        .analyze_meal(&meal_image(), None, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, NutriscopeError::SessionExpired));
    assert!(!session.is_authenticated());
    assert_eq!(session.token(), None);
}

// ============================================================================
// Error mapping
// ============================================================================

#[tokio::test]
async fn server_error_message_surfaced_verbatim() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict-gut-health"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "Invalid CSV format"})),
        )
        .mount(&mock_server)
        .await;

    let client = PredictionClient::with_base_url(mock_server.uri()).unwrap();
    let err = client
        .predict_gut_health(&csv("subject.csv"), &CancellationToken::new())
        .await
        .unwrap_err();

    match &err {
        NutriscopeError::Api { status, message } => {
            assert_eq!(*status, 400);
            assert_eq!(message, "Invalid CSV format");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert_eq!(err.user_message("Failed to analyze microbiome data"), "Invalid CSV format");
}

#[tokio::test]
async fn server_error_without_message_uses_fallback() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict-gut-health"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&mock_server)
        .await;

    let client = PredictionClient::with_base_url(mock_server.uri()).unwrap();
    let err = client
        .predict_gut_health(&csv("subject.csv"), &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        NutriscopeError::Api { status, message } => {
            assert_eq!(status, 502);
            assert_eq!(message, "Failed to analyze microbiome data");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn flagged_success_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/analyze-meal"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "Image not clear enough",
            "message": "No ingredients detected"
        })))
        .mount(&mock_server)
        .await;

    let client = PredictionClient::with_base_url(mock_server.uri()).unwrap();
    let err = client
        .analyze_meal(&meal_image(), None, &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        NutriscopeError::ServerReported { message } => {
            assert_eq!(message, "Image not clear enough");
        }
        other => panic!("expected ServerReported, got {other:?}"),
    }
}

#[tokio::test]
async fn false_error_field_is_not_a_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/analyze-meal"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": false,
            "nutrition": {"nutrition": {"carbs_pct": 40, "protein_pct": 30, "fat_pct": 30}}
        })))
        .mount(&mock_server)
        .await;

    let client = PredictionClient::with_base_url(mock_server.uri()).unwrap();
    let raw = client
        .analyze_meal(&meal_image(), None, &CancellationToken::new())
        .await
        .expect("a false error flag should not fail the request");

    assert_eq!(raw["nutrition"]["nutrition"]["carbs_pct"], 40);
}

#[tokio::test]
async fn server_error_message_keeps_whitespace() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict-gut-health"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"detail": " CSV has no taxa columns "})),
        )
        .mount(&mock_server)
        .await;

    let client = PredictionClient::with_base_url(mock_server.uri()).unwrap();
    let err = client
        .predict_gut_health(&csv("subject.csv"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(
        err.user_message("Failed to analyze microbiome data"),
        " CSV has no taxa columns "
    );
}

#[tokio::test]
async fn non_json_success_is_schema_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/analyze-meal"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    let client = PredictionClient::with_base_url(mock_server.uri()).unwrap();
    let err = client
        .analyze_meal(&meal_image(), None, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, NutriscopeError::Schema(_)));
}

#[tokio::test]
async fn slow_response_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/analyze-meal"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let client = PredictionClient::builder()
        .base_url(mock_server.uri())
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let err = client
        .analyze_meal(&meal_image(), None, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, NutriscopeError::Timeout), "got {err:?}");
}

#[tokio::test]
async fn cancelled_request_returns_cancelled() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict-gut-health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"prediction": "Good"}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let client = PredictionClient::with_base_url(mock_server.uri()).unwrap();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = client
        .predict_gut_health(&csv("subject.csv"), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, NutriscopeError::Cancelled));
}

#[tokio::test]
async fn unreachable_service_is_transport_error() {
    // Nothing listens on port 9 (discard) in the test environment.
    let client = PredictionClient::builder()
        .base_url("http://127.0.0.1:9")
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    let err = client
        .predict_gut_health(&csv("subject.csv"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), nutriscope::ErrorKind::Transport);
    assert_eq!(
        err.user_message("Failed to analyze microbiome data"),
        "Failed to analyze microbiome data"
    );
}
