mod support;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use support::*;
use uuid::Uuid;

#[tokio::test]
async fn health_reports_backend() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    let (status, body) = app.get_json("/health").await?;
    assert_status(status, StatusCode::OK, "health");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "memory");
    Ok(())
}

#[tokio::test]
async fn responses_carry_request_and_security_headers() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    let (status, headers, _body) = app
        .request_with_extra_headers(
            Method::GET,
            "/api/users",
            None,
            &[("x-request-id", "client-123")],
        )
        .await?;
    assert_status(status, StatusCode::OK, "list users");
    assert!(headers.contains_key("x-request-id"));
    assert_eq!(
        headers.get("x-correlation-id").and_then(|v| v.to_str().ok()),
        Some("client-123")
    );
    assert_eq!(
        headers
            .get("x-content-type-options")
            .and_then(|v| v.to_str().ok()),
        Some("nosniff")
    );
    Ok(())
}

#[tokio::test]
async fn unknown_collection_and_route_are_not_found() -> anyhow::Result<()> {
    let app = TestApp::new()?;

    let (status, body) = app.get_json("/api/sessions").await?;
    assert_status(status, StatusCode::NOT_FOUND, "unknown collection");
    assert_error_code(&body, "NOT_FOUND")?;

    let (status, body) = app.get_json("/nowhere").await?;
    assert_status(status, StatusCode::NOT_FOUND, "unknown route");
    assert_error_code(&body, "NOT_FOUND")?;
    Ok(())
}

#[tokio::test]
async fn create_user_assigns_id_and_defaults() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    let created = app
        .create("users", &user("Ada Lovelace", "Ada@Example.com"))
        .await?;

    assert!(Uuid::parse_str(created["id"].as_str().unwrap_or_default()).is_ok());
    assert_eq!(created["email"], "ada@example.com");
    assert_eq!(created["role"], "user");
    assert!(created["createdAt"].as_str().is_some_and(|s| s.ends_with('Z')));

    let (status, body) = app
        .get_json(&format!("/api/users/{}", created["id"].as_str().unwrap_or_default()))
        .await?;
    assert_status(status, StatusCode::OK, "read user");
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], created);
    Ok(())
}

#[tokio::test]
async fn duplicate_email_is_a_conflict_naming_the_field() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    app.create("users", &user("Ada", "ada@example.com")).await?;

    let (status, body) = app
        .post_json("/api/users", &user("Imposter", "ADA@example.com"))
        .await?;
    assert_status(status, StatusCode::CONFLICT, "duplicate email");
    let error = assert_error_code(&body, "DUPLICATE_KEY")?;
    assert_eq!(error["field"], "email");
    Ok(())
}

#[tokio::test]
async fn invalid_payloads_are_validation_errors() -> anyhow::Result<()> {
    let app = TestApp::new()?;

    let (status, body) = app
        .post_json("/api/users", &json!({"name": "", "email": "not-an-email"}))
        .await?;
    assert_status(status, StatusCode::BAD_REQUEST, "invalid user");
    let error = assert_error_code(&body, "VALIDATION_ERROR")?;
    let message = error["message"].as_str().unwrap_or_default();
    assert!(message.contains("name must be 1-50 characters"), "{message}");
    assert!(message.contains("email must be a valid address"), "{message}");

    let (status, _headers, bytes) = app
        .request(Method::POST, "/api/users", Some("{not json".into()))
        .await?;
    assert_status(status, StatusCode::BAD_REQUEST, "malformed JSON");
    let body: Value = serde_json::from_slice(&bytes)?;
    assert_error_code(&body, "VALIDATION_ERROR")?;

    let (status, body) = app.post_json("/api/users", &json!([1, 2, 3])).await?;
    assert_status(status, StatusCode::BAD_REQUEST, "array body");
    assert_error_code(&body, "VALIDATION_ERROR")?;
    Ok(())
}

#[tokio::test]
async fn references_must_point_at_existing_documents() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    let ghost = Uuid::new_v4().to_string();
    let (status, body) = app
        .post_json("/api/workouts", &WorkoutBuilder::new(&ghost, "cardio").build())
        .await?;
    assert_status(status, StatusCode::BAD_REQUEST, "dangling user reference");
    assert_error_code(&body, "VALIDATION_ERROR")?;
    Ok(())
}

#[tokio::test]
async fn read_errors_distinguish_bad_and_missing_ids() -> anyhow::Result<()> {
    let app = TestApp::new()?;

    let (status, body) = app.get_json("/api/workouts/12345").await?;
    assert_status(status, StatusCode::BAD_REQUEST, "malformed id");
    assert_error_code(&body, "INVALID_ID")?;

    let (status, body) = app
        .get_json(&format!("/api/workouts/{}", Uuid::new_v4()))
        .await?;
    assert_status(status, StatusCode::NOT_FOUND, "missing id");
    let error = assert_error_code(&body, "NOT_FOUND")?;
    assert!(error.get("field").is_none());
    Ok(())
}

#[tokio::test]
async fn goals_derive_progress_and_populate_user() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    let user_id = app.create_id("users", &user("Grace", "grace@example.com")).await?;

    let goal = app
        .create(
            "goals",
            &json!({
                "user": user_id,
                "title": "Deadlift 200kg",
                "category": "strength",
                "targetValue": 200,
                "currentValue": 150,
                "unit": "kg",
            }),
        )
        .await?;
    assert_eq!(goal["progress"], json!(75.0));
    assert_eq!(goal["status"], "in-progress");
    assert_eq!(goal["user"], user_id.as_str());

    let (status, body) = app
        .get_json(&format!("/api/goals/{}", goal["id"].as_str().unwrap_or_default()))
        .await?;
    assert_status(status, StatusCode::OK, "read goal");
    assert_eq!(body["data"]["user"]["name"], "Grace");
    Ok(())
}

#[tokio::test]
async fn workouts_default_calories_from_duration() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    let user_id = app.create_id("users", &user("Lin", "lin@example.com")).await?;

    let workout = app
        .create(
            "workouts",
            &WorkoutBuilder::new(&user_id, "hiit").duration(20).build(),
        )
        .await?;
    // 8.0 MET * 3.5 * 70 / 200 = 9.8 kcal/min
    assert_eq!(workout["caloriesBurned"], 196);

    let explicit = app
        .create(
            "workouts",
            &json!({
                "user": user_id,
                "name": "Yoga",
                "type": "flexibility",
                "date": "2024-05-02",
                "durationMinutes": 60,
                "caloriesBurned": 150,
            }),
        )
        .await?;
    assert_eq!(explicit["caloriesBurned"], 150);
    Ok(())
}
