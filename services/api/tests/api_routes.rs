//! services/api/tests/api_routes.rs
//!
//! Drives the HTTP router against file storage in a temp directory.

use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use meal_planner_api::{
    config::Config,
    web::{build_router, state::AppState},
};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

//=========================================================================================
// Helpers
//=========================================================================================

fn app_with(config: Config) -> Router {
    let state = Arc::new(AppState::initialize(Arc::new(config)).expect("initialize state"));
    build_router(state).expect("build router")
}

fn app(dir: &Path) -> Router {
    app_with(Config::for_tests(dir.to_path_buf()))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

fn profile_json() -> Value {
    json!({
        "age": 58,
        "height": 165.0,
        "weight": 70.0,
        "gender": "Female",
        "diabetesType": "Type2",
        "fastingGlucose": "6.4",
        "stapleFood": ["rice"],
        "allergies": [],
        "mealsPerDay": 3,
        "specialRequests": ""
    })
}

fn recipe_json(id: &str, name: &str, time: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "mealType": "Lunch",
        "time": time,
        "description": "",
        "ingredients": [{"name": "tofu", "amount": "100g"}],
        "steps": ["steam"],
        "nutrition": {"calories": 350.0, "carbs": 30.0, "protein": 20.0, "fat": 10.0, "giLevel": "Low"},
        "tips": ""
    })
}

//=========================================================================================
// Profile
//=========================================================================================

#[tokio::test]
async fn profile_can_be_saved_and_measured() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app(dir.path());

    let (status, _) = send(&app, Method::GET, "/profile", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::GET, "/profile/metrics", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::PUT, "/profile", Some(profile_json())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["diabetesType"], "Type2");

    let (status, body) = send(&app, Method::GET, "/profile/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bmi"], 25.7);
    assert_eq!(body["bmiCategory"], "Overweight");
    assert_eq!(body["glucoseStatus"], "Elevated");
}

#[tokio::test]
async fn invalid_profile_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app(dir.path());

    let mut profile = profile_json();
    profile["age"] = json!(12);
    let (status, _) = send(&app, Method::PUT, "/profile", Some(profile)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, Method::GET, "/profile", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

//=========================================================================================
// Meal Plan
//=========================================================================================

#[tokio::test]
async fn plan_lifecycle() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app(dir.path());

    // No plan yet: plan mutations report it instead of silently succeeding.
    let (status, _) = send(&app, Method::GET, "/plan", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::DELETE, "/plan/recipes/r1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let plan = json!([
        recipe_json("r2", "Steamed fish", "19:00"),
        recipe_json("r1", "Oat porridge", "08:00")
    ]);
    let (status, body) = send(&app, Method::PUT, "/plan", Some(plan)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], "r1");
    assert_eq!(body[1]["id"], "r2");

    let mut unnamed = recipe_json("", "Cucumber salad", "15:00");
    unnamed.as_object_mut().unwrap().remove("id");
    let (status, body) = send(&app, Method::POST, "/plan/recipes", Some(unnamed)).await;
    assert_eq!(status, StatusCode::CREATED);
    let generated = body["id"].as_str().expect("generated id").to_string();
    assert!(generated.starts_with("recipe-"));

    let (status, _) = send(
        &app,
        Method::POST,
        "/plan/recipes",
        Some(recipe_json("r1", "Another porridge", "09:00")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/plan/recipes/r1",
        Some(recipe_json("r1", "Buckwheat porridge", "07:30")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Buckwheat porridge");

    let (status, _) = send(
        &app,
        Method::PUT,
        "/plan/recipes/r1",
        Some(recipe_json("r2", "Mismatched", "07:30")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/plan/recipes/missing",
        Some(recipe_json("missing", "Ghost", "10:00")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, "/plan/recipes/r1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, "/plan", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, [generated.as_str(), "r2"]);

    let (status, body) = send(&app, Method::GET, "/plan/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recipeCount"], 2);
    assert_eq!(body["calories"], 700.0);
}

#[tokio::test]
async fn plan_with_duplicate_ids_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app(dir.path());

    let plan = json!([
        recipe_json("r1", "Oat porridge", "08:00"),
        recipe_json("r1", "Steamed fish", "19:00")
    ]);
    let (status, _) = send(&app, Method::PUT, "/plan", Some(plan)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let bad_time = json!([recipe_json("r1", "Oat porridge", "8am")]);
    let (status, _) = send(&app, Method::PUT, "/plan", Some(bad_time)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

//=========================================================================================
// Saved Recipes
//=========================================================================================

#[tokio::test]
async fn saved_toggle_is_keyed_by_name() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app(dir.path());

    let (status, body) = send(
        &app,
        Method::POST,
        "/saved/toggle",
        Some(recipe_json("a", "Bitter melon", "18:00")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["saved"], true);

    let (_, body) = send(
        &app,
        Method::POST,
        "/saved/toggle",
        Some(recipe_json("b", "Bitter melon", "18:00")),
    )
    .await;
    assert_eq!(body["saved"], false);
    assert_eq!(body["savedCount"], 0);

    let (_, body) = send(&app, Method::GET, "/saved", None).await;
    assert_eq!(body, json!([]));
}

//=========================================================================================
// Persistence
//=========================================================================================

#[tokio::test]
async fn state_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let first = app(dir.path());
    send(&first, Method::PUT, "/profile", Some(profile_json())).await;
    send(
        &first,
        Method::POST,
        "/plan/recipes",
        Some(recipe_json("r1", "Oat porridge", "08:00")),
    )
    .await;
    send(
        &first,
        Method::POST,
        "/saved/toggle",
        Some(recipe_json("r1", "Oat porridge", "08:00")),
    )
    .await;
    let (_, before) = send(&first, Method::GET, "/state", None).await;

    let second = app(dir.path());
    let (_, after) = send(&second, Method::GET, "/state", None).await;
    assert_eq!(before, after);
    assert_eq!(after["mealPlan"][0]["id"], "r1");

    let (_, health) = send(&second, Method::GET, "/health", None).await;
    assert_eq!(health["purgedOnOpen"], false);
}

#[tokio::test]
async fn old_schema_version_is_purged_on_startup() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("mp_app_version.json"), "\"0.9.0\"").unwrap();
    std::fs::write(
        dir.path().join("mp_user_profile.json"),
        profile_json().to_string(),
    )
    .unwrap();

    let app = app(dir.path());
    let (status, _) = send(&app, Method::GET, "/profile", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, health) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(health["purgedOnOpen"], true);
    assert_eq!(health["schemaVersion"], "1.0.0");
    assert_eq!(health["recentEvents"][0]["kind"], "version_purged");
    assert!(!dir.path().join("mp_user_profile.json").exists());
}

#[tokio::test]
async fn dropped_writes_degrade_health_but_keep_memory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = Config::for_tests(dir.path().to_path_buf());
    config.storage_quota_bytes = Some(300);
    let app = app_with(config);

    let plan = json!([
        recipe_json("r1", "Oat porridge", "08:00"),
        recipe_json("r2", "Steamed fish", "19:00")
    ]);
    let (status, _) = send(&app, Method::PUT, "/plan", Some(plan)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/plan", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(2));
    assert!(!dir.path().join("mp_meal_plan.json").exists());

    let (_, health) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["droppedWrites"], 1);
}
