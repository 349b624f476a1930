//! services/api/src/web/rest.rs
//!
//! Contains the service-level REST handlers (health and full snapshot) and the
//! master definition for the OpenAPI specification.

use crate::web::state::AppState;
use crate::web::{plan, profile, saved};
use axum::{extract::State, http::StatusCode, response::Json};
use meal_planner_core::metrics::{BmiCategory, GlucoseStatus, MacroTargets};
use meal_planner_core::{
    DiabetesType, Gender, GiLevel, HealthMetrics, Ingredient, MealType, Nutrition,
    PersistenceEvent, PlanNutrition, Recipe, Snapshot, UserProfile,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        state_handler,
        profile::get_profile_handler,
        profile::put_profile_handler,
        profile::get_metrics_handler,
        plan::get_plan_handler,
        plan::put_plan_handler,
        plan::plan_summary_handler,
        plan::add_recipe_handler,
        plan::update_recipe_handler,
        plan::delete_recipe_handler,
        saved::get_saved_handler,
        saved::toggle_saved_handler,
    ),
    components(
        schemas(
            HealthResponse, EventView, Snapshot, UserProfile, Gender, DiabetesType, Recipe,
            MealType, Ingredient, Nutrition, GiLevel, HealthMetrics, BmiCategory,
            GlucoseStatus, MacroTargets, PlanNutrition, saved::ToggleSavedResponse
        )
    ),
    tags(
        (name = "Meal Planner API", description = "Profile, meal plan and saved recipes for a diabetic diet tracker.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Shared Error Helpers
//=========================================================================================

/// The error shape every handler returns.
pub type HandlerError = (StatusCode, String);

pub(crate) fn not_found(message: &str) -> HandlerError {
    (StatusCode::NOT_FOUND, message.to_string())
}

pub(crate) fn unprocessable(message: impl std::fmt::Display) -> HandlerError {
    (StatusCode::UNPROCESSABLE_ENTITY, message.to_string())
}

pub(crate) fn conflict(message: impl std::fmt::Display) -> HandlerError {
    (StatusCode::CONFLICT, message.to_string())
}

//=========================================================================================
// API Response Structs
//=========================================================================================

/// One persistence event as reported by `/health`.
#[derive(Debug, Serialize, ToSchema, PartialEq)]
pub struct EventView {
    pub kind: String,
    pub key: Option<String>,
    pub detail: String,
}

impl From<&PersistenceEvent> for EventView {
    fn from(event: &PersistenceEvent) -> Self {
        match event {
            PersistenceEvent::ReadDiscarded { key, reason } => Self {
                kind: "read_discarded".to_string(),
                key: Some(key.clone()),
                detail: reason.clone(),
            },
            PersistenceEvent::Evicted { key, for_key } => Self {
                kind: "evicted".to_string(),
                key: Some(key.clone()),
                detail: format!("evicted to make room for '{for_key}'"),
            },
            PersistenceEvent::WriteDropped { key, reason } => Self {
                kind: "write_dropped".to_string(),
                key: Some(key.clone()),
                detail: reason.clone(),
            },
            PersistenceEvent::VersionPurged { previous, current } => Self {
                kind: "version_purged".to_string(),
                key: None,
                detail: format!(
                    "schema {} -> {}",
                    previous.as_deref().unwrap_or("<none>"),
                    current
                ),
            },
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `ok`, or `degraded` once any write has been dropped.
    pub status: String,
    pub schema_version: String,
    pub purged_on_open: bool,
    pub dropped_writes: u64,
    pub recent_events: Vec<EventView>,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Service health, including persistence failures the store recovered from or gave up on.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health", body = HealthResponse)
    )
)]
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let purged_on_open = state.store.lock().await.purged_on_open();
    let dropped_writes = state.events.dropped_writes();
    let status = if dropped_writes == 0 { "ok" } else { "degraded" };
    Json(HealthResponse {
        status: status.to_string(),
        schema_version: state.config.schema_version.clone(),
        purged_on_open,
        dropped_writes,
        recent_events: state.events.events().iter().map(EventView::from).collect(),
    })
}

/// The current profile, meal plan and saved recipes in one read.
#[utoipa::path(
    get,
    path = "/state",
    responses(
        (status = 200, description = "Current snapshot", body = Snapshot)
    )
)]
pub async fn state_handler(State(state): State<Arc<AppState>>) -> Json<Snapshot> {
    Json(state.store.lock().await.snapshot())
}
