//! services/api/src/web/profile.rs
//!
//! Handlers for the user profile and the metrics derived from it.

use crate::web::rest::{not_found, unprocessable, HandlerError};
use crate::web::state::AppState;
use axum::{extract::State, response::Json};
use meal_planner_core::{HealthMetrics, UserProfile};
use std::sync::Arc;
use tracing::{info, warn};

const NO_PROFILE: &str = "No profile has been saved yet";

/// The saved profile.
#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "The saved profile", body = UserProfile),
        (status = 404, description = "No profile has been saved yet")
    )
)]
pub async fn get_profile_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UserProfile>, HandlerError> {
    let store = state.store.lock().await;
    store.profile().cloned().map(Json).ok_or_else(|| not_found(NO_PROFILE))
}

/// Replace the profile. The body must be a complete profile; there is no partial update.
#[utoipa::path(
    put,
    path = "/profile",
    request_body = UserProfile,
    responses(
        (status = 200, description = "Profile saved", body = UserProfile),
        (status = 422, description = "Profile failed validation")
    )
)]
pub async fn put_profile_handler(
    State(state): State<Arc<AppState>>,
    Json(profile): Json<UserProfile>,
) -> Result<Json<UserProfile>, HandlerError> {
    profile.validate().map_err(|e| {
        warn!("Rejected profile: {}", e);
        unprocessable(e)
    })?;

    let stored = profile.clone();
    state.mutate(move |store| store.set_profile(stored)).await;
    info!(age = profile.age, diabetes_type = ?profile.diabetes_type, "profile saved");
    Ok(Json(profile))
}

/// BMI, calorie and macro targets, and fasting glucose status for the saved profile.
#[utoipa::path(
    get,
    path = "/profile/metrics",
    responses(
        (status = 200, description = "Derived metrics", body = HealthMetrics),
        (status = 404, description = "No profile has been saved yet")
    )
)]
pub async fn get_metrics_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthMetrics>, HandlerError> {
    let store = state.store.lock().await;
    let profile = store.profile().ok_or_else(|| not_found(NO_PROFILE))?;
    Ok(Json(HealthMetrics::for_profile(profile)))
}
