//! services/api/src/web/saved.rs
//!
//! Handlers for the saved-recipe set. Saved recipes are identified by `name`,
//! not `id`: toggling a recipe whose name is already saved removes it.

use crate::web::rest::{unprocessable, HandlerError};
use crate::web::state::AppState;
use axum::{extract::State, response::Json};
use meal_planner_core::{Recipe, SaveToggle};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleSavedResponse {
    /// Whether the recipe is saved after the toggle.
    pub saved: bool,
    pub saved_count: usize,
}

/// All saved recipes.
#[utoipa::path(
    get,
    path = "/saved",
    responses(
        (status = 200, description = "Saved recipes", body = Vec<Recipe>)
    )
)]
pub async fn get_saved_handler(State(state): State<Arc<AppState>>) -> Json<Vec<Recipe>> {
    Json(state.store.lock().await.saved_recipes().to_vec())
}

/// Save the recipe, or unsave it if a recipe with the same name is already saved.
#[utoipa::path(
    post,
    path = "/saved/toggle",
    request_body = Recipe,
    responses(
        (status = 200, description = "Toggle applied", body = ToggleSavedResponse),
        (status = 422, description = "Recipe failed validation")
    )
)]
pub async fn toggle_saved_handler(
    State(state): State<Arc<AppState>>,
    Json(recipe): Json<Recipe>,
) -> Result<Json<ToggleSavedResponse>, HandlerError> {
    recipe.validate().map_err(unprocessable)?;

    let name = recipe.name.clone();
    let response = state
        .mutate(move |store| ToggleSavedResponse {
            saved: store.toggle_save_recipe(recipe) == SaveToggle::Saved,
            saved_count: store.saved_recipes().len(),
        })
        .await;
    debug!(%name, saved = response.saved, "toggled saved recipe");
    Ok(Json(response))
}
