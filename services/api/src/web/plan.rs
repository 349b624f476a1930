//! services/api/src/web/plan.rs
//!
//! Handlers for the meal plan and the recipes in it.
//!
//! Recipes in a plan are identified by `id`. The store does not reject duplicate
//! ids on its own, so these handlers check before adding or replacing.

use crate::web::rest::{conflict, not_found, unprocessable, HandlerError};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use meal_planner_core::domain::{generate_recipe_id, sorted_by_time};
use meal_planner_core::{DomainStore, MutationOutcome, PlanNutrition, Recipe};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

const NO_PLAN: &str = "No meal plan exists";

fn in_display_order(plan: &[Recipe]) -> Vec<Recipe> {
    sorted_by_time(plan).into_iter().cloned().collect()
}

fn outcome_error(outcome: MutationOutcome, id: &str) -> Option<HandlerError> {
    match outcome {
        MutationOutcome::Applied => None,
        MutationOutcome::NoPlanExists => Some(not_found(NO_PLAN)),
        MutationOutcome::RecipeNotFound => {
            Some(not_found(&format!("No recipe with id '{id}' in the meal plan")))
        }
    }
}

/// A timestamp id that is not already in the plan.
fn unique_recipe_id(store: &DomainStore) -> String {
    let base = generate_recipe_id(Utc::now());
    let mut candidate = base.clone();
    let mut suffix = 1;
    while store.plan_contains(&candidate) {
        candidate = format!("{base}-{suffix}");
        suffix += 1;
    }
    candidate
}

//=========================================================================================
// Whole-plan Handlers
//=========================================================================================

/// The current plan, ordered by meal time.
#[utoipa::path(
    get,
    path = "/plan",
    responses(
        (status = 200, description = "The plan, sorted by time", body = Vec<Recipe>),
        (status = 404, description = "No meal plan exists")
    )
)]
pub async fn get_plan_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Recipe>>, HandlerError> {
    let store = state.store.lock().await;
    let plan = store.meal_plan().ok_or_else(|| not_found(NO_PLAN))?;
    Ok(Json(in_display_order(plan)))
}

/// Replace the whole plan, e.g. with a freshly generated one.
#[utoipa::path(
    put,
    path = "/plan",
    request_body = Vec<Recipe>,
    responses(
        (status = 200, description = "Plan saved, sorted by time", body = Vec<Recipe>),
        (status = 409, description = "Two recipes share an id"),
        (status = 422, description = "A recipe failed validation")
    )
)]
pub async fn put_plan_handler(
    State(state): State<Arc<AppState>>,
    Json(plan): Json<Vec<Recipe>>,
) -> Result<Json<Vec<Recipe>>, HandlerError> {
    // 1. Validate every recipe on its own.
    for (index, recipe) in plan.iter().enumerate() {
        recipe.validate().map_err(|e| {
            warn!("Rejected meal plan at recipe {}: {}", index, e);
            unprocessable(format!("recipe {index}: {e}"))
        })?;
    }

    // 2. Ids must be unique within the plan.
    let mut seen = HashSet::new();
    if let Some(dup) = plan.iter().find(|r| !seen.insert(r.id.as_str())) {
        return Err(conflict(format!("Duplicate recipe id '{}'", dup.id)));
    }

    let sorted = in_display_order(&plan);
    state.mutate(move |store| store.set_meal_plan(plan)).await;
    info!(recipes = sorted.len(), "meal plan replaced");
    Ok(Json(sorted))
}

/// Nutrition totals for the current plan.
#[utoipa::path(
    get,
    path = "/plan/summary",
    responses(
        (status = 200, description = "Plan nutrition totals", body = PlanNutrition),
        (status = 404, description = "No meal plan exists")
    )
)]
pub async fn plan_summary_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PlanNutrition>, HandlerError> {
    let store = state.store.lock().await;
    let plan = store.meal_plan().ok_or_else(|| not_found(NO_PLAN))?;
    Ok(Json(PlanNutrition::for_plan(plan)))
}

//=========================================================================================
// Single-recipe Handlers
//=========================================================================================

/// Add one recipe to the plan, creating the plan if there is none.
///
/// The `id` may be omitted or empty, in which case a timestamp id is assigned.
#[utoipa::path(
    post,
    path = "/plan/recipes",
    request_body = Recipe,
    responses(
        (status = 201, description = "Recipe added", body = Recipe),
        (status = 409, description = "The plan already has a recipe with this id"),
        (status = 422, description = "Recipe failed validation")
    )
)]
pub async fn add_recipe_handler(
    State(state): State<Arc<AppState>>,
    Json(mut body): Json<Value>,
) -> Result<impl IntoResponse, HandlerError> {
    let recipe = state
        .mutate(move |store| -> Result<Recipe, HandlerError> {
            // 1. Fill in an id when the caller did not supply one.
            let fields = body
                .as_object_mut()
                .ok_or_else(|| unprocessable("Recipe must be a JSON object"))?;
            let has_id = fields
                .get("id")
                .and_then(Value::as_str)
                .is_some_and(|id| !id.trim().is_empty());
            if !has_id {
                fields.insert("id".to_string(), Value::String(unique_recipe_id(store)));
            }

            // 2. Decode and validate.
            let recipe: Recipe = serde_json::from_value(body).map_err(unprocessable)?;
            recipe.validate().map_err(unprocessable)?;

            // 3. Refuse to create a second recipe with the same id.
            if store.plan_contains(&recipe.id) {
                return Err(conflict(format!(
                    "The meal plan already has a recipe with id '{}'",
                    recipe.id
                )));
            }

            store.add_recipe_to_plan(recipe.clone());
            Ok(recipe)
        })
        .await?;
    info!(id = %recipe.id, name = %recipe.name, "recipe added to plan");
    Ok((StatusCode::CREATED, Json(recipe)))
}

/// Replace the recipe with the given id.
#[utoipa::path(
    put,
    path = "/plan/recipes/{id}",
    request_body = Recipe,
    params(
        ("id" = String, Path, description = "Id of the recipe to replace")
    ),
    responses(
        (status = 200, description = "Recipe replaced", body = Recipe),
        (status = 400, description = "Body id does not match the path"),
        (status = 404, description = "No plan, or no recipe with this id"),
        (status = 422, description = "Recipe failed validation")
    )
)]
pub async fn update_recipe_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(mut recipe): Json<Recipe>,
) -> Result<Json<Recipe>, HandlerError> {
    if recipe.id.trim().is_empty() {
        recipe.id = id.clone();
    } else if recipe.id != id {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Body id '{}' does not match path id '{}'", recipe.id, id),
        ));
    }
    recipe.validate().map_err(unprocessable)?;

    let replacement = recipe.clone();
    let outcome = state
        .mutate(move |store| store.update_recipe_in_plan(replacement))
        .await;
    match outcome_error(outcome, &id) {
        Some(err) => Err(err),
        None => Ok(Json(recipe)),
    }
}

/// Remove the recipe with the given id.
#[utoipa::path(
    delete,
    path = "/plan/recipes/{id}",
    params(
        ("id" = String, Path, description = "Id of the recipe to remove")
    ),
    responses(
        (status = 204, description = "Recipe removed"),
        (status = 404, description = "No plan, or no recipe with this id")
    )
)]
pub async fn delete_recipe_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, HandlerError> {
    let outcome = state
        .mutate(|store| store.remove_recipe_from_plan(&id))
        .await;
    match outcome_error(outcome, &id) {
        Some(err) => Err(err),
        None => Ok(StatusCode::NO_CONTENT),
    }
}
