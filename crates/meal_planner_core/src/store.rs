//! crates/meal_planner_core/src/store.rs
//!
//! The domain store: the authoritative in-memory copy of the profile, the meal
//! plan and the saved recipes.
//!
//! Every mutator updates memory first and then writes through the persistence
//! adapter. Storage trouble never surfaces here; see `persistence`.

use crate::domain::{MealPlan, Recipe, SavedRecipes, UserProfile};
use crate::hydration::{self, Hydrated};
use crate::persistence::PersistenceAdapter;
use crate::version;
use serde::Serialize;
use tracing::{debug, info};

/// Result of a plan mutation that needs an existing plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied,
    /// There is no current plan. Nothing changed and nothing was written.
    NoPlanExists,
    /// The plan has no recipe with the given id. Nothing changed.
    RecipeNotFound,
}

/// Result of toggling a saved recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveToggle {
    Saved,
    Unsaved,
}

/// A copy of all three entities at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub profile: Option<UserProfile>,
    pub meal_plan: Option<Vec<Recipe>>,
    pub saved_recipes: Vec<Recipe>,
}

pub struct DomainStore {
    adapter: PersistenceAdapter,
    profile: Option<UserProfile>,
    meal_plan: Option<MealPlan>,
    saved_recipes: SavedRecipes,
    purged_on_open: bool,
}

impl DomainStore {
    /// Runs the version gate and hydrates the store. Call once per process.
    pub fn open(adapter: PersistenceAdapter, expected_version: &str) -> Self {
        let purged_on_open = version::ensure_version(&adapter, expected_version);
        let Hydrated {
            profile,
            meal_plan,
            saved_recipes,
        } = hydration::hydrate(&adapter);
        info!(
            has_profile = profile.is_some(),
            plan_len = meal_plan.as_ref().map_or(0, Vec::len),
            saved = saved_recipes.len(),
            purged_on_open,
            "domain store ready"
        );
        Self {
            adapter,
            profile,
            meal_plan,
            saved_recipes,
            purged_on_open,
        }
    }

    /// Whether opening the store wiped data because of a version change.
    pub fn purged_on_open(&self) -> bool {
        self.purged_on_open
    }

    //=====================================================================================
    // Reads
    //=====================================================================================

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn meal_plan(&self) -> Option<&[Recipe]> {
        self.meal_plan.as_deref()
    }

    pub fn saved_recipes(&self) -> &[Recipe] {
        &self.saved_recipes
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            profile: self.profile.clone(),
            meal_plan: self.meal_plan.clone(),
            saved_recipes: self.saved_recipes.clone(),
        }
    }

    /// Plan membership is by recipe id.
    pub fn plan_contains(&self, id: &str) -> bool {
        self.meal_plan
            .as_ref()
            .is_some_and(|plan| plan.iter().any(|r| r.id == id))
    }

    /// Saved-set membership is by recipe name, not id.
    pub fn is_saved(&self, name: &str) -> bool {
        self.saved_recipes.iter().any(|r| r.name == name)
    }

    //=====================================================================================
    // Mutations
    //=====================================================================================

    /// Replaces the profile wholesale.
    pub fn set_profile(&mut self, profile: UserProfile) {
        self.profile = Some(profile);
        self.persist_profile();
    }

    /// Replaces the plan wholesale, e.g. after a regeneration.
    pub fn set_meal_plan(&mut self, plan: MealPlan) {
        debug!(len = plan.len(), "replacing meal plan");
        self.meal_plan = Some(plan);
        self.persist_meal_plan();
    }

    /// Appends to the plan, creating it if needed.
    ///
    /// Does not check for an existing recipe with the same id; use
    /// [`DomainStore::plan_contains`] first when that matters.
    pub fn add_recipe_to_plan(&mut self, recipe: Recipe) {
        self.meal_plan.get_or_insert_with(Vec::new).push(recipe);
        self.persist_meal_plan();
    }

    /// Replaces the recipe whose id matches `recipe.id`.
    pub fn update_recipe_in_plan(&mut self, recipe: Recipe) -> MutationOutcome {
        let Some(plan) = self.meal_plan.as_mut() else {
            return MutationOutcome::NoPlanExists;
        };
        let Some(slot) = plan.iter_mut().find(|r| r.id == recipe.id) else {
            return MutationOutcome::RecipeNotFound;
        };
        *slot = recipe;
        self.persist_meal_plan();
        MutationOutcome::Applied
    }

    /// Removes the recipe with the given id.
    pub fn remove_recipe_from_plan(&mut self, id: &str) -> MutationOutcome {
        let Some(plan) = self.meal_plan.as_mut() else {
            return MutationOutcome::NoPlanExists;
        };
        let before = plan.len();
        plan.retain(|r| r.id != id);
        if plan.len() == before {
            return MutationOutcome::RecipeNotFound;
        }
        self.persist_meal_plan();
        MutationOutcome::Applied
    }

    /// Unsaves the recipe if one with the same name is saved, else saves it.
    pub fn toggle_save_recipe(&mut self, recipe: Recipe) -> SaveToggle {
        let outcome = match self.saved_recipes.iter().position(|r| r.name == recipe.name) {
            Some(index) => {
                self.saved_recipes.remove(index);
                SaveToggle::Unsaved
            }
            None => {
                self.saved_recipes.push(recipe);
                SaveToggle::Saved
            }
        };
        self.persist_saved_recipes();
        outcome
    }

    //=====================================================================================
    // Write-through
    //=====================================================================================

    fn persist_profile(&self) {
        self.adapter
            .set(&self.adapter.keys().profile, self.profile.as_ref());
    }

    fn persist_meal_plan(&self) {
        self.adapter
            .set(&self.adapter.keys().meal_plan, self.meal_plan.as_ref());
    }

    fn persist_saved_recipes(&self) {
        self.adapter
            .set(&self.adapter.keys().saved_recipes, Some(&self.saved_recipes));
    }
}
