//! crates/meal_planner_core/src/hydration.rs
//!
//! Rebuilds the in-memory entities from storage at startup.
//!
//! Validation here is structural only: it rejects values of entirely the wrong
//! kind before typed decoding is attempted. A profile that fails either step is
//! replaced by its default. Lists are decoded element by element, so one bad
//! recipe costs only itself.

use crate::domain::{MealPlan, SavedRecipes, UserProfile};
use crate::persistence::PersistenceAdapter;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A cheap shape check applied to the raw JSON before decoding.
pub type Validator = fn(&Value) -> bool;

/// An object carrying numeric `age` and `weight` fields.
pub fn is_profile_shaped(value: &Value) -> bool {
    value.is_object()
        && value.get("age").is_some_and(Value::is_number)
        && value.get("weight").is_some_and(Value::is_number)
}

/// Any JSON array, whatever its elements look like.
pub fn is_sequence(value: &Value) -> bool {
    value.is_array()
}

/// Loads `key`, returning `default` when it is missing, corrupt, rejected by
/// `validator`, or undecodable as `T`.
pub fn load<T: DeserializeOwned>(
    adapter: &PersistenceAdapter,
    key: &str,
    default: T,
    validator: Option<Validator>,
) -> T {
    let Some(value) = adapter.read_value(key) else {
        return default;
    };
    if let Some(is_valid) = validator {
        if !is_valid(&value) {
            adapter.discard(key, "stored value failed validation".to_string());
            return default;
        }
    }
    adapter.decode_or(key, value, default)
}

/// Loads the JSON array at `key` one element at a time.
///
/// Returns `None` when the key is missing, corrupt or not an array. Elements
/// that do not decode as `T` are dropped and reported; the rest are kept.
pub fn load_sequence<T: DeserializeOwned>(
    adapter: &PersistenceAdapter,
    key: &str,
) -> Option<Vec<T>> {
    let elements = load::<Option<Vec<Value>>>(adapter, key, None, Some(is_sequence))?;

    let mut decoded = Vec::with_capacity(elements.len());
    for (index, element) in elements.into_iter().enumerate() {
        match serde_json::from_value(element) {
            Ok(item) => decoded.push(item),
            Err(e) => adapter.discard(key, format!("dropped element {index}: {e}")),
        }
    }
    Some(decoded)
}

/// The three entities as read back from storage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hydrated {
    pub profile: Option<UserProfile>,
    pub meal_plan: Option<MealPlan>,
    pub saved_recipes: SavedRecipes,
}

pub fn hydrate(adapter: &PersistenceAdapter) -> Hydrated {
    let keys = adapter.keys();
    Hydrated {
        profile: load(adapter, &keys.profile, None, Some(is_profile_shaped)),
        meal_plan: load_sequence(adapter, &keys.meal_plan),
        saved_recipes: load_sequence(adapter, &keys.saved_recipes).unwrap_or_default(),
    }
}
