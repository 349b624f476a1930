//! crates/meal_planner_core/src/domain.rs
//!
//! Defines the core data structures the store owns: the user profile, recipes,
//! the meal plan and the saved-recipe set.
//!
//! These types serialize to the JSON shapes kept in durable storage, so field
//! names follow the stored camelCase layout rather than Rust naming.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

//=========================================================================================
// Validation Errors
//=========================================================================================

/// Errors raised when an entity fails its intake checks.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{field} is not a valid number: '{value}'")]
    NotANumber { field: &'static str, value: String },
    #[error("time must be HH:MM (24-hour), got '{0}'")]
    InvalidTime(String),
    #[error("{0} must not be negative")]
    Negative(&'static str),
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), DomainError> {
    if value.is_nan() || value < min || value > max {
        return Err(DomainError::OutOfRange {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}

//=========================================================================================
// User Profile
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum DiabetesType {
    Type1,
    Type2,
    Prediabetes,
    Gestational,
}

/// The intake profile of the single user of this installation.
///
/// Always written as one complete object; there is no partial update path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub age: u32,
    #[serde(rename = "height")]
    pub height_cm: f64,
    #[serde(rename = "weight")]
    pub weight_kg: f64,
    pub gender: Gender,
    pub diabetes_type: DiabetesType,
    /// Free-text mmol/L reading as typed into the intake form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fasting_glucose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication: Option<String>,
    #[serde(default)]
    pub staple_food: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    pub meals_per_day: u32,
    #[serde(default)]
    pub special_requests: String,
}

impl UserProfile {
    pub const AGE_RANGE: (u32, u32) = (18, 90);
    pub const HEIGHT_RANGE_CM: (f64, f64) = (140.0, 220.0);
    pub const WEIGHT_RANGE_KG: (f64, f64) = (40.0, 150.0);
    pub const FASTING_GLUCOSE_RANGE: (f64, f64) = (3.0, 15.0);
    pub const MEALS_PER_DAY_RANGE: (u32, u32) = (1, 6);

    /// Checks the profile against the bounds enforced by the intake form.
    pub fn validate(&self) -> Result<(), DomainError> {
        check_range(
            "age",
            f64::from(self.age),
            f64::from(Self::AGE_RANGE.0),
            f64::from(Self::AGE_RANGE.1),
        )?;
        check_range(
            "height",
            self.height_cm,
            Self::HEIGHT_RANGE_CM.0,
            Self::HEIGHT_RANGE_CM.1,
        )?;
        check_range(
            "weight",
            self.weight_kg,
            Self::WEIGHT_RANGE_KG.0,
            Self::WEIGHT_RANGE_KG.1,
        )?;
        if let Some(glucose) = self.fasting_glucose_mmol()? {
            check_range(
                "fastingGlucose",
                glucose,
                Self::FASTING_GLUCOSE_RANGE.0,
                Self::FASTING_GLUCOSE_RANGE.1,
            )?;
        }
        if self.staple_food.iter().all(|s| s.trim().is_empty()) {
            return Err(DomainError::Missing("stapleFood"));
        }
        check_range(
            "mealsPerDay",
            f64::from(self.meals_per_day),
            f64::from(Self::MEALS_PER_DAY_RANGE.0),
            f64::from(Self::MEALS_PER_DAY_RANGE.1),
        )?;
        Ok(())
    }

    /// Parses the free-text fasting glucose reading.
    ///
    /// Blank input counts as "not provided".
    pub fn fasting_glucose_mmol(&self) -> Result<Option<f64>, DomainError> {
        let Some(raw) = self.fasting_glucose.as_deref().map(str::trim) else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse::<f64>()
            .map(Some)
            .map_err(|_| DomainError::NotANumber {
                field: "fastingGlucose",
                value: raw.to_string(),
            })
    }
}

//=========================================================================================
// Recipes
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

/// Glycemic index rating of a dish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum GiLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Ingredient {
    pub name: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Nutrition {
    pub calories: f64,
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
    pub gi_level: GiLevel,
}

/// One meal or snack. Treated as immutable once created; edits replace the
/// whole record under the same `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub meal_type: MealType,
    /// `HH:MM`, 24-hour.
    pub time: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub steps: Vec<String>,
    pub nutrition: Nutrition,
    #[serde(default)]
    pub tips: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Recipe {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.id.trim().is_empty() {
            return Err(DomainError::Missing("id"));
        }
        if self.name.trim().is_empty() {
            return Err(DomainError::Missing("name"));
        }
        parse_meal_time(&self.time)?;
        let n = &self.nutrition;
        for (field, value) in [
            ("calories", n.calories),
            ("carbs", n.carbs),
            ("protein", n.protein),
            ("fat", n.fat),
        ] {
            if value.is_nan() || value < 0.0 {
                return Err(DomainError::Negative(field));
            }
        }
        Ok(())
    }
}

/// Parses a strict `HH:MM` 24-hour time.
pub fn parse_meal_time(time: &str) -> Result<NaiveTime, DomainError> {
    let well_formed = time.len() == 5 && time.as_bytes()[2] == b':';
    if !well_formed {
        return Err(DomainError::InvalidTime(time.to_string()));
    }
    NaiveTime::parse_from_str(time, "%H:%M").map_err(|_| DomainError::InvalidTime(time.to_string()))
}

/// Builds a timestamp-derived recipe id.
///
/// Only unique to the millisecond; callers adding to an existing plan still
/// need to check for collisions.
pub fn generate_recipe_id(now: DateTime<Utc>) -> String {
    format!("recipe-{}", now.timestamp_millis())
}

//=========================================================================================
// Meal Plan & Saved Recipes
//=========================================================================================

/// A day's recipes. Insertion order carries no meaning; see [`sorted_by_time`].
///
/// Identity inside a plan is the recipe `id`.
pub type MealPlan = Vec<Recipe>;

/// Recipes the user bookmarked.
///
/// Identity inside this set is the recipe `name`, unlike [`MealPlan`], so two
/// different recipes sharing a name cannot both be saved.
pub type SavedRecipes = Vec<Recipe>;

/// Returns the plan in display order. Recipes whose time does not parse go last,
/// keeping their relative order.
pub fn sorted_by_time(plan: &[Recipe]) -> Vec<&Recipe> {
    let mut sorted: Vec<&Recipe> = plan.iter().collect();
    sorted.sort_by_key(|r| match parse_meal_time(&r.time) {
        Ok(t) => (0, Some(t)),
        Err(_) => (1, None),
    });
    sorted
}


#[cfg(test)]
mod tests {
    use super::fixtures::{profile, recipe};
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn profile_serializes_with_stored_field_names() {
        let value = serde_json::to_value(profile()).unwrap();
        assert_eq!(value["height"], 168.0);
        assert_eq!(value["weight"], 74.5);
        assert_eq!(value["diabetesType"], "Type2");
        assert_eq!(value["stapleFood"][0], "rice");
        assert!(value.get("height_cm").is_none());
    }

    #[test]
    fn valid_profile_passes() {
        assert_eq!(profile().validate(), Ok(()));
    }

    #[test]
    fn profile_out_of_range_fields_are_rejected() {
        let mut p = profile();
        p.age = 17;
        assert!(matches!(p.validate(), Err(DomainError::OutOfRange { field: "age", .. })));

        let mut p = profile();
        p.weight_kg = 151.0;
        assert!(matches!(p.validate(), Err(DomainError::OutOfRange { field: "weight", .. })));

        let mut p = profile();
        p.fasting_glucose = Some("2.5".to_string());
        assert!(matches!(
            p.validate(),
            Err(DomainError::OutOfRange { field: "fastingGlucose", .. })
        ));

        let mut p = profile();
        p.fasting_glucose = Some("high".to_string());
        assert!(matches!(p.validate(), Err(DomainError::NotANumber { .. })));

        let mut p = profile();
        p.staple_food = vec!["  ".to_string()];
        assert_eq!(p.validate(), Err(DomainError::Missing("stapleFood")));
    }

    #[test]
    fn blank_fasting_glucose_counts_as_absent() {
        let mut p = profile();
        p.fasting_glucose = Some("   ".to_string());
        assert_eq!(p.fasting_glucose_mmol(), Ok(None));
        assert_eq!(p.validate(), Ok(()));
    }

    #[test]
    fn recipe_validation_checks_time_and_nutrition() {
        assert_eq!(recipe("r1", "Congee", "07:30").validate(), Ok(()));
        assert!(matches!(
            recipe("r1", "Congee", "7:30").validate(),
            Err(DomainError::InvalidTime(_))
        ));
        assert!(matches!(
            recipe("r1", "Congee", "25:00").validate(),
            Err(DomainError::InvalidTime(_))
        ));

        let mut r = recipe("r1", "Congee", "07:30");
        r.nutrition.calories = -1.0;
        assert_eq!(r.validate(), Err(DomainError::Negative("calories")));

        assert_eq!(recipe("", "Congee", "07:30").validate(), Err(DomainError::Missing("id")));
    }

    #[test]
    fn gi_level_rejects_unknown_labels() {
        let err = serde_json::from_str::<GiLevel>("\"VeryLow\"");
        assert!(err.is_err());
    }

    #[test]
    fn sort_by_time_puts_unparseable_last() {
        let plan = vec![
            recipe("c", "Dinner", "19:00"),
            recipe("x", "Mystery", "later"),
            recipe("a", "Breakfast", "08:00"),
            recipe("b", "Lunch", "12:30"),
        ];
        let ids: Vec<&str> = sorted_by_time(&plan).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c", "x"]);
    }

    #[test]
    fn generated_ids_use_millisecond_timestamp() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(generate_recipe_id(now), "recipe-1700000000123");
    }
}
