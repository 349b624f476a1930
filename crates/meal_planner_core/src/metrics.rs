//! crates/meal_planner_core/src/metrics.rs
//!
//! Figures derived from the stored entities: body metrics and calorie targets
//! from the profile, glucose status from the fasting reading, and nutrition
//! totals for a meal plan. Nothing here is persisted.

use crate::domain::{DiabetesType, GiLevel, Gender, MealType, Recipe, UserProfile};
use serde::Serialize;
use std::collections::BTreeMap;

/// Lowest daily calorie target ever suggested.
pub const MIN_DAILY_CALORIES: f64 = 1200.0;
/// Multiplier from basal rate to daily expenditure for light activity.
const ACTIVITY_FACTOR: f64 = 1.3;
/// Share of the daily target cut for overweight and obese users.
const WEIGHT_LOSS_REDUCTION: f64 = 0.10;

const CARBS_SHARE: f64 = 0.45;
const PROTEIN_SHARE: f64 = 0.20;
const FAT_SHARE: f64 = 0.35;

//=========================================================================================
// Body Metrics
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    /// Uses the adult cut-offs of 18.5, 24 and 28.
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 24.0 {
            Self::Normal
        } else if bmi < 28.0 {
            Self::Overweight
        } else {
            Self::Obese
        }
    }
}

pub fn bmi(height_cm: f64, weight_kg: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

/// Mifflin–St Jeor basal metabolic rate in kcal/day.
pub fn basal_metabolic_rate(profile: &UserProfile) -> f64 {
    let base = 10.0 * profile.weight_kg + 6.25 * profile.height_cm - 5.0 * f64::from(profile.age);
    match profile.gender {
        Gender::Male => base + 5.0,
        Gender::Female => base - 161.0,
    }
}

pub fn daily_calorie_target(profile: &UserProfile) -> f64 {
    let mut target = basal_metabolic_rate(profile) * ACTIVITY_FACTOR;
    let category = BmiCategory::from_bmi(bmi(profile.height_cm, profile.weight_kg));
    // Pregnancy is never a time to cut calories.
    let may_reduce = profile.diabetes_type != DiabetesType::Gestational;
    if may_reduce && matches!(category, BmiCategory::Overweight | BmiCategory::Obese) {
        target *= 1.0 - WEIGHT_LOSS_REDUCTION;
    }
    target.max(MIN_DAILY_CALORIES).round()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MacroTargets {
    pub carbs_g: f64,
    pub protein_g: f64,
    pub fat_g: f64,
}

/// Splits a calorie budget into grams at 4/4/9 kcal per gram.
pub fn macro_targets(calories: f64) -> MacroTargets {
    MacroTargets {
        carbs_g: (calories * CARBS_SHARE / 4.0).round(),
        protein_g: (calories * PROTEIN_SHARE / 4.0).round(),
        fat_g: (calories * FAT_SHARE / 9.0).round(),
    }
}

//=========================================================================================
// Glucose Status
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum GlucoseStatus {
    Low,
    Normal,
    Elevated,
    High,
}

/// Classifies a fasting reading in mmol/L.
pub fn classify_fasting_glucose(mmol_per_l: f64) -> GlucoseStatus {
    if mmol_per_l < 3.9 {
        GlucoseStatus::Low
    } else if mmol_per_l <= 6.1 {
        GlucoseStatus::Normal
    } else if mmol_per_l < 7.0 {
        GlucoseStatus::Elevated
    } else {
        GlucoseStatus::High
    }
}

//=========================================================================================
// Profile Summary
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct HealthMetrics {
    pub bmi: f64,
    pub bmi_category: BmiCategory,
    pub basal_metabolic_rate: f64,
    pub daily_calorie_target: f64,
    pub macro_targets: MacroTargets,
    /// Absent when no usable fasting reading was entered.
    pub glucose_status: Option<GlucoseStatus>,
}

impl HealthMetrics {
    pub fn for_profile(profile: &UserProfile) -> Self {
        let bmi = bmi(profile.height_cm, profile.weight_kg);
        let daily_calorie_target = daily_calorie_target(profile);
        let glucose_status = profile
            .fasting_glucose_mmol()
            .ok()
            .flatten()
            .map(classify_fasting_glucose);
        Self {
            bmi: (bmi * 10.0).round() / 10.0,
            bmi_category: BmiCategory::from_bmi(bmi),
            basal_metabolic_rate: basal_metabolic_rate(profile).round(),
            daily_calorie_target,
            macro_targets: macro_targets(daily_calorie_target),
            glucose_status,
        }
    }
}

//=========================================================================================
// Plan Nutrition
//=========================================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PlanNutrition {
    pub recipe_count: usize,
    pub calories: f64,
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
    pub low_gi: usize,
    pub medium_gi: usize,
    pub high_gi: usize,
    pub calories_by_meal_type: BTreeMap<String, f64>,
}

impl PlanNutrition {
    pub fn for_plan(plan: &[Recipe]) -> Self {
        plan.iter().fold(Self::default(), |mut totals, recipe| {
            let n = &recipe.nutrition;
            totals.recipe_count += 1;
            totals.calories += n.calories;
            totals.carbs += n.carbs;
            totals.protein += n.protein;
            totals.fat += n.fat;
            match n.gi_level {
                GiLevel::Low => totals.low_gi += 1,
                GiLevel::Medium => totals.medium_gi += 1,
                GiLevel::High => totals.high_gi += 1,
            }
            *totals
                .calories_by_meal_type
                .entry(meal_type_label(recipe.meal_type).to_string())
                .or_default() += n.calories;
            totals
        })
    }
}

fn meal_type_label(meal_type: MealType) -> &'static str {
    match meal_type {
        MealType::Breakfast => "Breakfast",
        MealType::Lunch => "Lunch",
        MealType::Dinner => "Dinner",
        MealType::Snack => "Snack",
    }
}
