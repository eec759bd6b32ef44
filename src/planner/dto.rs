use serde::{Deserialize, Serialize};

use super::engine::CalculatedTargets;
use super::input::{ProfileSource, RawPlannerForm};
use super::meals::{MealBreakdown, MealSlot};
use super::wizard::Transition;
use super::PlanBundle;

/// Body for the pure calculation endpoint; nothing is persisted.
#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    #[serde(flatten)]
    pub form: RawPlannerForm,
    #[serde(default)]
    pub meal_slots: Option<Vec<MealSlot>>,
}

#[derive(Debug, Serialize)]
pub struct CalculateResponse {
    #[serde(flatten)]
    pub plans: PlanBundle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meals: Option<MealBreakdown>,
}

/// The current plan with its resolved active targets.
#[derive(Debug, Serialize)]
pub struct PlanView {
    pub source: ProfileSource,
    pub active: CalculatedTargets,
    pub default_plan: Option<CalculatedTargets>,
    pub custom_plan: Option<CalculatedTargets>,
    pub meal_slots: Vec<MealSlot>,
    pub meals: MealBreakdown,
}

#[derive(Debug, Deserialize)]
pub struct WizardRequest {
    /// 1-based step the user is submitting from.
    pub step: u8,
    #[serde(default)]
    pub form: RawPlannerForm,
}

#[derive(Debug, Serialize)]
pub struct WizardResponse {
    #[serde(flatten)]
    pub transition: Transition,
    /// True once the completed wizard has persisted profile and plan.
    pub saved: bool,
}

#[derive(Debug, Deserialize)]
pub struct PutMealsRequest {
    pub meal_slots: Vec<MealSlot>,
}

#[derive(Debug, Serialize)]
pub struct PutMealsResponse {
    pub meals: MealBreakdown,
}
