use axum::Router;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

pub mod dto;
pub mod engine;
pub mod handlers;
pub mod input;
pub mod macros;
pub mod meals;
pub mod repo;
pub mod wizard;

use self::engine::{
    adjust_calorie_target, calculate_bmr, calculate_tdee, waist_advisory, CalculatedTargets,
    EngineError, WaistAdvisory,
};
use self::input::PlannerInput;
use self::macros::{default_split, targets_from_split};

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::read_routes())
        .merge(handlers::write_routes())
}

/// Everything one calculation produces: the default plan, the optional custom
/// variant, and the display-only waist guidance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanBundle {
    pub default_plan: CalculatedTargets,
    pub custom_plan: Option<CalculatedTargets>,
    pub waist_advisory: Option<WaistAdvisory>,
}

/// Run the whole engine over a normalized input.
pub fn compute_plans(input: &PlannerInput) -> Result<PlanBundle, EngineError> {
    let bmr = calculate_bmr(
        input.metrics.sex,
        input.metrics.weight_kg,
        input.metrics.height_cm,
        input.metrics.age,
    )?;
    let tdee = calculate_tdee(bmr, input.activity);
    let target = adjust_calorie_target(
        tdee,
        bmr,
        input.metrics.weight_kg,
        input.target_weight_1m_kg,
        input.goal,
        &input.refinements,
    );

    let default_plan = targets_from_split(bmr, tdee, target, default_split(input.goal));
    let custom_plan = input
        .custom
        .as_ref()
        .map(|custom| macros::custom_plan(input.metrics.weight_kg, &default_plan, custom));
    let waist_advisory = waist_advisory(tdee, input.metrics.weight_kg, &input.refinements);

    Ok(PlanBundle {
        default_plan,
        custom_plan,
        waist_advisory,
    })
}

/// Maintenance-only estimate derived from body metrics alone; the weakest
/// target source when no saved plan exists.
pub fn estimate_from_metrics(
    metrics: &engine::BodyMetrics,
    activity: engine::ActivityLevel,
    goal: engine::DietGoal,
) -> Result<CalculatedTargets, EngineError> {
    let bmr = calculate_bmr(metrics.sex, metrics.weight_kg, metrics.height_cm, metrics.age)?;
    let tdee = calculate_tdee(bmr, activity);
    Ok(targets_from_split(
        bmr,
        tdee,
        tdee.round() as i32,
        default_split(goal),
    ))
}

#[cfg(test)]
mod tests {
    use super::engine::{ActivityLevel, BodyMetrics, DietGoal, GoalRefinements, Sex};
    use super::input::PlannerInput;
    use super::*;

    fn input() -> PlannerInput {
        PlannerInput {
            metrics: BodyMetrics {
                age: 25,
                sex: Sex::Female,
                height_cm: 165.0,
                weight_kg: 60.0,
            },
            activity: ActivityLevel::Sedentary,
            goal: DietGoal::FatLoss,
            target_weight_1m_kg: 58.0,
            goal_weight_kg: None,
            refinements: GoalRefinements::default(),
            custom: None,
        }
    }

    #[test]
    fn sedentary_fat_loss_scenario() {
        let bundle = compute_plans(&input()).unwrap();
        let plan = &bundle.default_plan;
        assert!((plan.bmr - 1345.25).abs() < 1e-9);
        assert!((plan.tdee - 1345.25 * 1.2).abs() < 1e-9);
        // The bmr + 200 floor dominates the requested 2 kg/month deficit.
        assert_eq!(plan.target_calories, 1545);
        assert_eq!((plan.protein_pct, plan.carbs_pct, plan.fat_pct), (35.0, 35.0, 30.0));
        assert!(plan.weekly_change_kg < 0.0);
        assert!(bundle.custom_plan.is_none());
        assert!(bundle.waist_advisory.is_none());
    }

    #[test]
    fn custom_override_produces_second_plan() {
        let mut input = input();
        input.custom = Some(macros::CustomOverride {
            total_calories: Some(1800.0),
            protein_per_kg: Some(2.0),
            carb_pct: Some(60.0),
        });
        let bundle = compute_plans(&input).unwrap();
        let custom = bundle.custom_plan.unwrap();
        assert_eq!(custom.target_calories, 1800);
        assert!((custom.protein_g - 120.0).abs() < 1e-9);
        // The default plan is untouched by the override.
        assert_eq!(bundle.default_plan.target_calories, 1545);
    }

    #[test]
    fn invalid_metrics_bubble_up() {
        let mut input = input();
        input.metrics.weight_kg = 0.0;
        assert!(compute_plans(&input).is_err());
    }

    #[test]
    fn estimate_is_maintenance_at_tdee() {
        let input = input();
        let estimate =
            estimate_from_metrics(&input.metrics, input.activity, input.goal).unwrap();
        assert_eq!(estimate.target_calories, (1345.25_f64 * 1.2).round() as i32);
    }
}
