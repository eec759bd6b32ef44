use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::engine::{
    ActivityLevel, BodyMetrics, CalculatedTargets, DietGoal, GoalRefinements, Sex,
};
use super::macros::CustomOverride;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("missing required field: {0}")]
    MissingRequiredInput(&'static str),
    #[error("invalid value for field: {0}")]
    InvalidField(&'static str),
}

/// Raw planner form as submitted. Every field is optional; the single
/// normalization point below turns this into the strict engine input.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawPlannerForm {
    pub age: Option<i32>,
    pub sex: Option<Sex>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub diet_goal: Option<DietGoal>,
    pub target_weight_1m_kg: Option<f64>,
    pub goal_weight_kg: Option<f64>,
    pub body_fat_current_pct: Option<f64>,
    pub body_fat_target_pct: Option<f64>,
    pub body_fat_ideal_pct: Option<f64>,
    pub waist_current_cm: Option<f64>,
    pub waist_target_cm: Option<f64>,
    pub custom_total_calories: Option<f64>,
    pub custom_protein_per_kg: Option<f64>,
    pub custom_carb_pct: Option<f64>,
}

impl RawPlannerForm {
    /// Field-wise merge where present fields in `update` win.
    pub fn merged_with(&self, update: &RawPlannerForm) -> RawPlannerForm {
        RawPlannerForm {
            age: update.age.or(self.age),
            sex: update.sex.or(self.sex),
            height_cm: update.height_cm.or(self.height_cm),
            weight_kg: update.weight_kg.or(self.weight_kg),
            activity_level: update.activity_level.or(self.activity_level),
            diet_goal: update.diet_goal.or(self.diet_goal),
            target_weight_1m_kg: update.target_weight_1m_kg.or(self.target_weight_1m_kg),
            goal_weight_kg: update.goal_weight_kg.or(self.goal_weight_kg),
            body_fat_current_pct: update.body_fat_current_pct.or(self.body_fat_current_pct),
            body_fat_target_pct: update.body_fat_target_pct.or(self.body_fat_target_pct),
            body_fat_ideal_pct: update.body_fat_ideal_pct.or(self.body_fat_ideal_pct),
            waist_current_cm: update.waist_current_cm.or(self.waist_current_cm),
            waist_target_cm: update.waist_target_cm.or(self.waist_target_cm),
            custom_total_calories: update.custom_total_calories.or(self.custom_total_calories),
            custom_protein_per_kg: update.custom_protein_per_kg.or(self.custom_protein_per_kg),
            custom_carb_pct: update.custom_carb_pct.or(self.custom_carb_pct),
        }
    }
}

/// Strict engine input; no field here is optional unless the engine treats it
/// as an optional refinement.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerInput {
    pub metrics: BodyMetrics,
    pub activity: ActivityLevel,
    pub goal: DietGoal,
    pub target_weight_1m_kg: f64,
    pub goal_weight_kg: Option<f64>,
    pub refinements: GoalRefinements,
    pub custom: Option<CustomOverride>,
}

/// The one place raw optional form values become a strict record.
/// Any missing required field skips calculation entirely.
pub fn normalize(raw: &RawPlannerForm) -> Result<PlannerInput, InputError> {
    let age = raw
        .age
        .ok_or(InputError::MissingRequiredInput("age"))?;
    let age = u32::try_from(age).map_err(|_| InputError::InvalidField("age"))?;
    let sex = raw.sex.ok_or(InputError::MissingRequiredInput("sex"))?;
    let height_cm = raw
        .height_cm
        .ok_or(InputError::MissingRequiredInput("height_cm"))?;
    let weight_kg = raw
        .weight_kg
        .ok_or(InputError::MissingRequiredInput("weight_kg"))?;
    let activity = raw
        .activity_level
        .ok_or(InputError::MissingRequiredInput("activity_level"))?;
    let goal = raw
        .diet_goal
        .ok_or(InputError::MissingRequiredInput("diet_goal"))?;
    let target_weight_1m_kg = raw
        .target_weight_1m_kg
        .ok_or(InputError::MissingRequiredInput("target_weight_1m_kg"))?;

    let custom = CustomOverride {
        total_calories: raw.custom_total_calories,
        protein_per_kg: raw.custom_protein_per_kg,
        carb_pct: raw.custom_carb_pct,
    };

    Ok(PlannerInput {
        metrics: BodyMetrics {
            age,
            sex,
            height_cm,
            weight_kg,
        },
        activity,
        goal,
        target_weight_1m_kg,
        goal_weight_kg: raw.goal_weight_kg,
        refinements: GoalRefinements {
            body_fat_current_pct: raw.body_fat_current_pct,
            body_fat_target_pct: raw.body_fat_target_pct,
            waist_current_cm: raw.waist_current_cm,
            waist_target_cm: raw.waist_target_cm,
        },
        custom: (!custom.is_empty()).then_some(custom),
    })
}

/// Where the currently displayed targets came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSource {
    ManualMacros,
    SmartPlanner,
    ProfileEstimate,
}

/// Prioritized resolution over the tagged target sources. A manual macro
/// override beats the smart-planner result, which beats a bare profile
/// estimate; the winner is reported for traceability.
pub fn resolve_targets(
    manual: Option<CalculatedTargets>,
    smart: Option<CalculatedTargets>,
    estimate: Option<CalculatedTargets>,
) -> Option<(ProfileSource, CalculatedTargets)> {
    if let Some(targets) = manual {
        return Some((ProfileSource::ManualMacros, targets));
    }
    if let Some(targets) = smart {
        return Some((ProfileSource::SmartPlanner, targets));
    }
    estimate.map(|targets| (ProfileSource::ProfileEstimate, targets))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_form() -> RawPlannerForm {
        RawPlannerForm {
            age: Some(30),
            sex: Some(Sex::Male),
            height_cm: Some(180.0),
            weight_kg: Some(80.0),
            activity_level: Some(ActivityLevel::Moderate),
            diet_goal: Some(DietGoal::FatLoss),
            target_weight_1m_kg: Some(78.0),
            ..Default::default()
        }
    }

    #[test]
    fn normalize_accepts_complete_form() {
        let input = normalize(&full_form()).unwrap();
        assert_eq!(input.metrics.age, 30);
        assert_eq!(input.goal, DietGoal::FatLoss);
        assert!(input.custom.is_none());
    }

    #[test]
    fn normalize_names_the_missing_field() {
        let mut form = full_form();
        form.activity_level = None;
        assert_eq!(
            normalize(&form),
            Err(InputError::MissingRequiredInput("activity_level"))
        );

        let mut form = full_form();
        form.target_weight_1m_kg = None;
        assert_eq!(
            normalize(&form),
            Err(InputError::MissingRequiredInput("target_weight_1m_kg"))
        );
    }

    #[test]
    fn normalize_rejects_negative_age() {
        let mut form = full_form();
        form.age = Some(-1);
        assert_eq!(normalize(&form), Err(InputError::InvalidField("age")));
    }

    #[test]
    fn normalize_builds_custom_override_only_when_any_field_present() {
        let mut form = full_form();
        form.custom_carb_pct = Some(60.0);
        let input = normalize(&form).unwrap();
        let custom = input.custom.unwrap();
        assert_eq!(custom.carb_pct, Some(60.0));
        assert_eq!(custom.total_calories, None);
    }

    #[test]
    fn merge_prefers_update_fields() {
        let base = full_form();
        let update = RawPlannerForm {
            weight_kg: Some(79.0),
            custom_total_calories: Some(1900.0),
            ..Default::default()
        };
        let merged = base.merged_with(&update);
        assert_eq!(merged.weight_kg, Some(79.0));
        assert_eq!(merged.age, Some(30));
        assert_eq!(merged.custom_total_calories, Some(1900.0));
    }

    #[test]
    fn resolution_priority_and_winner() {
        let targets = |calories: i32| CalculatedTargets {
            bmr: 1600.0,
            tdee: 2000.0,
            target_calories: calories,
            protein_g: 0.0,
            protein_pct: 0.0,
            carbs_g: 0.0,
            carbs_pct: 0.0,
            fat_g: 0.0,
            fat_pct: 0.0,
            weekly_change_kg: 0.0,
        };

        let (source, t) = resolve_targets(
            Some(targets(1800)),
            Some(targets(2000)),
            Some(targets(2200)),
        )
        .unwrap();
        assert_eq!(source, ProfileSource::ManualMacros);
        assert_eq!(t.target_calories, 1800);

        let (source, _) = resolve_targets(None, Some(targets(2000)), Some(targets(2200))).unwrap();
        assert_eq!(source, ProfileSource::SmartPlanner);

        let (source, _) = resolve_targets(None, None, Some(targets(2200))).unwrap();
        assert_eq!(source, ProfileSource::ProfileEstimate);

        assert!(resolve_targets(None, None, None).is_none());
    }
}
