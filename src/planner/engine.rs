use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Energy equivalent of one kilogram of body mass.
pub const KCAL_PER_KG: f64 = 7700.0;
pub const PROTEIN_KCAL_PER_G: f64 = 4.0;
pub const CARBS_KCAL_PER_G: f64 = 4.0;
pub const FAT_KCAL_PER_G: f64 = 9.0;

/// A one-month waist-circumference change above this is flagged as unrealistic.
const WAIST_CHANGE_REALISTIC_CM: f64 = 5.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}

/// Biological sex for the Mifflin-St Jeor offset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

/// Activity level mapped to a fixed TDEE multiplier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    pub fn multiplier(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }
}

/// Diet goal driving the calorie-adjustment branch and the default macro split.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DietGoal {
    FatLoss,
    MuscleGain,
    Recomp,
}

impl Sex {
    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

impl FromStr for Sex {
    type Err = EngineError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Sex::Male),
            "female" => Ok(Sex::Female),
            _ => Err(EngineError::InvalidInput("unknown sex")),
        }
    }
}

impl ActivityLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Light => "light",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Active => "active",
            ActivityLevel::VeryActive => "very_active",
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = EngineError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "light" => Ok(ActivityLevel::Light),
            "moderate" => Ok(ActivityLevel::Moderate),
            "active" => Ok(ActivityLevel::Active),
            "very_active" => Ok(ActivityLevel::VeryActive),
            _ => Err(EngineError::InvalidInput("unknown activity level")),
        }
    }
}

impl DietGoal {
    pub fn as_str(self) -> &'static str {
        match self {
            DietGoal::FatLoss => "fat_loss",
            DietGoal::MuscleGain => "muscle_gain",
            DietGoal::Recomp => "recomp",
        }
    }
}

impl FromStr for DietGoal {
    type Err = EngineError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fat_loss" => Ok(DietGoal::FatLoss),
            "muscle_gain" => Ok(DietGoal::MuscleGain),
            "recomp" => Ok(DietGoal::Recomp),
            _ => Err(EngineError::InvalidInput("unknown diet goal")),
        }
    }
}

/// Immutable body metrics feeding the BMR formula.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BodyMetrics {
    pub age: u32,
    pub sex: Sex,
    pub height_cm: f64,
    pub weight_kg: f64,
}

/// Optional secondary goals refining the calorie target.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct GoalRefinements {
    pub body_fat_current_pct: Option<f64>,
    pub body_fat_target_pct: Option<f64>,
    pub waist_current_cm: Option<f64>,
    pub waist_target_cm: Option<f64>,
}

/// Display-only guidance derived from a waist-circumference goal.
///
/// Never folded into the persisted target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WaistAdvisory {
    pub waist_change_cm: f64,
    pub est_fat_loss_pct: f64,
    pub alternative_calories: i32,
    pub unrealistic: bool,
}

/// The engine's output record, fully recomputed on every submit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalculatedTargets {
    pub bmr: f64,
    pub tdee: f64,
    pub target_calories: i32,
    pub protein_g: f64,
    pub protein_pct: f64,
    pub carbs_g: f64,
    pub carbs_pct: f64,
    pub fat_g: f64,
    pub fat_pct: f64,
    pub weekly_change_kg: f64,
}

/// Mifflin-St Jeor basal metabolic rate.
///
/// male:   10w + 6.25h - 5a + 5
/// female: 10w + 6.25h - 5a - 161
pub fn calculate_bmr(
    sex: Sex,
    weight_kg: f64,
    height_cm: f64,
    age: u32,
) -> Result<f64, EngineError> {
    if weight_kg <= 0.0 {
        return Err(EngineError::InvalidInput("weight must be positive"));
    }
    if height_cm <= 0.0 {
        return Err(EngineError::InvalidInput("height must be positive"));
    }
    if age == 0 {
        return Err(EngineError::InvalidInput("age must be positive"));
    }

    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age);
    Ok(match sex {
        Sex::Male => base + 5.0,
        Sex::Female => base - 161.0,
    })
}

/// Total daily energy expenditure. The enum makes an unknown activity level
/// unrepresentable, so this cannot fail.
pub fn calculate_tdee(bmr: f64, activity: ActivityLevel) -> f64 {
    bmr * activity.multiplier()
}

/// Estimated weekly weight change for a daily calorie target.
/// Negative denotes loss.
pub fn weekly_weight_change_kg(tdee: f64, target_calories: f64) -> f64 {
    (target_calories - tdee) * 7.0 / KCAL_PER_KG
}

/// Goal-adjusted daily calorie target.
///
/// Baseline deficit/surplus comes from the one-month weight delta, then the
/// goal branch clamps it, then a loss-direction body-fat goal (if given)
/// blends in an alternative target. The final floor is bmr + 100.
pub fn adjust_calorie_target(
    tdee: f64,
    bmr: f64,
    weight_kg: f64,
    target_weight_1m_kg: f64,
    goal: DietGoal,
    refinements: &GoalRefinements,
) -> i32 {
    let weight_delta_kg = weight_kg - target_weight_1m_kg;
    let calorie_adjustment = KCAL_PER_KG * weight_delta_kg / 30.0;
    let mut target = tdee - calorie_adjustment;

    target = match goal {
        DietGoal::FatLoss => target
            .min(tdee - 200.0)
            .max(bmr + 200.0)
            .max(1200.0),
        DietGoal::MuscleGain => target.max(tdee + 150.0),
        DietGoal::Recomp => target
            .clamp(tdee - 300.0, tdee + 100.0)
            .max(bmr + 100.0)
            .max(1400.0),
    };

    // Body-fat refinement fires only in the loss direction; a gain-direction
    // body-fat goal is ignored here.
    if let (Some(current), Some(wanted)) = (
        refinements.body_fat_current_pct,
        refinements.body_fat_target_pct,
    ) {
        if current > wanted {
            let fat_mass_to_lose_kg = weight_kg * (current - wanted) / 100.0;
            let alternative = tdee - KCAL_PER_KG * fat_mass_to_lose_kg / 30.0;
            target = (target + alternative) / 2.0;
        }
    }

    target.round().max((bmr + 100.0).round()) as i32
}

/// Waist-goal guidance. Informational: the returned alternative target is for
/// display and never alters the stored plan.
pub fn waist_advisory(
    tdee: f64,
    weight_kg: f64,
    refinements: &GoalRefinements,
) -> Option<WaistAdvisory> {
    let (current, wanted) = match (refinements.waist_current_cm, refinements.waist_target_cm) {
        (Some(c), Some(w)) if c > w => (c, w),
        _ => return None,
    };

    let waist_change_cm = current - wanted;
    let est_fat_loss_pct = waist_change_cm * 0.5;
    let fat_mass_kg = weight_kg * est_fat_loss_pct / 100.0;
    let alternative = tdee - KCAL_PER_KG * fat_mass_kg / 30.0;

    Some(WaistAdvisory {
        waist_change_cm,
        est_fat_loss_pct,
        alternative_calories: alternative.round() as i32,
        unrealistic: waist_change_cm > WAIST_CHANGE_REALISTIC_CM,
    })
}
