use serde::{Deserialize, Serialize};

use super::engine::{
    weekly_weight_change_kg, CalculatedTargets, DietGoal, CARBS_KCAL_PER_G, FAT_KCAL_PER_G,
    PROTEIN_KCAL_PER_G,
};

/// Percentage split of daily calories across the three macros.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MacroSplit {
    pub protein_pct: f64,
    pub carbs_pct: f64,
    pub fat_pct: f64,
}

/// Fixed default split per diet goal.
pub fn default_split(goal: DietGoal) -> MacroSplit {
    match goal {
        DietGoal::FatLoss => MacroSplit {
            protein_pct: 35.0,
            carbs_pct: 35.0,
            fat_pct: 30.0,
        },
        DietGoal::MuscleGain => MacroSplit {
            protein_pct: 30.0,
            carbs_pct: 50.0,
            fat_pct: 20.0,
        },
        DietGoal::Recomp => MacroSplit {
            protein_pct: 40.0,
            carbs_pct: 35.0,
            fat_pct: 25.0,
        },
    }
}

/// User-supplied override producing a second "custom plan" alongside the
/// default one. Any subset of fields may be present.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct CustomOverride {
    pub total_calories: Option<f64>,
    pub protein_per_kg: Option<f64>,
    /// Share of the remaining (non-protein) calories that goes to carbs;
    /// fat takes the rest.
    pub carb_pct: Option<f64>,
}

impl CustomOverride {
    pub fn is_empty(&self) -> bool {
        self.total_calories.is_none() && self.protein_per_kg.is_none() && self.carb_pct.is_none()
    }
}

/// Derive grams and percentages for a calorie target from a percentage split.
pub fn targets_from_split(
    bmr: f64,
    tdee: f64,
    target_calories: i32,
    split: MacroSplit,
) -> CalculatedTargets {
    let calories = f64::from(target_calories);
    CalculatedTargets {
        bmr,
        tdee,
        target_calories,
        protein_g: calories * split.protein_pct / 100.0 / PROTEIN_KCAL_PER_G,
        protein_pct: split.protein_pct,
        carbs_g: calories * split.carbs_pct / 100.0 / CARBS_KCAL_PER_G,
        carbs_pct: split.carbs_pct,
        fat_g: calories * split.fat_pct / 100.0 / FAT_KCAL_PER_G,
        fat_pct: split.fat_pct,
        weekly_change_kg: weekly_weight_change_kg(tdee, calories),
    }
}

/// Build the custom plan next to the default one.
///
/// A custom total replaces the computed target for this branch only. Protein
/// comes from a per-kg rate (falling back to the default plan's effective
/// rate); the remaining calories are split carb/fat by the slider percentage,
/// clamped at zero when protein alone exceeds the custom total.
pub fn custom_plan(
    weight_kg: f64,
    default_plan: &CalculatedTargets,
    custom: &CustomOverride,
) -> CalculatedTargets {
    let total = custom
        .total_calories
        .unwrap_or(f64::from(default_plan.target_calories));

    let protein_per_kg = custom
        .protein_per_kg
        .unwrap_or(default_plan.protein_g / weight_kg);
    let protein_g = weight_kg * protein_per_kg;
    let protein_kcal = protein_g * PROTEIN_KCAL_PER_G;

    let remaining_kcal = (total - protein_kcal).max(0.0);
    let carb_pct_of_remaining = custom.carb_pct.unwrap_or(50.0).clamp(0.0, 100.0);
    let carbs_kcal = remaining_kcal * carb_pct_of_remaining / 100.0;
    let fat_kcal = remaining_kcal - carbs_kcal;

    let pct = |kcal: f64| if total > 0.0 { kcal / total * 100.0 } else { 0.0 };

    CalculatedTargets {
        bmr: default_plan.bmr,
        tdee: default_plan.tdee,
        target_calories: total.round() as i32,
        protein_g,
        protein_pct: pct(protein_kcal),
        carbs_g: carbs_kcal / CARBS_KCAL_PER_G,
        carbs_pct: pct(carbs_kcal),
        fat_g: fat_kcal / FAT_KCAL_PER_G,
        fat_pct: pct(fat_kcal),
        weekly_change_kg: weekly_weight_change_kg(default_plan.tdee, total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_for(goal: DietGoal, calories: i32) -> CalculatedTargets {
        targets_from_split(1600.0, 2000.0, calories, default_split(goal))
    }

    #[test]
    fn default_split_table() {
        let fat_loss = default_split(DietGoal::FatLoss);
        assert_eq!(
            (fat_loss.protein_pct, fat_loss.carbs_pct, fat_loss.fat_pct),
            (35.0, 35.0, 30.0)
        );
        let gain = default_split(DietGoal::MuscleGain);
        assert_eq!((gain.protein_pct, gain.carbs_pct, gain.fat_pct), (30.0, 50.0, 20.0));
        let recomp = default_split(DietGoal::Recomp);
        assert_eq!(
            (recomp.protein_pct, recomp.carbs_pct, recomp.fat_pct),
            (40.0, 35.0, 25.0)
        );
    }

    #[test]
    fn macro_grams_round_trip_to_calories() {
        for goal in [DietGoal::FatLoss, DietGoal::MuscleGain, DietGoal::Recomp] {
            let plan = default_for(goal, 2150);
            let kcal = plan.protein_g * 4.0 + plan.carbs_g * 4.0 + plan.fat_g * 9.0;
            assert!(
                (kcal - 2150.0).abs() < 1e-6,
                "{goal:?}: {kcal} != 2150"
            );
        }
    }

    #[test]
    fn custom_plan_worked_example() {
        // 70kg base, 1800 kcal, 2.0 g/kg protein, 60% of the remainder to carbs.
        let default_plan = default_for(DietGoal::FatLoss, 2000);
        let custom = CustomOverride {
            total_calories: Some(1800.0),
            protein_per_kg: Some(2.0),
            carb_pct: Some(60.0),
        };
        let plan = custom_plan(70.0, &default_plan, &custom);

        assert_eq!(plan.target_calories, 1800);
        assert!((plan.protein_g - 140.0).abs() < 1e-9);
        assert!((plan.carbs_g - 186.0).abs() < 1e-9);
        assert!((plan.fat_g - 496.0 / 9.0).abs() < 1e-9);
        let kcal = plan.protein_g * 4.0 + plan.carbs_g * 4.0 + plan.fat_g * 9.0;
        assert!((kcal - 1800.0).abs() < 1e-6);
    }

    #[test]
    fn custom_plan_falls_back_to_default_protein_rate() {
        let default_plan = default_for(DietGoal::Recomp, 2000);
        let custom = CustomOverride {
            total_calories: Some(2200.0),
            ..Default::default()
        };
        let plan = custom_plan(80.0, &default_plan, &custom);
        // Fallback rate keeps the default plan's absolute protein grams.
        assert!((plan.protein_g - default_plan.protein_g).abs() < 1e-9);
        // Remainder splits 50/50 by default.
        assert!((plan.carbs_pct - plan.fat_pct).abs() < 1e-9);
    }

    #[test]
    fn custom_plan_clamps_negative_remainder_to_zero() {
        let default_plan = default_for(DietGoal::FatLoss, 2000);
        let custom = CustomOverride {
            total_calories: Some(400.0),
            protein_per_kg: Some(2.0),
            carb_pct: Some(50.0),
        };
        // 70kg * 2.0 = 140g protein = 560 kcal > 400 kcal total.
        let plan = custom_plan(70.0, &default_plan, &custom);
        assert_eq!(plan.carbs_g, 0.0);
        assert_eq!(plan.fat_g, 0.0);
    }
}
