use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::engine::CalculatedTargets;

/// Column-sum check tolerance for meal percentages.
pub const MEAL_PCT_TOLERANCE: f64 = 0.01;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MealSlotError {
    #[error("meal name must not be empty")]
    EmptyName,
    #[error("duplicate meal name: {0}")]
    DuplicateName(String),
    #[error("calories percentage out of range for meal: {0}")]
    PctOutOfRange(String),
}

/// One named meal with its share of the daily calories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MealSlot {
    pub name: String,
    pub calories_pct: f64,
}

/// Daily totals the distribution spreads; sourced from either the default or
/// the custom plan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DailyTotals {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl From<&CalculatedTargets> for DailyTotals {
    fn from(t: &CalculatedTargets) -> Self {
        Self {
            calories: f64::from(t.target_calories),
            protein_g: t.protein_g,
            carbs_g: t.carbs_g,
            fat_g: t.fat_g,
        }
    }
}

/// A meal's absolute share. One percentage drives all four quantities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MealRow {
    pub name: String,
    pub calories_pct: f64,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MealBreakdown {
    pub rows: Vec<MealRow>,
    pub pct_sum: f64,
    /// False flags the distribution; it never blocks saving.
    pub sums_to_100: bool,
}

/// Structural validation: names unique and non-empty, percentages in range.
/// The column-sum invariant is deliberately not enforced here; see
/// [`distribute`], which flags it instead.
pub fn validate_slots(slots: &[MealSlot]) -> Result<(), MealSlotError> {
    let mut seen = Vec::with_capacity(slots.len());
    for slot in slots {
        let name = slot.name.trim();
        if name.is_empty() {
            return Err(MealSlotError::EmptyName);
        }
        if seen.contains(&name) {
            return Err(MealSlotError::DuplicateName(name.to_string()));
        }
        seen.push(name);
        if !(0.0..=100.0).contains(&slot.calories_pct) {
            return Err(MealSlotError::PctOutOfRange(name.to_string()));
        }
    }
    Ok(())
}

/// Spread daily totals across the slots by their calorie percentage.
pub fn distribute(totals: DailyTotals, slots: &[MealSlot]) -> MealBreakdown {
    let rows = slots
        .iter()
        .map(|slot| {
            let share = slot.calories_pct / 100.0;
            MealRow {
                name: slot.name.clone(),
                calories_pct: slot.calories_pct,
                calories: totals.calories * share,
                protein_g: totals.protein_g * share,
                carbs_g: totals.carbs_g * share,
                fat_g: totals.fat_g * share,
            }
        })
        .collect();

    let pct_sum: f64 = slots.iter().map(|s| s.calories_pct).sum();
    MealBreakdown {
        rows,
        pct_sum,
        sums_to_100: (pct_sum - 100.0).abs() <= MEAL_PCT_TOLERANCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(pcts: &[(&str, f64)]) -> Vec<MealSlot> {
        pcts.iter()
            .map(|(name, pct)| MealSlot {
                name: (*name).to_string(),
                calories_pct: *pct,
            })
            .collect()
    }

    fn totals() -> DailyTotals {
        DailyTotals {
            calories: 2000.0,
            protein_g: 150.0,
            carbs_g: 200.0,
            fat_g: 60.0,
        }
    }

    #[test]
    fn exact_sum_reproduces_daily_totals() {
        let slots = slots(&[
            ("Breakfast", 25.0),
            ("Lunch", 35.0),
            ("Dinner", 30.0),
            ("Snack", 10.0),
        ]);
        let breakdown = distribute(totals(), &slots);
        assert!(breakdown.sums_to_100);

        let calorie_sum: f64 = breakdown.rows.iter().map(|r| r.calories).sum();
        let protein_sum: f64 = breakdown.rows.iter().map(|r| r.protein_g).sum();
        assert!((calorie_sum - 2000.0).abs() < 1e-9);
        assert!((protein_sum - 150.0).abs() < 1e-9);
    }

    #[test]
    fn one_percentage_drives_all_quantities() {
        let slots = slots(&[("Lunch", 40.0), ("Dinner", 60.0)]);
        let breakdown = distribute(totals(), &slots);
        let lunch = &breakdown.rows[0];
        assert!((lunch.calories - 800.0).abs() < 1e-9);
        assert!((lunch.protein_g - 60.0).abs() < 1e-9);
        assert!((lunch.carbs_g - 80.0).abs() < 1e-9);
        assert!((lunch.fat_g - 24.0).abs() < 1e-9);
    }

    #[test]
    fn off_sum_is_flagged_not_rejected() {
        let slots = slots(&[("Breakfast", 30.0), ("Dinner", 60.0)]);
        let breakdown = distribute(totals(), &slots);
        assert!(!breakdown.sums_to_100);
        assert!((breakdown.pct_sum - 90.0).abs() < 1e-9);
        // Rows are still produced.
        assert_eq!(breakdown.rows.len(), 2);
    }

    #[test]
    fn sum_within_tolerance_passes() {
        let slots = slots(&[("A", 33.33), ("B", 33.33), ("C", 33.34)]);
        assert!(distribute(totals(), &slots).sums_to_100);
    }

    #[test]
    fn validation_rejects_duplicates_and_bad_pcts() {
        let dup = slots(&[("Lunch", 50.0), ("Lunch", 50.0)]);
        assert_eq!(
            validate_slots(&dup),
            Err(MealSlotError::DuplicateName("Lunch".into()))
        );

        let out_of_range = slots(&[("Lunch", 120.0)]);
        assert_eq!(
            validate_slots(&out_of_range),
            Err(MealSlotError::PctOutOfRange("Lunch".into()))
        );

        let empty = slots(&[("  ", 50.0)]);
        assert_eq!(validate_slots(&empty), Err(MealSlotError::EmptyName));

        let ok = slots(&[("Breakfast", 40.0), ("Dinner", 60.0)]);
        assert!(validate_slots(&ok).is_ok());
    }
}
