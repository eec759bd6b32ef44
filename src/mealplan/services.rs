use anyhow::Context;

use crate::planner::engine::CalculatedTargets;
use crate::planner::meals::MealSlot;
use crate::state::AppState;

use super::dto::GeneratedMealPlan;

const PLAN_SYSTEM_PROMPT: &str = "You are a meal-planning assistant. \
Respond with JSON only, no prose, matching this shape: \
{\"days\":[{\"day\":\"Monday\",\"meals\":[{\"name\":\"...\",\"calories\":0,\"protein_g\":0,\"carbs_g\":0,\"fat_g\":0}]}]}";

/// Prompt template for a 7-day plan hitting the user's current targets.
pub fn plan_prompt(targets: &CalculatedTargets, slots: &[MealSlot]) -> String {
    let mut prompt = format!(
        "Create a 7-day meal plan. Daily targets: {} kcal, {:.0} g protein, {:.0} g carbs, {:.0} g fat.",
        targets.target_calories, targets.protein_g, targets.carbs_g, targets.fat_g
    );
    if !slots.is_empty() {
        let meals: Vec<String> = slots
            .iter()
            .map(|s| format!("{} ({:.0}% of calories)", s.name, s.calories_pct))
            .collect();
        prompt.push_str(&format!(" Use these meals each day: {}.", meals.join(", ")));
    }
    prompt
}

/// System prompt for the nutrition chat, grounded in the current targets
/// when a plan exists.
pub fn chat_prompt(targets: Option<&CalculatedTargets>) -> String {
    match targets {
        Some(t) => format!(
            "You are a nutrition assistant. The user's current daily targets are \
{} kcal, {:.0} g protein, {:.0} g carbs, {:.0} g fat. Answer briefly.",
            t.target_calories, t.protein_g, t.carbs_g, t.fat_g
        ),
        None => "You are a nutrition assistant. Answer briefly.".to_string(),
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag line and the trailing fence.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Validate the response by shape only: it must parse into the plan record
/// and contain at least one day with at least one meal.
pub fn parse_meal_plan(raw: &str) -> anyhow::Result<GeneratedMealPlan> {
    let plan: GeneratedMealPlan =
        serde_json::from_str(strip_code_fence(raw)).context("meal plan response shape")?;
    anyhow::ensure!(!plan.days.is_empty(), "meal plan has no days");
    anyhow::ensure!(
        plan.days.iter().all(|d| !d.meals.is_empty()),
        "meal plan has a day with no meals"
    );
    Ok(plan)
}

/// Ask the LLM for a plan and shape-validate the reply. No retries; a bad
/// response is surfaced once to the caller.
pub async fn request_plan(
    state: &AppState,
    targets: &CalculatedTargets,
    slots: &[MealSlot],
) -> anyhow::Result<(GeneratedMealPlan, String)> {
    let raw = state
        .ai
        .complete(PLAN_SYSTEM_PROMPT, &plan_prompt(targets, slots))
        .await?;
    let plan = parse_meal_plan(&raw)?;
    Ok((plan, raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::engine::DietGoal;
    use crate::planner::macros::{default_split, targets_from_split};

    fn targets() -> CalculatedTargets {
        targets_from_split(1600.0, 2000.0, 1800, default_split(DietGoal::FatLoss))
    }

    #[test]
    fn plan_prompt_names_targets_and_slots() {
        let slots = vec![
            MealSlot {
                name: "Breakfast".into(),
                calories_pct: 30.0,
            },
            MealSlot {
                name: "Dinner".into(),
                calories_pct: 70.0,
            },
        ];
        let prompt = plan_prompt(&targets(), &slots);
        assert!(prompt.contains("1800 kcal"));
        assert!(prompt.contains("Breakfast (30% of calories)"));

        let bare = plan_prompt(&targets(), &[]);
        assert!(!bare.contains("Use these meals"));
    }

    #[test]
    fn chat_prompt_grounds_in_targets_when_present() {
        let with = chat_prompt(Some(&targets()));
        assert!(with.contains("1800 kcal"));
        let without = chat_prompt(None);
        assert!(!without.contains("kcal,"));
    }

    #[test]
    fn parse_accepts_valid_shape() {
        let raw = r#"{"days":[{"day":"Monday","meals":[{"name":"Eggs","calories":350,"protein_g":25,"carbs_g":5,"fat_g":24}]}]}"#;
        let plan = parse_meal_plan(raw).unwrap();
        assert_eq!(plan.days.len(), 1);
        assert_eq!(plan.days[0].meals[0].name, "Eggs");
    }

    #[test]
    fn parse_strips_code_fences() {
        let raw = "```json\n{\"days\":[{\"day\":\"Mon\",\"meals\":[{\"name\":\"Eggs\",\"calories\":350,\"protein_g\":25,\"carbs_g\":5,\"fat_g\":24}]}]}\n```";
        assert!(parse_meal_plan(raw).is_ok());
    }

    #[test]
    fn parse_rejects_wrong_shape() {
        assert!(parse_meal_plan("not json").is_err());
        assert!(parse_meal_plan(r#"{"days":"tomorrow"}"#).is_err());
        // Missing macro fields fail shape validation.
        assert!(parse_meal_plan(
            r#"{"days":[{"day":"Mon","meals":[{"name":"Eggs","calories":350}]}]}"#
        )
        .is_err());
    }

    #[test]
    fn parse_rejects_empty_days_and_meals() {
        assert!(parse_meal_plan(r#"{"days":[]}"#).is_err());
        assert!(parse_meal_plan(r#"{"days":[{"day":"Mon","meals":[]}]}"#).is_err());
    }

    #[tokio::test]
    async fn request_plan_round_trips_through_ai_client() {
        let state = crate::state::AppState::fake();
        let (plan, raw) = request_plan(&state, &targets(), &[]).await.unwrap();
        assert!(!plan.days.is_empty());
        assert!(raw.contains("days"));
    }
}
