use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Shape-validated meal plan as returned by the LLM. Only the structure is
/// checked; the content is the model's.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedMealPlan {
    pub days: Vec<DayPlan>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayPlan {
    pub day: String,
    pub meals: Vec<PlannedMeal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannedMeal {
    pub name: String,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

#[derive(Debug, Serialize)]
pub struct MealPlanResponse {
    pub plan: GeneratedMealPlan,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}
