use std::str::FromStr;

use anyhow::Context;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use super::engine::CalculatedTargets;
use super::input::RawPlannerForm;
use super::meals::MealSlot;
use super::PlanBundle;

#[derive(Debug, Clone, FromRow)]
struct ProfileRow {
    age: Option<i32>,
    sex: Option<String>,
    height_cm: Option<f64>,
    weight_kg: Option<f64>,
    activity_level: Option<String>,
    diet_goal: Option<String>,
    target_weight_1m_kg: Option<f64>,
    goal_weight_kg: Option<f64>,
    body_fat_current_pct: Option<f64>,
    body_fat_target_pct: Option<f64>,
    body_fat_ideal_pct: Option<f64>,
    waist_current_cm: Option<f64>,
    waist_target_cm: Option<f64>,
    custom_total_calories: Option<f64>,
    custom_protein_per_kg: Option<f64>,
    custom_carb_pct: Option<f64>,
}

fn parse_enum<T: FromStr>(value: Option<String>, field: &'static str) -> Option<T> {
    let s = value?;
    match s.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(field, value = %s, "unparseable enum value in profile row");
            None
        }
    }
}

impl From<ProfileRow> for RawPlannerForm {
    fn from(row: ProfileRow) -> Self {
        RawPlannerForm {
            age: row.age,
            sex: parse_enum(row.sex, "sex"),
            height_cm: row.height_cm,
            weight_kg: row.weight_kg,
            activity_level: parse_enum(row.activity_level, "activity_level"),
            diet_goal: parse_enum(row.diet_goal, "diet_goal"),
            target_weight_1m_kg: row.target_weight_1m_kg,
            goal_weight_kg: row.goal_weight_kg,
            body_fat_current_pct: row.body_fat_current_pct,
            body_fat_target_pct: row.body_fat_target_pct,
            body_fat_ideal_pct: row.body_fat_ideal_pct,
            waist_current_cm: row.waist_current_cm,
            waist_target_cm: row.waist_target_cm,
            custom_total_calories: row.custom_total_calories,
            custom_protein_per_kg: row.custom_protein_per_kg,
            custom_carb_pct: row.custom_carb_pct,
        }
    }
}

/// Whole-record replacement of the raw-inputs profile.
pub async fn upsert_profile(
    db: &PgPool,
    user_id: Uuid,
    form: &RawPlannerForm,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO profiles (
            user_id, age, sex, height_cm, weight_kg, activity_level, diet_goal,
            target_weight_1m_kg, goal_weight_kg,
            body_fat_current_pct, body_fat_target_pct, body_fat_ideal_pct,
            waist_current_cm, waist_target_cm,
            custom_total_calories, custom_protein_per_kg, custom_carb_pct
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        ON CONFLICT (user_id) DO UPDATE SET
            age = EXCLUDED.age,
            sex = EXCLUDED.sex,
            height_cm = EXCLUDED.height_cm,
            weight_kg = EXCLUDED.weight_kg,
            activity_level = EXCLUDED.activity_level,
            diet_goal = EXCLUDED.diet_goal,
            target_weight_1m_kg = EXCLUDED.target_weight_1m_kg,
            goal_weight_kg = EXCLUDED.goal_weight_kg,
            body_fat_current_pct = EXCLUDED.body_fat_current_pct,
            body_fat_target_pct = EXCLUDED.body_fat_target_pct,
            body_fat_ideal_pct = EXCLUDED.body_fat_ideal_pct,
            waist_current_cm = EXCLUDED.waist_current_cm,
            waist_target_cm = EXCLUDED.waist_target_cm,
            custom_total_calories = EXCLUDED.custom_total_calories,
            custom_protein_per_kg = EXCLUDED.custom_protein_per_kg,
            custom_carb_pct = EXCLUDED.custom_carb_pct,
            updated_at = now()
        "#,
    )
    .bind(user_id)
    .bind(form.age)
    .bind(form.sex.map(|v| v.as_str()))
    .bind(form.height_cm)
    .bind(form.weight_kg)
    .bind(form.activity_level.map(|v| v.as_str()))
    .bind(form.diet_goal.map(|v| v.as_str()))
    .bind(form.target_weight_1m_kg)
    .bind(form.goal_weight_kg)
    .bind(form.body_fat_current_pct)
    .bind(form.body_fat_target_pct)
    .bind(form.body_fat_ideal_pct)
    .bind(form.waist_current_cm)
    .bind(form.waist_target_cm)
    .bind(form.custom_total_calories)
    .bind(form.custom_protein_per_kg)
    .bind(form.custom_carb_pct)
    .execute(db)
    .await
    .context("upsert profile")?;
    Ok(())
}

pub async fn get_profile(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<RawPlannerForm>> {
    let row = sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT age, sex, height_cm, weight_kg, activity_level, diet_goal,
               target_weight_1m_kg, goal_weight_kg,
               body_fat_current_pct, body_fat_target_pct, body_fat_ideal_pct,
               waist_current_cm, waist_target_cm,
               custom_total_calories, custom_protein_per_kg, custom_carb_pct
        FROM profiles
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("get profile")?;
    Ok(row.map(RawPlannerForm::from))
}

#[derive(Debug, Clone, FromRow)]
struct PlanRow {
    bmr: f64,
    tdee: f64,
    target_calories: i32,
    protein_g: f64,
    protein_pct: f64,
    carbs_g: f64,
    carbs_pct: f64,
    fat_g: f64,
    fat_pct: f64,
    weekly_change_kg: f64,
    custom_target_calories: Option<i32>,
    custom_protein_g: Option<f64>,
    custom_protein_pct: Option<f64>,
    custom_carbs_g: Option<f64>,
    custom_carbs_pct: Option<f64>,
    custom_fat_g: Option<f64>,
    custom_fat_pct: Option<f64>,
    custom_weekly_change_kg: Option<f64>,
    meal_slots: Json<Vec<MealSlot>>,
    updated_at: OffsetDateTime,
}

/// The persisted plan record, reassembled into engine types.
#[derive(Debug, Clone)]
pub struct StoredPlan {
    pub default_plan: CalculatedTargets,
    pub custom_plan: Option<CalculatedTargets>,
    pub meal_slots: Vec<MealSlot>,
    pub updated_at: OffsetDateTime,
}

impl From<PlanRow> for StoredPlan {
    fn from(row: PlanRow) -> Self {
        let custom_plan = row.custom_target_calories.map(|calories| CalculatedTargets {
            bmr: row.bmr,
            tdee: row.tdee,
            target_calories: calories,
            protein_g: row.custom_protein_g.unwrap_or_default(),
            protein_pct: row.custom_protein_pct.unwrap_or_default(),
            carbs_g: row.custom_carbs_g.unwrap_or_default(),
            carbs_pct: row.custom_carbs_pct.unwrap_or_default(),
            fat_g: row.custom_fat_g.unwrap_or_default(),
            fat_pct: row.custom_fat_pct.unwrap_or_default(),
            weekly_change_kg: row.custom_weekly_change_kg.unwrap_or_default(),
        });
        StoredPlan {
            default_plan: CalculatedTargets {
                bmr: row.bmr,
                tdee: row.tdee,
                target_calories: row.target_calories,
                protein_g: row.protein_g,
                protein_pct: row.protein_pct,
                carbs_g: row.carbs_g,
                carbs_pct: row.carbs_pct,
                fat_g: row.fat_g,
                fat_pct: row.fat_pct,
                weekly_change_kg: row.weekly_change_kg,
            },
            custom_plan,
            meal_slots: row.meal_slots.0,
            updated_at: row.updated_at,
        }
    }
}

/// Whole-record replacement of the computed plan. Meal slots are a separate
/// concern and survive the replacement.
pub async fn upsert_plan(db: &PgPool, user_id: Uuid, bundle: &PlanBundle) -> anyhow::Result<()> {
    let d = &bundle.default_plan;
    let c = bundle.custom_plan.as_ref();
    sqlx::query(
        r#"
        INSERT INTO plans (
            user_id, bmr, tdee, target_calories,
            protein_g, protein_pct, carbs_g, carbs_pct, fat_g, fat_pct,
            weekly_change_kg,
            custom_target_calories, custom_protein_g, custom_protein_pct,
            custom_carbs_g, custom_carbs_pct, custom_fat_g, custom_fat_pct,
            custom_weekly_change_kg
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
        ON CONFLICT (user_id) DO UPDATE SET
            bmr = EXCLUDED.bmr,
            tdee = EXCLUDED.tdee,
            target_calories = EXCLUDED.target_calories,
            protein_g = EXCLUDED.protein_g,
            protein_pct = EXCLUDED.protein_pct,
            carbs_g = EXCLUDED.carbs_g,
            carbs_pct = EXCLUDED.carbs_pct,
            fat_g = EXCLUDED.fat_g,
            fat_pct = EXCLUDED.fat_pct,
            weekly_change_kg = EXCLUDED.weekly_change_kg,
            custom_target_calories = EXCLUDED.custom_target_calories,
            custom_protein_g = EXCLUDED.custom_protein_g,
            custom_protein_pct = EXCLUDED.custom_protein_pct,
            custom_carbs_g = EXCLUDED.custom_carbs_g,
            custom_carbs_pct = EXCLUDED.custom_carbs_pct,
            custom_fat_g = EXCLUDED.custom_fat_g,
            custom_fat_pct = EXCLUDED.custom_fat_pct,
            custom_weekly_change_kg = EXCLUDED.custom_weekly_change_kg,
            updated_at = now()
        "#,
    )
    .bind(user_id)
    .bind(d.bmr)
    .bind(d.tdee)
    .bind(d.target_calories)
    .bind(d.protein_g)
    .bind(d.protein_pct)
    .bind(d.carbs_g)
    .bind(d.carbs_pct)
    .bind(d.fat_g)
    .bind(d.fat_pct)
    .bind(d.weekly_change_kg)
    .bind(c.map(|p| p.target_calories))
    .bind(c.map(|p| p.protein_g))
    .bind(c.map(|p| p.protein_pct))
    .bind(c.map(|p| p.carbs_g))
    .bind(c.map(|p| p.carbs_pct))
    .bind(c.map(|p| p.fat_g))
    .bind(c.map(|p| p.fat_pct))
    .bind(c.map(|p| p.weekly_change_kg))
    .execute(db)
    .await
    .context("upsert plan")?;
    Ok(())
}

pub async fn get_plan(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<StoredPlan>> {
    let row = sqlx::query_as::<_, PlanRow>(
        r#"
        SELECT bmr, tdee, target_calories,
               protein_g, protein_pct, carbs_g, carbs_pct, fat_g, fat_pct,
               weekly_change_kg,
               custom_target_calories, custom_protein_g, custom_protein_pct,
               custom_carbs_g, custom_carbs_pct, custom_fat_g, custom_fat_pct,
               custom_weekly_change_kg,
               meal_slots, updated_at
        FROM plans
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("get plan")?;
    Ok(row.map(StoredPlan::from))
}

/// Replace only the meal-distribution slots. Returns false when no plan
/// record exists yet.
pub async fn update_meal_slots(
    db: &PgPool,
    user_id: Uuid,
    slots: &[MealSlot],
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"UPDATE plans SET meal_slots = $2, updated_at = now() WHERE user_id = $1"#,
    )
    .bind(user_id)
    .bind(Json(slots))
    .execute(db)
    .await
    .context("update meal slots")?;
    Ok(result.rows_affected() > 0)
}
