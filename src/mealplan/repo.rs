use anyhow::Context;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::GeneratedMealPlan;

#[derive(Debug, FromRow)]
struct MealPlanRow {
    plan: Json<GeneratedMealPlan>,
    updated_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct StoredMealPlan {
    pub plan: GeneratedMealPlan,
    pub updated_at: OffsetDateTime,
}

/// Whole-record replacement: one current generated plan per user, raw
/// response kept alongside the parsed one.
pub async fn upsert_meal_plan(
    db: &PgPool,
    user_id: Uuid,
    plan: &GeneratedMealPlan,
    ai_raw: &str,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO meal_plans (user_id, plan, ai_raw)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id) DO UPDATE SET
            plan = EXCLUDED.plan,
            ai_raw = EXCLUDED.ai_raw,
            updated_at = now()
        "#,
    )
    .bind(user_id)
    .bind(Json(plan))
    .bind(ai_raw)
    .execute(db)
    .await
    .context("upsert meal plan")?;
    Ok(())
}

pub async fn get_meal_plan(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<StoredMealPlan>> {
    let row = sqlx::query_as::<_, MealPlanRow>(
        r#"SELECT plan, updated_at FROM meal_plans WHERE user_id = $1"#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("get meal plan")?;
    Ok(row.map(|r| StoredMealPlan {
        plan: r.plan.0,
        updated_at: r.updated_at,
    }))
}
