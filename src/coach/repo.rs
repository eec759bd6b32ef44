use anyhow::Context;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct ClientRow {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub linked_at: OffsetDateTime,
}

pub async fn link_client(db: &PgPool, coach_id: Uuid, client_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO coach_clients (coach_id, client_id)
        VALUES ($1, $2)
        ON CONFLICT (coach_id, client_id) DO NOTHING
        "#,
    )
    .bind(coach_id)
    .bind(client_id)
    .execute(db)
    .await
    .context("link client")?;
    Ok(result.rows_affected() > 0)
}

pub async fn unlink_client(db: &PgPool, coach_id: Uuid, client_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"DELETE FROM coach_clients WHERE coach_id = $1 AND client_id = $2"#,
    )
    .bind(coach_id)
    .bind(client_id)
    .execute(db)
    .await
    .context("unlink client")?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_clients(db: &PgPool, coach_id: Uuid) -> anyhow::Result<Vec<ClientRow>> {
    let rows = sqlx::query_as::<_, ClientRow>(
        r#"
        SELECT u.id, u.email, u.display_name, cc.created_at AS linked_at
        FROM coach_clients cc
        JOIN users u ON u.id = cc.client_id
        WHERE cc.coach_id = $1
        ORDER BY cc.created_at ASC
        "#,
    )
    .bind(coach_id)
    .fetch_all(db)
    .await
    .context("list clients")?;
    Ok(rows)
}

/// The whole coach-side access check: does the join-table row exist.
pub async fn is_coach_of(db: &PgPool, coach_id: Uuid, client_id: Uuid) -> anyhow::Result<bool> {
    let row: Option<(i32,)> = sqlx::query_as(
        r#"SELECT 1 FROM coach_clients WHERE coach_id = $1 AND client_id = $2"#,
    )
    .bind(coach_id)
    .bind(client_id)
    .fetch_optional(db)
    .await
    .context("coach access check")?;
    Ok(row.is_some())
}
