use std::collections::HashMap;

use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Catalog recipe. Seeded out of band; this service only reads it.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Recipe {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub calories: i32,
    pub protein: i32,
    pub carbs: i32,
    pub fats: i32,
    pub created_at: OffsetDateTime,
}

impl Recipe {
    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, Recipe>(
            r#"
            SELECT id, title, description, calories, protein, carbs, fats, created_at
            FROM recipes
            ORDER BY title ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Recipe>> {
        let row = sqlx::query_as::<_, Recipe>(
            r#"
            SELECT id, title, description, calories, protein, carbs, fats, created_at
            FROM recipes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }
}

/// Batched case-insensitive title lookup for the plan generator. Input titles
/// must already be lowercased; the result maps lowercased title to recipe id.
pub async fn ids_by_lower_title(
    db: &PgPool,
    lower_titles: &[String],
) -> anyhow::Result<HashMap<String, Uuid>> {
    if lower_titles.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(String, Uuid)> = sqlx::query_as(
        r#"
        SELECT lower(title), id
        FROM recipes
        WHERE lower(title) = ANY($1)
        "#,
    )
    .bind(lower_titles)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().collect())
}
