use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::nutrition::{ActivityLevel, Gender};

/// One profile per user, mutated only by its owner.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Profile {
    pub user_id: Uuid,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub birthdate: Date,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
    pub medications: Vec<String>,
    pub food_intolerances: Vec<String>,
    pub smoking: bool,
    pub vegetarian: bool,
    pub vegan: bool,
    pub halal: bool,
    pub kosher: bool,
    pub updated_at: OffsetDateTime,
}

pub struct ProfileInput<'a> {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub birthdate: Date,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
    pub medications: &'a [String],
    pub food_intolerances: &'a [String],
    pub smoking: bool,
    pub vegetarian: bool,
    pub vegan: bool,
    pub halal: bool,
    pub kosher: bool,
}

impl Profile {
    pub async fn find_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT user_id, weight_kg, height_cm, birthdate, gender, activity_level,
                   medications, food_intolerances, smoking, vegetarian, vegan,
                   halal, kosher, updated_at
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(profile)
    }

    /// Create-or-update keyed on the owning user.
    pub async fn upsert(
        db: &PgPool,
        user_id: Uuid,
        input: &ProfileInput<'_>,
    ) -> anyhow::Result<Profile> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles
                (user_id, weight_kg, height_cm, birthdate, gender, activity_level,
                 medications, food_intolerances, smoking, vegetarian, vegan, halal, kosher)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (user_id) DO UPDATE SET
                weight_kg = EXCLUDED.weight_kg,
                height_cm = EXCLUDED.height_cm,
                birthdate = EXCLUDED.birthdate,
                gender = EXCLUDED.gender,
                activity_level = EXCLUDED.activity_level,
                medications = EXCLUDED.medications,
                food_intolerances = EXCLUDED.food_intolerances,
                smoking = EXCLUDED.smoking,
                vegetarian = EXCLUDED.vegetarian,
                vegan = EXCLUDED.vegan,
                halal = EXCLUDED.halal,
                kosher = EXCLUDED.kosher,
                updated_at = now()
            RETURNING user_id, weight_kg, height_cm, birthdate, gender, activity_level,
                      medications, food_intolerances, smoking, vegetarian, vegan,
                      halal, kosher, updated_at
            "#,
        )
        .bind(user_id)
        .bind(input.weight_kg)
        .bind(input.height_cm)
        .bind(input.birthdate)
        .bind(input.gender)
        .bind(input.activity_level)
        .bind(input.medications)
        .bind(input.food_intolerances)
        .bind(input.smoking)
        .bind(input.vegetarian)
        .bind(input.vegan)
        .bind(input.halal)
        .bind(input.kosher)
        .fetch_one(db)
        .await?;
        Ok(profile)
    }
}
