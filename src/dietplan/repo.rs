use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dietplan::dto::{MealType, PlanStatus};
use crate::nutrition::Goal;

/// Diet plan definition. Immutable after generation except for the publish
/// flag, which the core pipeline never touches.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DietPlan {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub goal: Goal,
    pub duration_weeks: i32,
    pub meals_per_day: i32,
    pub include_snacks: bool,
    pub cuisines: serde_json::Value,
    pub total_calories: i32,
    pub total_protein: i32,
    pub total_carbs: i32,
    pub total_fats: i32,
    pub published: bool,
    pub created_by: Uuid,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserDietPlan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub status: PlanStatus,
    pub activated_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct DayRow {
    pub id: Uuid,
    pub day_order: i32,
}

/// Meal joined with its recipe title, used by the plan-detail view.
#[derive(Debug, Clone, FromRow)]
pub struct MealWithRecipe {
    pub day_id: Uuid,
    pub meal_type: MealType,
    pub recipe_id: Uuid,
    pub recipe_title: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserPlanRow {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub name: String,
    pub goal: Goal,
    pub status: PlanStatus,
    pub activated_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

pub struct NewDietPlan<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub goal: Goal,
    pub duration_weeks: i32,
    pub meals_per_day: i32,
    pub include_snacks: bool,
    pub cuisines: serde_json::Value,
    pub total_calories: i32,
    pub total_protein: i32,
    pub total_carbs: i32,
    pub total_fats: i32,
    pub created_by: Uuid,
}

impl DietPlan {
    pub async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        new: &NewDietPlan<'_>,
    ) -> anyhow::Result<DietPlan> {
        let plan = sqlx::query_as::<_, DietPlan>(
            r#"
            INSERT INTO diet_plans
                (name, description, goal, duration_weeks, meals_per_day, include_snacks,
                 cuisines, total_calories, total_protein, total_carbs, total_fats, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id, name, description, goal, duration_weeks, meals_per_day,
                      include_snacks, cuisines, total_calories, total_protein,
                      total_carbs, total_fats, published, created_by, created_at
            "#,
        )
        .bind(new.name)
        .bind(new.description)
        .bind(new.goal)
        .bind(new.duration_weeks)
        .bind(new.meals_per_day)
        .bind(new.include_snacks)
        .bind(&new.cuisines)
        .bind(new.total_calories)
        .bind(new.total_protein)
        .bind(new.total_carbs)
        .bind(new.total_fats)
        .bind(new.created_by)
        .fetch_one(&mut **tx)
        .await?;
        Ok(plan)
    }

    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<DietPlan>> {
        let plan = sqlx::query_as::<_, DietPlan>(
            r#"
            SELECT id, name, description, goal, duration_weeks, meals_per_day,
                   include_snacks, cuisines, total_calories, total_protein,
                   total_carbs, total_fats, published, created_by, created_at
            FROM diet_plans
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(plan)
    }
}

pub async fn insert_day(
    tx: &mut Transaction<'_, Postgres>,
    plan_id: Uuid,
    day_order: i32,
) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO diet_days (plan_id, day_order)
        VALUES ($1, $2)
        RETURNING id
        "#,
    )
    .bind(plan_id)
    .bind(day_order)
    .fetch_one(&mut **tx)
    .await?;
    Ok(id)
}

pub async fn insert_meal(
    tx: &mut Transaction<'_, Postgres>,
    day_id: Uuid,
    meal_type: MealType,
    recipe_id: Uuid,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO meals (day_id, meal_type, recipe_id)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(day_id)
    .bind(meal_type)
    .bind(recipe_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn count_days(db: &PgPool, plan_id: Uuid) -> anyhow::Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM diet_days WHERE plan_id = $1")
        .bind(plan_id)
        .fetch_one(db)
        .await?;
    Ok(count)
}

pub async fn list_days(
    db: &PgPool,
    plan_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<DayRow>> {
    let days = sqlx::query_as::<_, DayRow>(
        r#"
        SELECT id, day_order
        FROM diet_days
        WHERE plan_id = $1
        ORDER BY day_order ASC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(plan_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(days)
}

pub async fn list_meals_for_days(
    db: &PgPool,
    day_ids: &[Uuid],
) -> anyhow::Result<Vec<MealWithRecipe>> {
    let meals = sqlx::query_as::<_, MealWithRecipe>(
        r#"
        SELECT m.day_id, m.meal_type, m.recipe_id, r.title AS recipe_title
        FROM meals m
        JOIN recipes r ON r.id = m.recipe_id
        WHERE m.day_id = ANY($1)
        ORDER BY m.created_at ASC
        "#,
    )
    .bind(day_ids)
    .fetch_all(db)
    .await?;
    Ok(meals)
}

impl UserDietPlan {
    pub async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        plan_id: Uuid,
    ) -> anyhow::Result<UserDietPlan> {
        let row = sqlx::query_as::<_, UserDietPlan>(
            r#"
            INSERT INTO user_diet_plans (user_id, plan_id, status)
            VALUES ($1, $2, 'NEW')
            RETURNING id, user_id, plan_id, status, activated_at, created_at
            "#,
        )
        .bind(user_id)
        .bind(plan_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(row)
    }

    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<UserDietPlan>> {
        let row = sqlx::query_as::<_, UserDietPlan>(
            r#"
            SELECT id, user_id, plan_id, status, activated_at, created_at
            FROM user_diet_plans
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn list_for_user(
        db: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<UserPlanRow>> {
        let rows = sqlx::query_as::<_, UserPlanRow>(
            r#"
            SELECT up.id, up.plan_id, p.name, p.goal, up.status, up.activated_at, up.created_at
            FROM user_diet_plans up
            JOIN diet_plans p ON p.id = up.plan_id
            WHERE up.user_id = $1
            ORDER BY up.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn count_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM user_diet_plans WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(db)
                .await?;
        Ok(count)
    }

    /// Deletes the join row; progress logs cascade at the schema level.
    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM user_diet_plans WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Runs the activation state machine in one transaction: deactivate every
    /// other ACTIVE plan of the user, then activate this one with a fresh
    /// timestamp. Toggling an ACTIVE plan only deactivates it. The partial
    /// unique index on (user_id) WHERE status = 'ACTIVE' backs the invariant
    /// under concurrent requests.
    pub async fn toggle_active(&self, db: &PgPool) -> anyhow::Result<PlanStatus> {
        let mut tx = db.begin().await?;
        let next = self.status.toggled();
        match next {
            PlanStatus::NotActive => {
                sqlx::query("UPDATE user_diet_plans SET status = 'NOT_ACTIVE' WHERE id = $1")
                    .bind(self.id)
                    .execute(&mut *tx)
                    .await?;
            }
            PlanStatus::Active | PlanStatus::New => {
                sqlx::query(
                    r#"
                    UPDATE user_diet_plans
                    SET status = 'NOT_ACTIVE'
                    WHERE user_id = $1 AND status = 'ACTIVE'
                    "#,
                )
                .bind(self.user_id)
                .execute(&mut *tx)
                .await?;
                sqlx::query(
                    r#"
                    UPDATE user_diet_plans
                    SET status = 'ACTIVE', activated_at = now()
                    WHERE id = $1
                    "#,
                )
                .bind(self.id)
                .execute(&mut *tx)
                .await?;
            }
        }
        tx.commit().await?;
        Ok(next)
    }
}
