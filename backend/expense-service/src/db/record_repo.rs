use async_trait::async_trait;
use uuid::Uuid;

use crate::db::{PgStore, RecordStore};
use crate::error::{ApiError, Result};
use crate::models::{Category, Expense, NewCategory, NewExpense};

#[async_trait]
impl RecordStore for PgStore {
    async fn expense_by_id(&self, id: Uuid) -> Result<Option<Expense>> {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            SELECT * FROM expenses WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(expense)
    }

    async fn expenses_by_creator(&self, creator_id: Uuid) -> Result<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT * FROM expenses WHERE creator_id = $1 ORDER BY date DESC
            "#,
        )
        .bind(creator_id)
        .fetch_all(self.pool())
        .await?;

        Ok(expenses)
    }

    async fn expenses_by_category(&self, category_id: Uuid) -> Result<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT * FROM expenses WHERE category_id = $1 ORDER BY date DESC
            "#,
        )
        .bind(category_id)
        .fetch_all(self.pool())
        .await?;

        Ok(expenses)
    }

    async fn create_expense(&self, draft: NewExpense) -> Result<Expense> {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            INSERT INTO expenses (id, title, description, amount, date,
                                  category_id, creator_id, created_at, updated_at)
            VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, $6,
                    CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
            RETURNING *
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.amount)
        .bind(draft.date)
        .bind(draft.category_id)
        .bind(draft.creator_id)
        .fetch_one(self.pool())
        .await?;

        Ok(expense)
    }

    async fn category_by_id(&self, id: Uuid) -> Result<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT * FROM categories WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(category)
    }

    async fn categories_by_owner(&self, owner_id: Uuid) -> Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT * FROM categories WHERE owner_id = $1 ORDER BY name
            "#,
        )
        .bind(owner_id)
        .fetch_all(self.pool())
        .await?;

        Ok(categories)
    }

    async fn find_category(&self, owner_id: Uuid, name: &str) -> Result<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT * FROM categories WHERE owner_id = $1 AND name = $2
            "#,
        )
        .bind(owner_id)
        .bind(name)
        .fetch_optional(self.pool())
        .await?;

        Ok(category)
    }

    async fn create_category(&self, draft: NewCategory) -> Result<Category> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (id, name, description, owner_id, created_at, updated_at)
            VALUES (gen_random_uuid(), $1, $2, $3, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
            RETURNING *
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.owner_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            if e.to_string().contains("unique constraint") {
                ApiError::CategoryExists
            } else {
                ApiError::Database(e.to_string())
            }
        })?;

        Ok(category)
    }
}
