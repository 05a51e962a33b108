use chrono::{DateTime, Utc};
/// Expense model
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Expense {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub category_id: Uuid,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewExpense {
    pub title: String,
    pub description: Option<String>,
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub category_id: Uuid,
    pub creator_id: Uuid,
}
