//! Expense schema and resolvers

use std::sync::Arc;

use async_graphql::{
    ComplexObject, Context, ErrorExtensions, InputObject, Object, Result as GraphQLResult,
    SimpleObject, ID,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::db::{CredentialStore, RecordStore};
use crate::error::ApiError;
use crate::models::{Expense, NewExpense};
use crate::schema::auth::AccountNode;
use crate::schema::category::CategoryNode;
use crate::schema::resolve::{self, RecordRef};

/// An expense row. Relational fields carry references only; the related
/// records are fetched when a consumer asks for them.
#[derive(SimpleObject, Clone, Debug)]
#[graphql(complex, name = "Expense")]
pub struct ExpenseNode {
    pub id: ID,
    pub title: String,
    pub description: Option<String>,
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[graphql(skip)]
    pub category_id: Uuid,
    #[graphql(skip)]
    pub creator_id: Uuid,
}

impl From<Expense> for ExpenseNode {
    fn from(expense: Expense) -> Self {
        ExpenseNode {
            id: ID(expense.id.to_string()),
            title: expense.title,
            description: expense.description,
            amount: expense.amount,
            date: expense.date,
            created_at: expense.created_at,
            category_id: expense.category_id,
            creator_id: expense.creator_id,
        }
    }
}

#[ComplexObject]
impl ExpenseNode {
    /// The expense's category, resolved on demand.
    async fn category(&self, ctx: &Context<'_>) -> GraphQLResult<CategoryNode> {
        let identity = super::identity(ctx);
        let records = ctx.data::<Arc<dyn RecordStore>>()?;

        let category = resolve::resolve_category(
            RecordRef::category(self.category_id),
            &identity,
            records.as_ref(),
        )
        .await
        .map_err(|e| e.extend())?;

        Ok(category.into())
    }

    /// The account that created this expense, resolved on demand.
    async fn creator(&self, ctx: &Context<'_>) -> GraphQLResult<AccountNode> {
        let identity = super::identity(ctx);
        let accounts = ctx.data::<Arc<dyn CredentialStore>>()?;

        let user = resolve::resolve_owner(
            RecordRef::owner(self.creator_id),
            &identity,
            accounts.as_ref(),
        )
        .await
        .map_err(|e| e.extend())?;

        Ok(user.into())
    }
}

#[derive(InputObject, Validate)]
#[graphql(name = "ExpenseInput")]
pub struct ExpenseInput {
    #[validate(length(min = 1))]
    pub title: String,
    pub category_id: ID,
    pub description: Option<String>,
    #[validate(range(min = 0.01))]
    pub amount: f64,
    pub date: DateTime<Utc>,
}

#[derive(Default)]
pub struct ExpenseQuery;

#[Object]
impl ExpenseQuery {
    /// Expenses created by the calling account.
    async fn expenses(&self, ctx: &Context<'_>) -> GraphQLResult<Vec<ExpenseNode>> {
        let identity = super::identity(ctx);
        let subject = identity.require_subject().map_err(|e| e.extend())?;
        let records = ctx.data::<Arc<dyn RecordStore>>()?;

        let expenses = resolve::resolve_expenses_of_owner(
            RecordRef::owner(subject),
            &identity,
            records.as_ref(),
        )
        .await
        .map_err(|e| e.extend())?;

        Ok(expenses.into_iter().map(Into::into).collect())
    }
}

#[derive(Default)]
pub struct ExpenseMutation;

#[Object]
impl ExpenseMutation {
    async fn create_expense(
        &self,
        ctx: &Context<'_>,
        expense_input: ExpenseInput,
    ) -> GraphQLResult<ExpenseNode> {
        expense_input
            .validate()
            .map_err(|e| ApiError::Validation(e.to_string()).extend())?;

        let identity = super::identity(ctx);
        let subject = identity.require_subject().map_err(|e| e.extend())?;
        let records = ctx.data::<Arc<dyn RecordStore>>()?;

        let category_id = super::parse_id(&expense_input.category_id).map_err(|e| e.extend())?;

        // The category must exist and belong to the caller before anything
        // is written.
        resolve::resolve_category(RecordRef::category(category_id), &identity, records.as_ref())
            .await
            .map_err(|e| e.extend())?;

        let expense = records
            .create_expense(NewExpense {
                title: expense_input.title,
                description: expense_input.description,
                amount: expense_input.amount,
                date: expense_input.date,
                category_id,
                creator_id: subject,
            })
            .await
            .map_err(|e| e.extend())?;

        Ok(expense.into())
    }
}
