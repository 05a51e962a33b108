//! Category schema and resolvers

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
use crate::models::{Category, NewCategory};
use crate::schema::auth::AccountNode;
use crate::schema::expense::ExpenseNode;
use crate::schema::resolve::{self, RecordRef};

#[derive(SimpleObject, Clone, Debug)]
#[graphql(complex, name = "Category")]
pub struct CategoryNode {
    pub id: ID,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    #[graphql(skip)]
    pub owner_id: Uuid,
}

impl From<Category> for CategoryNode {
    fn from(category: Category) -> Self {
        CategoryNode {
            id: ID(category.id.to_string()),
            name: category.name,
            description: category.description,
            created_at: category.created_at,
            owner_id: category.owner_id,
        }
    }
}

#[ComplexObject]
impl CategoryNode {
    /// The account owning this category, resolved on demand.
    async fn user(&self, ctx: &Context<'_>) -> GraphQLResult<AccountNode> {
        let identity = super::identity(ctx);
        let accounts = ctx.data::<Arc<dyn CredentialStore>>()?;

        let user = resolve::resolve_owner(
            RecordRef::owner(self.owner_id),
            &identity,
            accounts.as_ref(),
        )
        .await
        .map_err(|e| e.extend())?;

        Ok(user.into())
    }

    /// Expenses filed under this category, resolved on demand.
    async fn expenses(&self, ctx: &Context<'_>) -> GraphQLResult<Vec<ExpenseNode>> {
        let identity = super::identity(ctx);
        let records = ctx.data::<Arc<dyn RecordStore>>()?;

        let category_id = super::parse_id(&self.id).map_err(|e| e.extend())?;
        let expenses = resolve::resolve_expenses_of_category(
            RecordRef::category(category_id),
            &identity,
            records.as_ref(),
        )
        .await
        .map_err(|e| e.extend())?;

        Ok(expenses.into_iter().map(Into::into).collect())
    }
}

#[derive(InputObject, Validate)]
#[graphql(name = "CategoryInput")]
pub struct CategoryInput {
    #[validate(length(min = 1))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Default)]
pub struct CategoryQuery;

#[Object]
impl CategoryQuery {
    /// Categories owned by the calling account.
    async fn categories(&self, ctx: &Context<'_>) -> GraphQLResult<Vec<CategoryNode>> {
        let identity = super::identity(ctx);
        let subject = identity.require_subject().map_err(|e| e.extend())?;
        let records = ctx.data::<Arc<dyn RecordStore>>()?;

        let categories = records
            .categories_by_owner(subject)
            .await
            .map_err(|e| e.extend())?;

        Ok(categories.into_iter().map(Into::into).collect())
    }
}

#[derive(Default)]
pub struct CategoryMutation;

#[Object]
impl CategoryMutation {
    async fn create_category(
        &self,
        ctx: &Context<'_>,
        category_input: CategoryInput,
    ) -> GraphQLResult<CategoryNode> {
        category_input
            .validate()
            .map_err(|e| ApiError::Validation(e.to_string()).extend())?;

        let identity = super::identity(ctx);
        let subject = identity.require_subject().map_err(|e| e.extend())?;
        let records = ctx.data::<Arc<dyn RecordStore>>()?;

        // Names are unique per owner; the unique index backs this check up
        // under concurrent creates.
        if records
            .find_category(subject, &category_input.name)
            .await
            .map_err(|e| e.extend())?
            .is_some()
        {
            return Err(ApiError::CategoryExists.extend());
        }

        let category = records
            .create_category(NewCategory {
                name: category_input.name,
                description: category_input.description,
                owner_id: subject,
            })
            .await
            .map_err(|e| e.extend())?;

        Ok(category.into())
    }
}
