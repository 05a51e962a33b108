//! GraphQL schema assembly.

pub mod auth;
pub mod category;
pub mod expense;
pub mod resolve;

use std::sync::Arc;

use async_graphql::{Context, EmptySubscription, MergedObject, Schema, ID};
use uuid::Uuid;

use crate::db::{CredentialStore, RecordStore};
use crate::error::ApiError;
use crate::middleware::identity::IdentityContext;
use crate::services::auth::AuthService;

/// Root query object
#[derive(MergedObject, Default)]
pub struct QueryRoot(
    expense::ExpenseQuery,
    category::CategoryQuery,
    auth::AccountQuery,
);

/// Root mutation object
#[derive(MergedObject, Default)]
pub struct MutationRoot(
    auth::AuthMutation,
    expense::ExpenseMutation,
    category::CategoryMutation,
);

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the schema with its shared dependencies. The per-request
/// `IdentityContext` is attached to each request by the HTTP handler, not
/// here.
pub fn build_schema(
    auth: AuthService,
    accounts: Arc<dyn CredentialStore>,
    records: Arc<dyn RecordStore>,
) -> AppSchema {
    Schema::build(
        QueryRoot::default(),
        MutationRoot::default(),
        EmptySubscription,
    )
    .data(auth)
    .data(accounts)
    .data(records)
    .finish()
}

/// The caller's identity for this request. Absence of request data reads as
/// unauthenticated rather than an error: downstream operations decide what
/// to require.
pub(crate) fn identity(ctx: &Context<'_>) -> IdentityContext {
    ctx.data_opt::<IdentityContext>()
        .copied()
        .unwrap_or_default()
}

pub(crate) fn parse_id(id: &ID) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id.as_str()).map_err(|_| ApiError::Validation("Malformed id".to_string()))
}
