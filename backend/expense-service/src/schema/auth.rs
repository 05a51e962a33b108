//! Authentication schema and resolvers

use std::sync::Arc;

use async_graphql::{
    ComplexObject, Context, ErrorExtensions, InputObject, Object, Result as GraphQLResult,
    SimpleObject, ID,
};
use chrono::{DateTime, Utc};
use validator::Validate;

use crate::db::{CredentialStore, RecordStore};
use crate::models::User;
use crate::schema::expense::ExpenseNode;
use crate::schema::resolve::{self, RecordRef};
use crate::services::auth::{AuthService, AuthSession};

/// An account as exposed through the API. The password hash and the
/// single-use token pairs never leave the server.
#[derive(SimpleObject, Clone, Debug)]
#[graphql(complex, name = "Account")]
pub struct AccountNode {
    pub id: ID,
    pub email: String,
    pub name: String,
    pub is_email_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[graphql(skip)]
    pub account_id: uuid::Uuid,
}

impl From<User> for AccountNode {
    fn from(user: User) -> Self {
        AccountNode {
            id: ID(user.id.to_string()),
            email: user.email,
            name: user.name,
            is_email_verified: user.is_email_verified,
            last_login: user.last_login,
            created_at: user.created_at,
            account_id: user.id,
        }
    }
}

#[ComplexObject]
impl AccountNode {
    /// Expenses created by this account, resolved on demand.
    async fn created_expenses(&self, ctx: &Context<'_>) -> GraphQLResult<Vec<ExpenseNode>> {
        let identity = super::identity(ctx);
        let records = ctx.data::<Arc<dyn RecordStore>>()?;

        let expenses = resolve::resolve_expenses_of_owner(
            RecordRef::owner(self.account_id),
            &identity,
            records.as_ref(),
        )
        .await
        .map_err(|e| e.extend())?;

        Ok(expenses.into_iter().map(Into::into).collect())
    }
}

#[derive(SimpleObject)]
pub struct AuthPayload {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub account: AccountNode,
}

impl From<AuthSession> for AuthPayload {
    fn from(session: AuthSession) -> Self {
        AuthPayload {
            token: session.token,
            expires_at: session.expires_at,
            account: session.user.into(),
        }
    }
}

#[derive(SimpleObject)]
pub struct MessagePayload {
    pub message: String,
}

#[derive(InputObject, Validate)]
#[graphql(name = "UserInput")]
pub struct RegisterInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(min = 1))]
    pub name: String,
}

#[derive(Default)]
pub struct AuthMutation;

#[Object]
impl AuthMutation {
    async fn register(
        &self,
        ctx: &Context<'_>,
        user_input: RegisterInput,
    ) -> GraphQLResult<AuthPayload> {
        user_input
            .validate()
            .map_err(|e| crate::error::ApiError::Validation(e.to_string()).extend())?;

        let auth = ctx.data::<AuthService>()?;
        let session = auth
            .register(&user_input.email, &user_input.password, &user_input.name)
            .await
            .map_err(|e| e.extend())?;

        Ok(session.into())
    }

    async fn login(
        &self,
        ctx: &Context<'_>,
        email: String,
        password: String,
    ) -> GraphQLResult<AuthPayload> {
        let auth = ctx.data::<AuthService>()?;
        let session = auth
            .login(&email, &password)
            .await
            .map_err(|e| e.extend())?;

        Ok(session.into())
    }

    async fn request_password_reset(
        &self,
        ctx: &Context<'_>,
        email: String,
    ) -> GraphQLResult<MessagePayload> {
        let auth = ctx.data::<AuthService>()?;
        let message = auth
            .request_password_reset(&email)
            .await
            .map_err(|e| e.extend())?;

        Ok(MessagePayload {
            message: message.to_string(),
        })
    }

    async fn reset_password(
        &self,
        ctx: &Context<'_>,
        token: String,
        new_password: String,
    ) -> GraphQLResult<MessagePayload> {
        let auth = ctx.data::<AuthService>()?;
        let message = auth
            .reset_password(&token, &new_password)
            .await
            .map_err(|e| e.extend())?;

        Ok(MessagePayload {
            message: message.to_string(),
        })
    }

    async fn verify_email(&self, ctx: &Context<'_>, token: String) -> GraphQLResult<MessagePayload> {
        let auth = ctx.data::<AuthService>()?;
        let message = auth.verify_email(&token).await.map_err(|e| e.extend())?;

        Ok(MessagePayload {
            message: message.to_string(),
        })
    }

    async fn resend_verification_email(&self, ctx: &Context<'_>) -> GraphQLResult<MessagePayload> {
        let identity = super::identity(ctx);
        let auth = ctx.data::<AuthService>()?;
        let message = auth
            .resend_verification_email(&identity)
            .await
            .map_err(|e| e.extend())?;

        Ok(MessagePayload {
            message: message.to_string(),
        })
    }
}

/// Account lookups for the signed-in caller.
#[derive(Default)]
pub struct AccountQuery;

#[Object]
impl AccountQuery {
    /// The calling account, or null when unauthenticated.
    async fn me(&self, ctx: &Context<'_>) -> GraphQLResult<Option<AccountNode>> {
        let identity = super::identity(ctx);
        let Some(subject) = identity.subject() else {
            return Ok(None);
        };

        let accounts = ctx.data::<Arc<dyn CredentialStore>>()?;
        let user = resolve::resolve_owner(RecordRef::owner(subject), &identity, accounts.as_ref())
            .await
            .map_err(|e| e.extend())?;

        Ok(Some(user.into()))
    }
}
