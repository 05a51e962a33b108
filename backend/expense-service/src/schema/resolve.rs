//! Lazy relational resolution.
//!
//! Records carry foreign references, not embedded neighbours. A `RecordRef`
//! names the related record; the functions here fetch it on demand, with the
//! caller's identity checked at the point of access. Nothing in this module
//! is invoked at listing time, so a consumer that never asks for a relation
//! never pays for it.

use uuid::Uuid;

use crate::db::{CredentialStore, RecordStore};
use crate::error::{ApiError, Result};
use crate::middleware::identity::IdentityContext;
use crate::models::{Category, Expense, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Owner,
    Category,
    Expense,
}

/// A deferred relation: the id of a related record plus what the reference
/// denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordRef {
    pub kind: RefKind,
    pub id: Uuid,
}

impl RecordRef {
    pub fn owner(id: Uuid) -> Self {
        Self {
            kind: RefKind::Owner,
            id,
        }
    }

    pub fn category(id: Uuid) -> Self {
        Self {
            kind: RefKind::Category,
            id,
        }
    }

    pub fn expense(id: Uuid) -> Self {
        Self {
            kind: RefKind::Expense,
            id,
        }
    }
}

/// Resolve an owner reference. Owner references denote ownership, so the
/// caller must be the referenced account itself.
pub async fn resolve_owner(
    reference: RecordRef,
    identity: &IdentityContext,
    accounts: &dyn CredentialStore,
) -> Result<User> {
    let subject = identity.require_subject()?;
    if subject != reference.id {
        return Err(ApiError::Forbidden);
    }

    accounts
        .find_by_id(reference.id)
        .await?
        .ok_or(ApiError::NotFound)
}

/// Resolve a category reference, denying access to another user's category.
pub async fn resolve_category(
    reference: RecordRef,
    identity: &IdentityContext,
    records: &dyn RecordStore,
) -> Result<Category> {
    let subject = identity.require_subject()?;

    let category = records
        .category_by_id(reference.id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if category.owner_id != subject {
        return Err(ApiError::Forbidden);
    }

    Ok(category)
}

/// Resolve an expense reference, denying access to another user's expense.
pub async fn resolve_expense(
    reference: RecordRef,
    identity: &IdentityContext,
    records: &dyn RecordStore,
) -> Result<Expense> {
    let subject = identity.require_subject()?;

    let expense = records
        .expense_by_id(reference.id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if expense.creator_id != subject {
        return Err(ApiError::Forbidden);
    }

    Ok(expense)
}

/// The expenses created by the referenced owner, who must be the caller.
pub async fn resolve_expenses_of_owner(
    reference: RecordRef,
    identity: &IdentityContext,
    records: &dyn RecordStore,
) -> Result<Vec<Expense>> {
    let subject = identity.require_subject()?;
    if subject != reference.id {
        return Err(ApiError::Forbidden);
    }

    records.expenses_by_creator(reference.id).await
}

/// The expenses filed under the referenced category. Ownership is enforced by
/// resolving the category itself first.
pub async fn resolve_expenses_of_category(
    reference: RecordRef,
    identity: &IdentityContext,
    records: &dyn RecordStore,
) -> Result<Vec<Expense>> {
    let category = resolve_category(reference, identity, records).await?;
    records.expenses_by_category(category.id).await
}
