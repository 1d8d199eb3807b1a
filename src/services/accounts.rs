use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password, TokenIssuer};
use crate::models::{
    normalize_email, Credentials, NewAccount, NewUserRecord, ProfilePatch, Role, UserProfile,
};
use crate::repository::UserRepository;
use crate::unit_of_work::complete;
use crate::{StoreError, StoreResult, UnitOfWork, UnitOfWorkSession};

/// Successful login: a bearer token and the account it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedIn {
    pub token: String,
    pub user: UserProfile,
}

/// Registration, login and profile management.
pub struct AccountService<U> {
    uow: Arc<U>,
    tokens: Arc<TokenIssuer>,
}

impl<U: UnitOfWork> AccountService<U> {
    pub fn new(uow: Arc<U>, tokens: Arc<TokenIssuer>) -> Self {
        Self { uow, tokens }
    }

    /// Creates a customer account. Admins are never self-registered.
    #[tracing::instrument(skip(self, account))]
    pub async fn register(&self, account: &NewAccount) -> StoreResult<UserProfile> {
        let first_name = required(&account.first_name, "first name")?;
        let last_name = required(&account.last_name, "last name")?;
        let email = normalize_email(&account.email)?;
        if account.password.trim().is_empty() {
            return Err(StoreError::validation("password is required"));
        }

        let record = NewUserRecord {
            first_name,
            last_name,
            email,
            password_hash: hash_password(&account.password)?,
            role: Role::Customer,
            address: account.address.clone(),
            phone: account.phone.clone(),
        };

        let session = self.uow.begin().await?;
        let result = UserRepository::new(session.executor().clone())
            .create(&record)
            .await;
        let user = complete(session, result).await?;

        info!(user_id = user.id, "account registered");
        Ok(user.into())
    }

    /// Exchanges credentials for a bearer token.
    ///
    /// Unknown emails and wrong passwords fail with the same message.
    #[tracing::instrument(skip(self, credentials))]
    pub async fn login(&self, credentials: &Credentials) -> StoreResult<SignedIn> {
        if credentials.email.trim().is_empty() || credentials.password.is_empty() {
            return Err(StoreError::validation("email and password are required"));
        }
        let email = credentials.email.trim().to_lowercase();

        let session = self.uow.begin().await?;
        let result = UserRepository::new(session.executor().clone())
            .find_by_email(&email)
            .await;
        let user = complete(session, result).await?;

        let user = match user {
            Some(user) if verify_password(&user.password_hash, &credentials.password) => user,
            _ => {
                warn!("login rejected");
                return Err(StoreError::validation("invalid credentials"));
            }
        };

        let token = self.tokens.issue(&user)?;
        info!(user_id = user.id, "login succeeded");
        Ok(SignedIn {
            token,
            user: user.into(),
        })
    }

    pub async fn profile(&self, user_id: i64) -> StoreResult<UserProfile> {
        let session = self.uow.begin().await?;
        let result = UserRepository::new(session.executor().clone())
            .find_by_id(user_id)
            .await
            .and_then(|found| found.ok_or_else(|| StoreError::not_found("user", user_id)));
        complete(session, result).await.map(UserProfile::from)
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        patch: &ProfilePatch,
    ) -> StoreResult<UserProfile> {
        if let Some(name) = &patch.first_name {
            required(name, "first name")?;
        }
        if let Some(name) = &patch.last_name {
            required(name, "last name")?;
        }

        let session = self.uow.begin().await?;
        let result = UserRepository::new(session.executor().clone())
            .update_profile(user_id, patch)
            .await
            .and_then(|found| found.ok_or_else(|| StoreError::not_found("user", user_id)));
        complete(session, result).await.map(UserProfile::from)
    }
}

fn required(value: &str, field: &str) -> StoreResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(StoreError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("  Ana ", "first name").unwrap(), "Ana");
        let err = required("   ", "last name").unwrap_err();
        assert_eq!(err.to_string(), "last name is required");
    }
}
