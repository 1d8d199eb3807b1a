//! Authentication and authorization.
//!
//! Bearer tokens identify a [`Principal`]. Admin-only operations take an
//! [`AdminGrant`], which can only be obtained from a principal whose role is
//! [`Role::Admin`].

mod password;
mod token;

pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenIssuer};

use crate::models::Role;
use crate::{StoreError, StoreResult};

/// The authenticated caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Proves the caller is an administrator.
    pub fn admin(&self) -> StoreResult<AdminGrant> {
        if self.is_admin() {
            Ok(AdminGrant { _private: () })
        } else {
            Err(StoreError::forbidden("administrator role required"))
        }
    }

    /// Checks that the caller may read a resource owned by `owner_id`.
    pub fn ensure_can_access(&self, owner_id: i64) -> StoreResult<()> {
        if self.is_admin() || self.user_id == owner_id {
            Ok(())
        } else {
            Err(StoreError::forbidden("access to this order is denied"))
        }
    }
}

impl From<&Claims> for Principal {
    fn from(claims: &Claims) -> Self {
        Self::new(claims.sub, claims.role)
    }
}

/// Capability token for admin-only operations.
#[derive(Debug, Clone, Copy)]
pub struct AdminGrant {
    _private: (),
}
