use thiserror::Error;

use crate::db_types::{Permission, Role};

#[derive(Debug, Clone, Error)]
pub enum PermissionGateError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for PermissionGateError {
    fn from(e: sqlx::Error) -> Self {
        PermissionGateError::DatabaseError(e.to_string())
    }
}

/// Answers whether a user holds a role within a business.
#[allow(async_fn_in_trait)]
pub trait PermissionGate {
    async fn check(&self, user_id: &str, business_id: &str, role: Role) -> Result<Permission, PermissionGateError>;

    /// Allows the user if they hold any of `roles`. An empty role list always denies.
    async fn check_any(
        &self,
        user_id: &str,
        business_id: &str,
        roles: &[Role],
    ) -> Result<Permission, PermissionGateError> {
        for role in roles {
            if self.check(user_id, business_id, *role).await?.is_allowed() {
                return Ok(Permission::Allow);
            }
        }
        Ok(Permission::Deny)
    }
}

/// Role administration for backends that host their own role assignments.
#[allow(async_fn_in_trait)]
pub trait RoleManagement {
    /// Grants the roles. Roles that are already held are left alone.
    async fn assign_roles(&self, user_id: &str, business_id: &str, roles: &[Role]) -> Result<(), PermissionGateError>;

    /// Removes the roles, returning the number of assignments that were actually removed.
    async fn remove_roles(&self, user_id: &str, business_id: &str, roles: &[Role])
        -> Result<u64, PermissionGateError>;

    async fn fetch_roles(&self, user_id: &str, business_id: &str) -> Result<Vec<Role>, PermissionGateError>;
}
