//! Permission checks backed by the user directory

use crate::error::{LifecycleError, LifecycleResult};
use redzone_core::{Permission, Role};
use redzone_repository::UserDirectory;
use std::sync::Arc;

/// Composes the role/permission table with a [`UserDirectory`] lookup
#[derive(Clone)]
pub struct PermissionGuard {
    users: Arc<dyn UserDirectory>,
}

impl PermissionGuard {
    pub fn new(users: Arc<dyn UserDirectory>) -> Self {
        Self { users }
    }

    /// `hasPermission(userId, permissionId)`; unknown users hold nothing
    pub async fn has_permission(&self, user_id: i64, permission: Permission) -> LifecycleResult<bool> {
        let role = self.users.role_of(user_id).await?;
        Ok(role.map_or(false, |r| r.has_permission(permission)))
    }

    /// Fail with `Forbidden` unless `user_id` holds `permission`
    pub async fn require(&self, user_id: i64, permission: Permission) -> LifecycleResult<Role> {
        match self.users.role_of(user_id).await? {
            Some(role) if role.has_permission(permission) => Ok(role),
            _ => {
                tracing::warn!(user_id, permission = %permission, "permission denied");
                Err(LifecycleError::Forbidden { user_id, permission })
            }
        }
    }
}
