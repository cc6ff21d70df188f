//! Alert lifecycle and permission checks

mod guard;
mod manager;

pub use guard::PermissionGuard;
pub use manager::AlertLifecycleManager;
