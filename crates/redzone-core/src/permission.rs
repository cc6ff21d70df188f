//! Roles and Red Zone permissions

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse user role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    TeamLead,
    Csm,
}

/// A single grantable capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "red_zone.alerts.view")]
    ViewAlerts,
    #[serde(rename = "red_zone.alerts.escalate")]
    EscalateAlerts,
    #[serde(rename = "red_zone.alerts.resolve")]
    ResolveAlerts,
    #[serde(rename = "red_zone.alerts.assign")]
    AssignAlerts,
    #[serde(rename = "red_zone.alerts.approve")]
    ApproveResolutions,
    #[serde(rename = "red_zone.rules.manage")]
    ManageRules,
    #[serde(rename = "red_zone.rules.delete")]
    DeleteRules,
    #[serde(rename = "red_zone.sweep.run")]
    RunSweep,
}

impl Permission {
    pub const ALL: [Permission; 8] = [
        Permission::ViewAlerts,
        Permission::EscalateAlerts,
        Permission::ResolveAlerts,
        Permission::AssignAlerts,
        Permission::ApproveResolutions,
        Permission::ManageRules,
        Permission::DeleteRules,
        Permission::RunSweep,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewAlerts => "red_zone.alerts.view",
            Permission::EscalateAlerts => "red_zone.alerts.escalate",
            Permission::ResolveAlerts => "red_zone.alerts.resolve",
            Permission::AssignAlerts => "red_zone.alerts.assign",
            Permission::ApproveResolutions => "red_zone.alerts.approve",
            Permission::ManageRules => "red_zone.rules.manage",
            Permission::DeleteRules => "red_zone.rules.delete",
            Permission::RunSweep => "red_zone.sweep.run",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| CoreError::UnknownPermission(s.to_string()))
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::TeamLead => "team_lead",
            Role::Csm => "csm",
        }
    }

    /// Admins hold everything. Team leads hold every alert permission plus
    /// rule management and sweeps. CSMs work alerts but cannot approve.
    pub fn has_permission(&self, permission: Permission) -> bool {
        match self {
            Role::Admin => true,
            Role::TeamLead => !matches!(permission, Permission::DeleteRules),
            Role::Csm => matches!(
                permission,
                Permission::ViewAlerts
                    | Permission::EscalateAlerts
                    | Permission::ResolveAlerts
                    | Permission::AssignAlerts
            ),
        }
    }

    pub fn has_any_permission(&self, permissions: &[Permission]) -> bool {
        permissions.iter().any(|p| self.has_permission(*p))
    }

    pub fn has_all_permissions(&self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.has_permission(*p))
    }

    /// Every permission this role holds
    pub fn permissions(&self) -> Vec<Permission> {
        Permission::ALL
            .iter()
            .copied()
            .filter(|p| self.has_permission(*p))
            .collect()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "team_lead" => Ok(Role::TeamLead),
            "csm" => Ok(Role::Csm),
            _ => Err(CoreError::UnknownRole(s.to_string())),
        }
    }
}
