use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// A guarded capability checked against a role's grants.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Financial,
    Store,
    Products,
    WebAnalytics,
    CustomerManagement,
    Employees,
    Edit,
    AddAdmin,
    #[serde(rename = "del-admin")]
    DeleteAdmin,
    ChangeRole,
    EnableDisableAdmin,
    DeleteEmployee,
}

impl Action {
    pub const ALL: [Action; 12] = [
        Action::Financial,
        Action::Store,
        Action::Products,
        Action::WebAnalytics,
        Action::CustomerManagement,
        Action::Employees,
        Action::Edit,
        Action::AddAdmin,
        Action::DeleteAdmin,
        Action::ChangeRole,
        Action::EnableDisableAdmin,
        Action::DeleteEmployee,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Financial => "financial",
            Action::Store => "store",
            Action::Products => "products",
            Action::WebAnalytics => "web-analytics",
            Action::CustomerManagement => "customer-management",
            Action::Employees => "employees",
            Action::Edit => "edit",
            Action::AddAdmin => "add-admin",
            Action::DeleteAdmin => "del-admin",
            Action::ChangeRole => "change-role",
            Action::EnableDisableAdmin => "enable-disable-admin",
            Action::DeleteEmployee => "delete-employee",
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action '{0}'")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

/// Boolean account flag a route may require on the live account record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Enabled,
    Verified,
}

impl Attribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Enabled => "enabled",
            Attribute::Verified => "verified",
        }
    }
}

impl core::fmt::Display for Attribute {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The attribute set nearly every staff route requires.
pub const ACTIVE_ACCOUNT: &[Attribute] = &[Attribute::Enabled, Attribute::Verified];
