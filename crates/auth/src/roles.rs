use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Staff role in the administrative hierarchy.
///
/// The set is closed: role text arriving from a token or a request body must
/// parse into one of these variants before it is trusted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "administrator")]
    Administrator,
    #[serde(rename = "owner")]
    Owner,
    #[serde(rename = "headdepartment")]
    HeadDepartment,
    #[serde(rename = "support")]
    Support,
    #[serde(rename = "employees")]
    Employees,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Administrator,
        Role::Owner,
        Role::HeadDepartment,
        Role::Support,
        Role::Employees,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "administrator",
            Role::Owner => "owner",
            Role::HeadDepartment => "headdepartment",
            Role::Support => "support",
            Role::Employees => "employees",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    /// Exact wire name only.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_role_name() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn role_names_are_case_sensitive() {
        for bad in ["Owner", "OWNER", "Administrator", "headDepartment"] {
            assert!(bad.parse::<Role>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn rejects_unknown_names() {
        for bad in ["", "admin", "employee", " owner", "root"] {
            assert!(bad.parse::<Role>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&Role::HeadDepartment).unwrap();
        assert_eq!(json, "\"headdepartment\"");
    }
}
