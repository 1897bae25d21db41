//! Role hierarchy: which actions each role may perform and which roles it may
//! administer.
//!
//! A [`HierarchyConfig`] is built once at startup and never mutated; share it
//! behind an `Arc`.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::Deserialize;
use thiserror::Error;

use crate::{Action, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("unknown role '{0}'")]
    UnknownRole(String),

    #[error("unknown action '{action}' granted to role '{role}'")]
    UnknownAction { role: String, action: String },

    #[error("role '{role}' manages '{subordinate}', which is not declared")]
    UndeclaredSubordinate { role: Role, subordinate: Role },

    #[error("invalid hierarchy document: {0}")]
    Document(String),
}

/// Immutable role → actions and role → subordinate-roles mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyConfig {
    grants: HashMap<Role, HashSet<Action>>,
    subordinates: HashMap<Role, HashSet<Role>>,
}

impl HierarchyConfig {
    pub fn builder() -> HierarchyBuilder {
        HierarchyBuilder::default()
    }

    /// The default staff hierarchy.
    pub fn standard() -> Self {
        use Action::*;

        let built = Self::builder()
            .role(
                Role::Administrator,
                [
                    Financial,
                    Store,
                    Products,
                    WebAnalytics,
                    CustomerManagement,
                    Employees,
                    Edit,
                    AddAdmin,
                    ChangeRole,
                    DeleteAdmin,
                    EnableDisableAdmin,
                    DeleteEmployee,
                ],
                [Role::Owner, Role::HeadDepartment, Role::Support, Role::Employees],
            )
            .role(
                Role::Owner,
                [
                    Financial,
                    Store,
                    Products,
                    WebAnalytics,
                    CustomerManagement,
                    Employees,
                    Edit,
                    DeleteEmployee,
                ],
                [Role::HeadDepartment, Role::Support],
            )
            .role(Role::HeadDepartment, [Employees, DeleteEmployee], [])
            .role(Role::Support, [Store, Products, CustomerManagement], [])
            .role(Role::Employees, [], [])
            .build();

        match built {
            Ok(config) => config,
            Err(e) => unreachable!("standard hierarchy is self-consistent: {e}"),
        }
    }

    /// Parse a hierarchy from JSON of the form
    /// `{"roles": {"owner": {"actions": ["store"], "manages": ["support"]}, ...}}`.
    pub fn from_json(json: &str) -> Result<Self, HierarchyError> {
        let doc: HierarchyDocument =
            serde_json::from_str(json).map_err(|e| HierarchyError::Document(e.to_string()))?;

        let mut builder = Self::builder();
        for (name, entry) in doc.roles {
            let role: Role = name
                .parse()
                .map_err(|_| HierarchyError::UnknownRole(name.clone()))?;

            let actions = entry
                .actions
                .iter()
                .map(|a| {
                    a.parse::<Action>().map_err(|_| HierarchyError::UnknownAction {
                        role: name.clone(),
                        action: a.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            let manages = entry
                .manages
                .iter()
                .map(|r| r.parse::<Role>().map_err(|_| HierarchyError::UnknownRole(r.clone())))
                .collect::<Result<Vec<_>, _>>()?;

            builder = builder.role(role, actions, manages);
        }
        builder.build()
    }

    /// Whether the role is declared in this hierarchy at all.
    pub fn contains(&self, role: Role) -> bool {
        self.grants.contains_key(&role)
    }

    /// Whether `role` is granted `action`. Undeclared roles are granted nothing.
    pub fn allows(&self, role: Role, action: Action) -> bool {
        self.grants
            .get(&role)
            .is_some_and(|actions| actions.contains(&action))
    }

    /// Management scope: whether an actor holding `actor` may administer
    /// accounts holding `target`.
    pub fn can_manage(&self, actor: Role, target: Role) -> bool {
        self.subordinates
            .get(&actor)
            .is_some_and(|subs| subs.contains(&target))
    }

    /// Roles `actor` may administer, in a stable order.
    pub fn manageable_roles(&self, actor: Role) -> Vec<Role> {
        let mut roles: Vec<Role> = self
            .subordinates
            .get(&actor)
            .map(|subs| subs.iter().copied().collect())
            .unwrap_or_default();
        roles.sort();
        roles
    }

    /// Declared roles, in a stable order.
    pub fn roles(&self) -> Vec<Role> {
        let mut roles: Vec<Role> = self.grants.keys().copied().collect();
        roles.sort();
        roles
    }
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// Accumulates role entries; [`HierarchyBuilder::build`] checks that every
/// subordinate role is itself declared.
#[derive(Debug, Default)]
pub struct HierarchyBuilder {
    grants: HashMap<Role, HashSet<Action>>,
    subordinates: HashMap<Role, HashSet<Role>>,
}

impl HierarchyBuilder {
    /// Declare `role`. Declaring the same role twice merges the entries.
    pub fn role(
        mut self,
        role: Role,
        actions: impl IntoIterator<Item = Action>,
        manages: impl IntoIterator<Item = Role>,
    ) -> Self {
        self.grants.entry(role).or_default().extend(actions);
        self.subordinates.entry(role).or_default().extend(manages);
        self
    }

    pub fn build(self) -> Result<HierarchyConfig, HierarchyError> {
        // Report in a stable order so errors are reproducible.
        let ordered: BTreeMap<&Role, BTreeSet<&Role>> = self
            .subordinates
            .iter()
            .map(|(role, subs)| (role, subs.iter().collect()))
            .collect();

        for (role, subs) in ordered {
            if let Some(sub) = subs.into_iter().find(|s| !self.grants.contains_key(*s)) {
                return Err(HierarchyError::UndeclaredSubordinate {
                    role: *role,
                    subordinate: *sub,
                });
            }
        }

        Ok(HierarchyConfig {
            grants: self.grants,
            subordinates: self.subordinates,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct HierarchyDocument {
    roles: BTreeMap<String, RoleEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RoleEntry {
    #[serde(default)]
    actions: Vec<String>,
    #[serde(default)]
    manages: Vec<String>,
}
