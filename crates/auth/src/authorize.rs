use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use backoffice_core::AccountId;

use crate::account::AccountDirectory;
use crate::hierarchy::HierarchyConfig;
use crate::{Action, Attribute, Role};

/// Upper bound on the live account lookup before the request is denied.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

/// Why a request was denied.
///
/// For logs and tests only: callers must answer every denial with the same
/// response regardless of the reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DenyReason {
    /// Role claim does not name a role declared in the hierarchy.
    UnknownRole,
    /// The claimed role is not granted the action.
    ActionNotGranted,
    AccountNotFound,
    /// The account directory returned an error.
    LookupFailed,
    LookupTimedOut,
    /// The stored role differs from the claimed role (stale or forged claim).
    RoleMismatch,
    MissingAttribute { attribute: Attribute },
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::UnknownRole => "unknown_role",
            DenyReason::ActionNotGranted => "action_not_granted",
            DenyReason::AccountNotFound => "account_not_found",
            DenyReason::LookupFailed => "lookup_failed",
            DenyReason::LookupTimedOut => "lookup_timed_out",
            DenyReason::RoleMismatch => "role_mismatch",
            DenyReason::MissingAttribute { .. } => "missing_attribute",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Role-hierarchy authorization engine.
///
/// Combines the immutable hierarchy, the caller's claimed role and the live
/// account record. Every failure path, including directory errors and
/// timeouts, resolves to a denial.
#[derive(Debug)]
pub struct Authorizer<D> {
    hierarchy: Arc<HierarchyConfig>,
    directory: D,
    lookup_timeout: Duration,
}

impl<D: Clone> Clone for Authorizer<D> {
    fn clone(&self) -> Self {
        Self {
            hierarchy: Arc::clone(&self.hierarchy),
            directory: self.directory.clone(),
            lookup_timeout: self.lookup_timeout,
        }
    }
}

impl<D> Authorizer<D>
where
    D: AccountDirectory,
{
    pub fn new(hierarchy: Arc<HierarchyConfig>, directory: D) -> Self {
        Self {
            hierarchy,
            directory,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn hierarchy(&self) -> &HierarchyConfig {
        &self.hierarchy
    }

    /// Decide whether `actor`, claiming `claimed_role`, may perform `action`
    /// right now. Only the boolean is meant to reach the caller.
    pub async fn authorize(
        &self,
        actor: AccountId,
        claimed_role: &str,
        action: Action,
        required: &[Attribute],
    ) -> bool {
        let decision = self.evaluate(actor, claimed_role, action, required).await;
        if let Decision::Deny(reason) = decision {
            tracing::debug!(
                actor_id = %actor,
                action = %action,
                reason = reason.as_str(),
                "authorization denied"
            );
        }
        decision.is_allowed()
    }

    /// Full decision, including the deny reason.
    pub async fn evaluate(
        &self,
        actor: AccountId,
        claimed_role: &str,
        action: Action,
        required: &[Attribute],
    ) -> Decision {
        let role = match claimed_role.parse::<Role>() {
            Ok(role) if self.hierarchy.contains(role) => role,
            _ => return Decision::Deny(DenyReason::UnknownRole),
        };

        if !self.hierarchy.allows(role, action) {
            return Decision::Deny(DenyReason::ActionNotGranted);
        }

        let lookup = tokio::time::timeout(
            self.lookup_timeout,
            self.directory.find_account_by_id(actor),
        )
        .await;

        let account = match lookup {
            Ok(Ok(Some(account))) => account,
            Ok(Ok(None)) => return Decision::Deny(DenyReason::AccountNotFound),
            Ok(Err(e)) => {
                tracing::warn!(actor_id = %actor, error = %e, "account lookup failed during authorization");
                return Decision::Deny(DenyReason::LookupFailed);
            }
            Err(_) => {
                tracing::warn!(
                    actor_id = %actor,
                    timeout_ms = self.lookup_timeout.as_millis() as u64,
                    "account lookup timed out during authorization"
                );
                return Decision::Deny(DenyReason::LookupTimedOut);
            }
        };

        if account.role != role {
            return Decision::Deny(DenyReason::RoleMismatch);
        }

        if let Some(missing) = required.iter().find(|a| !account.has(**a)) {
            return Decision::Deny(DenyReason::MissingAttribute { attribute: *missing });
        }

        Decision::Allow
    }

    /// Management scope check, evaluated in addition to [`Authorizer::authorize`].
    pub fn can_manage(&self, actor_role: Role, target_role: Role) -> bool {
        self.hierarchy.can_manage(actor_role, target_role)
    }
}
