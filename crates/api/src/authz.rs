//! Authorization guard for route handlers.
//!
//! Handlers call [`require`] before touching storage, and [`require_manage`]
//! whenever the action targets another account.

use std::sync::Arc;

use axum::response::Response;

use backoffice_auth::{ACTIVE_ACCOUNT, Action, Authorizer, Role};

use crate::app::errors;
use crate::context::PrincipalContext;
use crate::store::Store;

pub type AppAuthorizer = Authorizer<Arc<Store>>;

/// Allow the caller to perform `action` only if their claimed role grants it
/// and their live account holds that role and is enabled and verified.
///
/// Returns the verified role.
pub async fn require(
    authorizer: &AppAuthorizer,
    principal: &PrincipalContext,
    action: Action,
) -> Result<Role, Response> {
    let Some(claimed) = principal.claimed_role() else {
        return Err(errors::not_authorized());
    };

    if !authorizer
        .authorize(principal.account_id(), claimed, action, ACTIVE_ACCOUNT)
        .await
    {
        return Err(errors::not_authorized());
    }

    claimed.parse::<Role>().map_err(|_| errors::not_authorized())
}

/// Management scope: `actor` may act on accounts holding `target`.
pub fn require_manage(authorizer: &AppAuthorizer, actor: Role, target: Role) -> Result<(), Response> {
    if authorizer.can_manage(actor, target) {
        Ok(())
    } else {
        tracing::debug!(actor_role = %actor, target_role = %target, "outside management scope");
        Err(errors::not_authorized())
    }
}
