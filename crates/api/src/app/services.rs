//! Shared handler dependencies.

use std::sync::Arc;
use std::time::Duration;

use backoffice_auth::{Authorizer, HierarchyConfig, TokenIssuer, TokenVerifier};

use crate::authz::AppAuthorizer;
use crate::notifier::{Notice, Notifier};
use crate::store::Store;

pub struct AppServices {
    pub store: Arc<Store>,
    pub authorizer: AppAuthorizer,
    pub issuer: TokenIssuer,
    pub verifier: TokenVerifier,
    pub notifier: Arc<dyn Notifier>,
}

impl AppServices {
    pub fn new(
        store: Arc<Store>,
        hierarchy: HierarchyConfig,
        issuer: TokenIssuer,
        verifier: TokenVerifier,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let authorizer = Authorizer::new(Arc::new(hierarchy), Arc::clone(&store));
        Self {
            store,
            authorizer,
            issuer,
            verifier,
            notifier,
        }
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.authorizer = self.authorizer.with_lookup_timeout(timeout);
        self
    }

    /// Deliver `notice` if the account has an address. Delivery failures are
    /// logged and never fail the request.
    pub async fn notify(&self, recipient: Option<&str>, notice: Notice) {
        let Some(recipient) = recipient else {
            return;
        };
        if let Err(e) = self.notifier.send(recipient, notice).await {
            tracing::warn!(error = %e, "notification not delivered");
        }
    }
}
