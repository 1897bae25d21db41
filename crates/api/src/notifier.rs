//! Outbound account notifications (stand-in for email delivery).

use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use backoffice_auth::Role;
use backoffice_core::{AccountId, OrderId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Carries the activation token the recipient must present.
    VerifyAccount { account_id: AccountId, token: String },
    AccountVerified { account_id: AccountId },
    RoleChanged { account_id: AccountId, role: Role },
    AccountDeleted { account_id: AccountId },
    OrderPlaced { order_id: OrderId },
}

impl Notice {
    pub fn subject(&self) -> &'static str {
        match self {
            Notice::VerifyAccount { .. } => "Verify your account",
            Notice::AccountVerified { .. } => "Your account is now verified",
            Notice::RoleChanged { .. } => "Your role has changed",
            Notice::AccountDeleted { .. } => "Your account has been deleted",
            Notice::OrderPlaced { .. } => "Your order has been placed",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, notice: Notice) -> Result<(), NotifyError>;
}

/// Writes a log line per notice. Token values are never logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, recipient: &str, notice: Notice) -> Result<(), NotifyError> {
        tracing::info!(recipient, subject = notice.subject(), "notification sent");
        Ok(())
    }
}

/// Keeps every notice in memory, for tests and local runs.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<(String, Notice)>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, Notice)> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(_) => Vec::new(),
        }
    }

    /// Most recent activation token sent to `recipient`.
    pub fn activation_token_for(&self, recipient: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find_map(|(to, notice)| match notice {
                Notice::VerifyAccount { token, .. } if to == recipient => Some(token),
                _ => None,
            })
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn send(&self, recipient: &str, notice: Notice) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .map_err(|_| NotifyError("outbox lock poisoned".to_string()))?
            .push((recipient.to_string(), notice));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_notifier_finds_latest_token() {
        let notifier = MemoryNotifier::new();
        let account_id = AccountId::new();
        for token in ["first", "second"] {
            notifier
                .send(
                    "a@c.com",
                    Notice::VerifyAccount {
                        account_id,
                        token: token.to_string(),
                    },
                )
                .await
                .unwrap();
        }
        notifier
            .send("a@c.com", Notice::AccountVerified { account_id })
            .await
            .unwrap();

        assert_eq!(notifier.sent().len(), 3);
        assert_eq!(notifier.activation_token_for("a@c.com").as_deref(), Some("second"));
        assert_eq!(notifier.activation_token_for("b@c.com"), None);
    }
}
