use backoffice_core::AccountId;

/// Authenticated caller for a request, taken from a verified session token.
///
/// The role is the raw claim; it is only trusted after the authorizer has
/// checked it against the stored account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    account_id: AccountId,
    claimed_role: Option<String>,
}

impl PrincipalContext {
    pub fn new(account_id: AccountId, claimed_role: Option<String>) -> Self {
        Self {
            account_id,
            claimed_role,
        }
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn claimed_role(&self) -> Option<&str> {
        self.claimed_role.as_deref()
    }
}
