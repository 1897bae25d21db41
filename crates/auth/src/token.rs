//! Signed bearer tokens (RS256).
//!
//! The issuer holds the RSA private key; the verifier only needs the public
//! key, so services that merely check tokens never see signing material.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use backoffice_core::AccountId;

use crate::claims::{Claims, TokenPurpose, TokenValidationError, validate_claims};
use crate::Role;

/// Lifetime of a session token, in seconds (one day).
pub const SESSION_TTL_SECS: i64 = 24 * 60 * 60;

/// Lifetime of an activation token, in seconds (ten minutes).
pub const ACTIVATION_TTL_SECS: i64 = 10 * 60;

pub fn session_ttl() -> Duration {
    Duration::seconds(SESSION_TTL_SECS)
}

pub fn activation_ttl() -> Duration {
    Duration::seconds(ACTIVATION_TTL_SECS)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error(transparent)]
    Window(#[from] TokenValidationError),

    #[error("token issued for {actual:?}, expected {expected:?}")]
    WrongPurpose {
        expected: TokenPurpose,
        actual: TokenPurpose,
    },

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("token signing failed: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Window(TokenValidationError::Expired),
            _ => TokenError::Malformed,
        }
    }
}

/// Token validation seam used by request middleware.
pub trait TokenValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError>;
}

/// Signs tokens with an RSA private key.
#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
}

impl core::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenIssuer").finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Load a PKCS#1 or PKCS#8 PEM-encoded RSA private key.
    pub fn from_rsa_pem(pem: &[u8]) -> Result<Self, TokenError> {
        let key = EncodingKey::from_rsa_pem(pem).map_err(|e| TokenError::InvalidKey(e.to_string()))?;
        Ok(Self { key })
    }

    /// Issue a session token valid for `ttl` from now.
    pub fn issue(&self, subject: AccountId, role: Option<Role>, ttl: Duration) -> Result<String, TokenError> {
        self.issue_at(subject, role, ttl, TokenPurpose::Session, Utc::now())
    }

    /// Issue a one-day session token carrying the account's current role.
    pub fn issue_session(&self, subject: AccountId, role: Role) -> Result<String, TokenError> {
        self.issue(subject, Some(role), session_ttl())
    }

    /// Issue a one-day session token for a plain account, which holds no role.
    pub fn issue_plain_session(&self, subject: AccountId) -> Result<String, TokenError> {
        self.issue(subject, None, session_ttl())
    }

    /// Issue a short-lived activation token. Activation tokens never carry a role.
    pub fn issue_activation(&self, subject: AccountId) -> Result<String, TokenError> {
        self.issue_at(subject, None, activation_ttl(), TokenPurpose::Activation, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject: AccountId,
        role: Option<Role>,
        ttl: Duration,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: subject,
            role: role.map(|r| r.as_str().to_string()),
            issued_at: now,
            expires_at: now + ttl,
            purpose,
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }
}

/// Verifies tokens with an RSA public key.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl core::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenVerifier").finish_non_exhaustive()
    }
}

impl TokenVerifier {
    /// Load a PEM-encoded RSA public key.
    pub fn from_rsa_pem(pem: &[u8]) -> Result<Self, TokenError> {
        let key = DecodingKey::from_rsa_pem(pem).map_err(|e| TokenError::InvalidKey(e.to_string()))?;

        // Time checks are done by `validate_claims` against an explicit `now`.
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        Ok(Self { key, validation })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Check signature and structure, then the time window at `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }

    pub fn verify_purpose(&self, token: &str, purpose: TokenPurpose) -> Result<Claims, TokenError> {
        self.verify_purpose_at(token, purpose, Utc::now())
    }

    /// Like [`TokenVerifier::verify_at`], additionally requiring `purpose`.
    pub fn verify_purpose_at(
        &self,
        token: &str,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> Result<Claims, TokenError> {
        let claims = self.verify_at(token, now)?;
        if claims.purpose != purpose {
            return Err(TokenError::WrongPurpose {
                expected: purpose,
                actual: claims.purpose,
            });
        }
        Ok(claims)
    }
}

impl TokenValidator for TokenVerifier {
    /// Only session tokens authenticate API requests.
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        self.verify_purpose_at(token, TokenPurpose::Session, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PRIVATE_PEM: &[u8] = include_bytes!("../testdata/token_private.pem");
    const PUBLIC_PEM: &[u8] = include_bytes!("../testdata/token_public.pem");
    const OTHER_PRIVATE_PEM: &[u8] = include_bytes!("../testdata/other_private.pem");

    fn issuer() -> TokenIssuer {
        TokenIssuer::from_rsa_pem(PRIVATE_PEM).unwrap()
    }

    fn verifier() -> TokenVerifier {
        TokenVerifier::from_rsa_pem(PUBLIC_PEM).unwrap()
    }

    #[test]
    fn session_token_carries_subject_and_role() {
        let subject = AccountId::new();
        let token = issuer().issue_session(subject, Role::Owner).unwrap();

        let claims = verifier().verify(&token).unwrap();
        assert_eq!(claims.sub, subject);
        assert_eq!(claims.role.as_deref(), Some("owner"));
        assert_eq!(claims.purpose, TokenPurpose::Session);
        assert_eq!(claims.expires_at - claims.issued_at, session_ttl());
    }

    #[test]
    fn plain_session_token_has_no_role() {
        let subject = AccountId::new();
        let token = issuer().issue_plain_session(subject).unwrap();

        let claims = verifier().validate(&token, Utc::now()).unwrap();
        assert_eq!(claims.sub, subject);
        assert_eq!(claims.role, None);
        assert_eq!(claims.purpose, TokenPurpose::Session);
    }

    #[test]
    fn activation_token_has_no_role_and_is_not_a_session() {
        let subject = AccountId::new();
        let token = issuer().issue_activation(subject).unwrap();

        let claims = verifier()
            .verify_purpose_at(&token, TokenPurpose::Activation, Utc::now())
            .unwrap();
        assert_eq!(claims.sub, subject);
        assert_eq!(claims.role, None);
        assert_eq!(claims.expires_at - claims.issued_at, activation_ttl());

        assert!(matches!(
            verifier().validate(&token, Utc::now()),
            Err(TokenError::WrongPurpose { .. })
        ));
    }

    #[test]
    fn zero_ttl_token_fails() {
        let token = issuer()
            .issue(AccountId::new(), Some(Role::Support), Duration::zero())
            .unwrap();
        assert!(matches!(verifier().verify(&token), Err(TokenError::Window(_))));
    }

    #[test]
    fn elapsed_token_fails() {
        let issued = Utc::now() - Duration::hours(2);
        let token = issuer()
            .issue_at(AccountId::new(), None, Duration::hours(1), TokenPurpose::Session, issued)
            .unwrap();
        assert_eq!(
            verifier().verify(&token),
            Err(TokenError::Window(TokenValidationError::Expired))
        );
    }

    #[test]
    fn token_signed_by_another_key_fails() {
        let foreign = TokenIssuer::from_rsa_pem(OTHER_PRIVATE_PEM).unwrap();
        let token = foreign.issue_session(AccountId::new(), Role::Administrator).unwrap();
        assert_eq!(verifier().verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn spliced_signature_fails() {
        let weak = issuer().issue_session(AccountId::new(), Role::Support).unwrap();
        let strong = issuer().issue_session(AccountId::new(), Role::Administrator).unwrap();

        // Header and payload of one token, signature of the other.
        let (strong_body, _) = strong.rsplit_once('.').unwrap();
        let (_, weak_sig) = weak.rsplit_once('.').unwrap();
        let forged = format!("{strong_body}.{weak_sig}");

        assert_eq!(verifier().verify(&forged), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        for bad in ["", "abc", "a.b.c", "Bearer x.y.z"] {
            assert_eq!(verifier().verify(bad), Err(TokenError::Malformed), "{bad:?}");
        }
    }

    #[test]
    fn rejects_non_pem_key() {
        assert!(matches!(
            TokenVerifier::from_rsa_pem(b"not a key"),
            Err(TokenError::InvalidKey(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 16,
            ..ProptestConfig::default()
        })]

        /// Property: verifying a freshly issued token yields the issued subject and role.
        #[test]
        fn verify_returns_issued_identity(
            role_idx in proptest::option::of(0usize..Role::ALL.len()),
            ttl_secs in 1i64..(30 * 24 * 60 * 60),
        ) {
            let subject = AccountId::new();
            let role = role_idx.map(|i| Role::ALL[i]);
            let now = Utc::now();
            let token = issuer()
                .issue_at(subject, role, Duration::seconds(ttl_secs), TokenPurpose::Session, now)
                .unwrap();

            let claims = verifier().verify_at(&token, now).unwrap();
            prop_assert_eq!(claims.sub, subject);
            prop_assert_eq!(claims.role, role.map(|r| r.as_str().to_string()));
        }
    }
}
