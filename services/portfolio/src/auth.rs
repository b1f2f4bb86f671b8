//! Admin credential verification and the session-backed identity

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tower_sessions::{Session, session};

/// Session key under which the authenticated admin is stored
pub const ADMIN_SESSION_KEY: &str = "admin";

/// Verified admin identity, resolved once per request by the auth middleware
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminIdentity {
    pub username: String,
}

/// Checks a username/password pair against an identity source
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Returns the identity when the pair is valid
    async fn verify(&self, username: &str, password: &str) -> Option<AdminIdentity>;
}

/// A single configured credential pair
pub struct StaticCredentials {
    username: String,
    password: String,
}

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[async_trait]
impl CredentialVerifier for StaticCredentials {
    async fn verify(&self, username: &str, password: &str) -> Option<AdminIdentity> {
        // Both fields are always compared so timing does not reveal which one failed
        let user_ok = self.username.as_bytes().ct_eq(username.as_bytes());
        let pass_ok = self.password.as_bytes().ct_eq(password.as_bytes());

        bool::from(user_ok & pass_ok).then(|| AdminIdentity {
            username: self.username.clone(),
        })
    }
}

/// Rejects every login; used when no admin account is configured
pub struct NoCredentials;

#[async_trait]
impl CredentialVerifier for NoCredentials {
    async fn verify(&self, _username: &str, _password: &str) -> Option<AdminIdentity> {
        None
    }
}

/// Mark the session as authenticated, issuing a fresh session id
pub async fn establish_session(
    session: &Session,
    identity: &AdminIdentity,
) -> Result<(), session::Error> {
    session.cycle_id().await?;
    session.insert(ADMIN_SESSION_KEY, identity).await
}

/// Admin identity carried by the session, if any
pub async fn current_admin(session: &Session) -> Result<Option<AdminIdentity>, session::Error> {
    session.get::<AdminIdentity>(ADMIN_SESSION_KEY).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_credentials_accept_exact_pair() {
        let verifier = StaticCredentials::new("admin", "hunter2");

        let identity = verifier.verify("admin", "hunter2").await;
        assert_eq!(
            identity,
            Some(AdminIdentity {
                username: "admin".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_static_credentials_reject_near_misses() {
        let verifier = StaticCredentials::new("admin", "hunter2");

        assert!(verifier.verify("admin", "hunter").await.is_none());
        assert!(verifier.verify("admin", "hunter22").await.is_none());
        assert!(verifier.verify("Admin", "hunter2").await.is_none());
        assert!(verifier.verify("", "").await.is_none());
        assert!(verifier.verify("hunter2", "admin").await.is_none());
    }

    #[tokio::test]
    async fn test_no_credentials_rejects_everything() {
        assert!(NoCredentials.verify("admin", "admin").await.is_none());
        assert!(NoCredentials.verify("", "").await.is_none());
    }
}
