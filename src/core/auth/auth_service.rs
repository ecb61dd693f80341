use std::sync::Arc;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use super::auth_models::{Session, SessionClaims, SignedSession, User, DEFAULT_ROLE};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Invalid or expired session token")]
    InvalidToken,
    #[error("User store error: {0}")]
    Store(String),
    #[error("Failed to sign session token: {0}")]
    Token(String),
    #[error("Failed to hash password: {0}")]
    PasswordHash(String),
}

/// Lookup and creation of users in the user database.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;
    async fn insert_user(&self, user: &User) -> Result<(), AuthError>;
}

/// Issues and verifies HS256 session tokens.
pub struct SessionSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionSigner {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn issue(&self, user: &User) -> Result<SignedSession, AuthError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;

        let claims = SessionClaims {
            sub: user.id.clone(),
            email: Some(user.email.clone()),
            name: user.name.clone(),
            role: user.role.clone().unwrap_or_else(|| DEFAULT_ROLE.to_string()),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::Token(e.to_string()))?;
        let session = session_from_claims(claims)?;

        Ok(SignedSession { token, session })
    }

    pub fn verify(&self, token: &str) -> Result<Session, AuthError> {
        let data = decode::<SessionClaims>(token, &self.decoding, &Validation::default())
            .map_err(|e| {
                tracing::debug!("Rejected session token: {}", e);
                AuthError::InvalidToken
            })?;
        session_from_claims(data.claims)
    }
}

fn session_from_claims(claims: SessionClaims) -> Result<Session, AuthError> {
    let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(AuthError::InvalidToken)?;
    Ok(Session {
        user_id: claims.sub,
        email: claims.email,
        name: claims.name,
        role: claims.role,
        expires_at,
    })
}

/// Argon2id hash of `password` with a random salt, as a PHC string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check `password` against a stored PHC string. Unparseable hashes never match.
pub fn password_matches(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Credentials sign-in and session-token checks.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    signer: SessionSigner,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, signer: SessionSigner) -> Self {
        Self { users, signer }
    }

    /// Sign in with email and password, returning a fresh session token.
    ///
    /// Every failure (blank fields, unknown user, no stored password, wrong
    /// password) surfaces as `InvalidCredentials`.
    pub async fn sign_in_with_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignedSession, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let Some(hash) = &user.password_hash else {
            tracing::debug!("User {} has no password set", user.id);
            return Err(AuthError::InvalidCredentials);
        };
        if !password_matches(password, hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let signed = self.signer.issue(&user)?;
        tracing::info!(user_id = %user.id, role = %signed.session.role, "User signed in");
        Ok(signed)
    }

    pub fn session_from_token(&self, token: &str) -> Result<Session, AuthError> {
        self.signer.verify(token)
    }

    /// Create a password user unless one with this email already exists.
    pub async fn ensure_user(
        &self,
        email: &str,
        name: Option<&str>,
        password: &str,
        role: Option<&str>,
    ) -> Result<User, AuthError> {
        let email = email.trim();
        if let Some(existing) = self.users.find_by_email(email).await? {
            tracing::debug!("User {} already exists", email);
            return Ok(existing);
        }

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
            name: name.map(str::to_string),
            role: role.map(str::to_string),
            password_hash: Some(hash_password(password)?),
        };
        self.users.insert_user(&user).await?;

        tracing::info!(user_id = %user.id, "Created user {}", user.email);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::InMemoryUserStore;

    const SECRET: &[u8] = b"test-secret";

    fn service() -> (AuthService, Arc<InMemoryUserStore>) {
        let users = Arc::new(InMemoryUserStore::default());
        let signer = SessionSigner::new(SECRET, Duration::days(30));
        (AuthService::new(users.clone(), signer), users)
    }

    #[test]
    fn passwords_are_stored_as_argon2_phc_strings() {
        let hash = hash_password("hunter2").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("hunter2"));
        assert!(password_matches("hunter2", &hash));
        assert!(!password_matches("hunter3", &hash));
    }

    #[test]
    fn same_password_gets_a_fresh_salt() {
        let first = hash_password("hunter2").unwrap();
        let second = hash_password("hunter2").unwrap();

        assert_ne!(first, second);
        assert!(password_matches("hunter2", &second));
    }

    #[test]
    fn unparseable_stored_hash_never_matches() {
        assert!(!password_matches("hunter2", "not-a-phc-string"));
        assert!(!password_matches("hunter2", ""));
        // Bare hex digest, no algorithm or salt.
        assert!(!password_matches(
            "hunter2",
            "4b6f3c1d2e9a8f7b6c5d4e3f2a1b0c9d8e7f6a5b4c3d2e1f0a9b8c7d6e5f4a3b"
        ));
    }

    #[tokio::test]
    async fn sign_in_issues_verifiable_token() {
        let (service, _) = service();
        service
            .ensure_user("ann@x.com", Some("Ann"), "pw", Some("admin"))
            .await
            .unwrap();

        let signed = service
            .sign_in_with_credentials("ann@x.com", "pw")
            .await
            .unwrap();
        let session = service.session_from_token(&signed.token).unwrap();

        assert_eq!(session, signed.session);
        assert_eq!(session.role, "admin");
        assert_eq!(session.email.as_deref(), Some("ann@x.com"));
        assert!(session.expires_at > Utc::now() + Duration::days(29));
    }

    #[tokio::test]
    async fn role_defaults_to_user() {
        let (service, _) = service();
        service.ensure_user("bo@x.com", None, "pw", None).await.unwrap();

        let signed = service
            .sign_in_with_credentials("bo@x.com", "pw")
            .await
            .unwrap();
        assert_eq!(signed.session.role, DEFAULT_ROLE);
    }

    #[tokio::test]
    async fn sign_in_rejects_bad_credentials() {
        let (service, users) = service();
        service.ensure_user("cid@x.com", None, "pw", None).await.unwrap();
        users.insert(User {
            id: "oauth-only".to_string(),
            email: "oauth@x.com".to_string(),
            name: None,
            role: None,
            password_hash: None,
        });

        for (email, password) in [
            ("", "pw"),
            ("cid@x.com", ""),
            ("nobody@x.com", "pw"),
            ("cid@x.com", "wrong"),
            ("oauth@x.com", "pw"),
        ] {
            let result = service.sign_in_with_credentials(email, password).await;
            assert!(
                matches!(result, Err(AuthError::InvalidCredentials)),
                "{email}/{password} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn ensure_user_is_idempotent() {
        let (service, users) = service();
        let first = service.ensure_user("dee@x.com", None, "pw", None).await.unwrap();
        let second = service
            .ensure_user("dee@x.com", None, "other", None)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(users.len(), 1);
    }

    #[test]
    fn tampered_or_foreign_tokens_are_rejected() {
        let (service, _) = service();
        let user = User {
            id: "u1".to_string(),
            email: "e@x.com".to_string(),
            name: None,
            role: None,
            password_hash: None,
        };

        let foreign = SessionSigner::new(b"another-secret", Duration::days(1))
            .issue(&user)
            .unwrap();
        assert!(matches!(
            service.session_from_token(&foreign.token),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            service.session_from_token("not.a.token"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let signer = SessionSigner::new(SECRET, Duration::days(1));
        let past = Utc::now() - Duration::hours(2);
        let claims = SessionClaims {
            sub: "u1".to_string(),
            email: None,
            name: None,
            role: DEFAULT_ROLE.to_string(),
            iat: (past - Duration::hours(1)).timestamp(),
            exp: past.timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert!(matches!(signer.verify(&token), Err(AuthError::InvalidToken)));
    }
}
