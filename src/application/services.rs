use crate::domain::account::{Account, Role};
use crate::domain::actor::Actor;
use crate::domain::department::Department;
use crate::domain::token::SessionToken;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode,
    errors::Error as JwtError,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Sessions expire this long after issuance; expiry is the only revocation.
pub const SESSION_TTL_DAYS: i64 = 7;

pub const DEFAULT_BCRYPT_COST: u32 = 10;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<Department>,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
}

impl Claims {
    /// The caller these claims describe, or None when they are inconsistent.
    pub fn actor(&self) -> Option<Actor> {
        Actor::from_claims(&self.sub, self.role, self.department)
    }
}

/// One-way salted password hashing.
#[derive(Debug, Clone)]
pub struct PasswordService {
    cost: u32,
}

impl PasswordService {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, password: &str) -> Result<String, bcrypt::BcryptError> {
        bcrypt::hash(password, self.cost)
    }

    /// Verifies a plaintext password against the account's hash. A malformed
    /// stored hash counts as a mismatch.
    pub fn verify(&self, account: &Account, password: &str) -> bool {
        account.verify_password(password).unwrap_or_else(|e| {
            warn!(account_id = %account.id, error = %e, "Stored password hash is unusable");
            false
        })
    }
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::new(DEFAULT_BCRYPT_COST)
    }
}

/// Issues and validates HS256 session tokens.
#[derive(Clone)]
pub struct TokenService {
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::days(SESSION_TTL_DAYS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Issues a session token carrying the account's id, role and department.
    #[instrument(name = "issue_token", skip(self, account), fields(account_id = %account.id))]
    pub fn issue(&self, account: &Account) -> Result<SessionToken, JwtError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: account.id.clone(),
            role: account.role(),
            department: account.department(),
            iat: now.timestamp().max(0) as usize,
            exp: expires_at.timestamp().max(0) as usize,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )?;
        info!(role = %claims.role, "Session issued");
        Ok(SessionToken {
            token,
            account_id: account.id.clone(),
            expires_at,
        })
    }

    /// Validates signature and expiry and returns the claims.
    #[instrument(name = "validate_token", skip_all)]
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(&self.secret),
            &Validation::new(Algorithm::HS256),
        )?;
        Ok(token_data.claims)
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::AccountKind;
    use crate::domain::actor::ActorScope;

    fn admin() -> Account {
        Account::new(
            "Lib Admin",
            "lib@example.com",
            bcrypt::hash("secret", 4).unwrap(),
            AccountKind::DepartmentAdmin {
                department: Department::Library,
            },
        )
    }

    #[test]
    fn test_issue_and_validate_round_trip_claims() {
        let service = TokenService::new("test-secret");
        let account = admin();
        let session = service.issue(&account).unwrap();
        let claims = service.validate(&session.token).unwrap();

        assert_eq!(claims.sub, account.id);
        assert_eq!(claims.role, Role::DepartmentAdmin);
        assert_eq!(claims.department, Some(Department::Library));
        assert_eq!(claims.exp - claims.iat, (SESSION_TTL_DAYS * 24 * 3600) as usize);
        assert_eq!(
            claims.actor().unwrap().scope,
            ActorScope::DepartmentAdmin(Department::Library)
        );
        assert!(session.expires_at > Utc::now());
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let session = TokenService::new("one").issue(&admin()).unwrap();
        assert!(TokenService::new("two").validate(&session.token).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let service = TokenService::new("secret").with_ttl(Duration::hours(-2));
        let session = service.issue(&admin()).unwrap();
        assert!(session.expires_at < Utc::now());
        assert!(service.validate(&session.token).is_err());
    }

    #[test]
    fn test_password_service() {
        let service = PasswordService::new(4);
        let mut account = admin();
        account.password_hash = service.hash("hunter22").unwrap();
        assert!(service.verify(&account, "hunter22"));
        assert!(!service.verify(&account, "hunter23"));

        account.password_hash = "not-a-bcrypt-hash".to_string();
        assert!(!service.verify(&account, "hunter22"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", TokenService::new("super-secret-value"));
        assert!(!debug.contains("super-secret-value"));
    }
}
