use crate::application::commands::{ExternalLoginCommand, LoginCommand, RegisterAccountCommand};
use crate::application::errors::ServiceError;
use crate::application::services::{PasswordService, TokenService};
use crate::application::validators::AccountValidator;
use crate::domain::account::{Account, AccountKind};
use crate::domain::token::SessionToken;
use crate::infrastructure::{AccountRepository, RepositoryError};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

const DUPLICATE_EMAIL: &str = "User already exists with this email";
const EXTERNAL_DEFAULT_NAME: &str = "Google User";

/// A freshly issued session and the account it belongs to.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: SessionToken,
    pub account: Account,
}

/// Registration and authentication.
pub struct AccountService {
    accounts: Arc<dyn AccountRepository>,
    passwords: PasswordService,
    tokens: TokenService,
}

impl AccountService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        passwords: PasswordService,
        tokens: TokenService,
    ) -> Self {
        Self {
            accounts,
            passwords,
            tokens,
        }
    }

    #[instrument(name = "register_account", skip_all)]
    pub async fn register(
        &self,
        command: RegisterAccountCommand,
    ) -> Result<AuthSession, ServiceError> {
        let registration = AccountValidator::validate_registration(&command)?;
        if self
            .accounts
            .find_by_email(&registration.email)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(DUPLICATE_EMAIL.to_string()));
        }

        let hash = self.passwords.hash(&registration.password)?;
        let account = Account::new(
            &registration.name,
            &registration.email,
            hash,
            registration.kind,
        );
        match self.accounts.insert(&account).await {
            Ok(()) => {}
            Err(RepositoryError::Duplicate(_)) => {
                return Err(ServiceError::Conflict(DUPLICATE_EMAIL.to_string()));
            }
            Err(e) => return Err(e.into()),
        }
        info!(account_id = %account.id, role = %account.role(), "Account registered");
        self.session_for(account)
    }

    /// Identical failure whether the email is unknown or the password wrong.
    #[instrument(name = "login", skip_all)]
    pub async fn login(&self, command: LoginCommand) -> Result<AuthSession, ServiceError> {
        let credentials = AccountValidator::validate_login(&command)?;
        let Some(account) = self.accounts.find_by_email(&credentials.email).await? else {
            warn!("Login failed");
            return Err(ServiceError::invalid_credentials());
        };
        if !self.passwords.verify(&account, &credentials.password) {
            warn!(account_id = %account.id, "Login failed");
            return Err(ServiceError::invalid_credentials());
        }
        info!(account_id = %account.id, "Login succeeded");
        self.session_for(account)
    }

    /// Signs in a caller vouched for by an external identity provider,
    /// creating a student account on first use. No password is checked.
    #[instrument(name = "external_login", skip_all)]
    pub async fn external_login(
        &self,
        command: ExternalLoginCommand,
    ) -> Result<AuthSession, ServiceError> {
        let identity = AccountValidator::validate_external_login(&command)?;
        if let Some(account) = self.accounts.find_by_email(&identity.email).await? {
            return self.session_for(account);
        }

        // Placeholder secret nobody knows, so password login stays closed.
        let placeholder = self.passwords.hash(&Uuid::new_v4().to_string())?;
        let account = Account::new(
            identity.name.as_deref().unwrap_or(EXTERNAL_DEFAULT_NAME),
            &identity.email,
            placeholder,
            AccountKind::Student {
                student_id: format!("G-{}", Uuid::new_v4().simple()),
            },
        );
        let account = match self.accounts.insert(&account).await {
            Ok(()) => {
                info!(account_id = %account.id, "Account created from external identity");
                account
            }
            // Lost a race with a concurrent first login for the same email.
            Err(RepositoryError::Duplicate(_)) => self
                .accounts
                .find_by_email(&identity.email)
                .await?
                .ok_or_else(|| {
                    ServiceError::Unexpected("account vanished after duplicate insert".to_string())
                })?,
            Err(e) => return Err(e.into()),
        };
        self.session_for(account)
    }

    fn session_for(&self, account: Account) -> Result<AuthSession, ServiceError> {
        let token = self
            .tokens
            .issue(&account)
            .map_err(|e| ServiceError::Unexpected(format!("Token issuance failed: {e}")))?;
        Ok(AuthSession { token, account })
    }
}
