//! Registration, verification, approval and login for Gatehouse principals.

use std::sync::Arc;

use gatehouse_config::AuthConfig;
use gatehouse_database::{
    department_repository, identity_repository, profile_repository, Department, Identity, Profile,
    Role, VerificationStatus,
};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

mod approval;
mod error;
mod login;
pub mod notifier;
pub mod password;
mod registration;
pub mod tokens;
pub mod validation;
mod verification;

pub use approval::StaffDecision;
pub use error::{AuthError, ErrorKind};
pub use login::{LoginOutcome, LoginRequest};
pub use notifier::{
    LogNotifier, NotifierError, RecordingNotifier, VerificationMessage, VerificationNotifier,
};
pub use registration::{DepartmentInput, RegistrationOutcome, RegistrationRequest};
pub use tokens::{SessionClaims, TokenIssuer, VerificationClaims};
pub use verification::{VerificationOutcome, VerificationProof};

#[derive(Clone)]
pub struct Authenticator {
    pool: SqlitePool,
    tokens: Arc<TokenIssuer>,
    notifier: Arc<dyn VerificationNotifier>,
    allow_email_only_verification: bool,
}

/// The caller behind a session token together with its profile and, for
/// Admins and Staff, its department.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub identity: Identity,
    pub profile: Option<Profile>,
    pub department: Option<Department>,
}

impl Authenticator {
    pub fn new(
        pool: SqlitePool,
        config: AuthConfig,
        notifier: Arc<dyn VerificationNotifier>,
    ) -> Self {
        Self {
            pool,
            tokens: Arc::new(TokenIssuer::new(&config)),
            notifier,
            allow_email_only_verification: config.allow_email_only_verification,
        }
    }

    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Resolve a session token to the identity it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self.tokens.verify_session(token)?;
        identity_repository::find_by_public_id(&self.pool, &claims.sub)
            .await?
            .ok_or(AuthError::InvalidOrExpiredProof)
    }

    pub async fn current_principal(&self, token: &str) -> Result<Principal, AuthError> {
        let identity = self.authenticate(token).await?;
        let profile = profile_repository::find_by_identity(&self.pool, identity.id).await?;

        let department = match identity.role {
            Role::Admin => department_repository::find_by_admin(&self.pool, identity.id).await?,
            Role::Staff => match profile.as_ref().and_then(|p| p.department_id) {
                Some(department_id) => {
                    department_repository::find_by_id(&self.pool, department_id).await?
                }
                None => None,
            },
            Role::User => None,
        };

        Ok(Principal {
            identity,
            profile,
            department,
        })
    }

    /// Departments a Staff member may choose at registration.
    pub async fn verified_departments(&self) -> Result<Vec<Department>, AuthError> {
        Ok(department_repository::list_by_status(&self.pool, VerificationStatus::Verified).await?)
    }

    fn verification_message(&self, identity: &Identity) -> Result<VerificationMessage, AuthError> {
        let token = self
            .tokens
            .issue_verification(&identity.email, identity.role)?;
        Ok(VerificationMessage {
            email: identity.email.clone(),
            role: identity.role,
            token,
        })
    }

    fn notify(&self, message: VerificationMessage) {
        debug!(email = %message.email, role = %message.role, "dispatching verification message");
        notifier::dispatch(self.notifier.clone(), message);
    }
}
