use gatehouse_database::{identity_repository, Identity, Role, VerificationStatus};
use serde::Deserialize;
use tracing::{debug, info};

use crate::validation::normalize_email;
use crate::{password, AuthError, Authenticator};

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub identity: Identity,
}

impl LoginOutcome {
    pub fn role(&self) -> Role {
        self.identity.role
    }

    pub fn message(&self) -> &'static str {
        match self.identity.role {
            Role::User => "Login successful",
            Role::Staff => "Login successful. Welcome back to your department.",
            Role::Admin => "Login successful. Welcome back, administrator.",
        }
    }
}

impl Authenticator {
    pub async fn login(&self, request: LoginRequest) -> Result<LoginOutcome, AuthError> {
        let email = normalize_email(&request.email);
        let identity = identity_repository::find_by_email(&self.pool, &email)
            .await?
            .ok_or(AuthError::IdentityNotFound)?;

        match (identity.role, identity.verification_status) {
            (_, VerificationStatus::Verified) => {}
            (Role::Staff, VerificationStatus::Pending) => return Err(AuthError::PendingApproval),
            (Role::Staff, VerificationStatus::Rejected) => return Err(AuthError::Rejected),
            (Role::User | Role::Admin, _) => {
                let message = self.verification_message(&identity)?;
                self.notify(message);
                debug!(email = %identity.email, "login refused until email is verified");
                return Err(AuthError::PendingVerification);
            }
        }

        if !password::verify_password(&request.password, &identity.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue_session(&identity)?;
        info!(identity = %identity.public_id, role = %identity.role, "login succeeded");

        Ok(LoginOutcome { token, identity })
    }
}
