use gatehouse_database::{
    department_repository, identity_repository, Identity, Role, VerificationStatus,
};
use tracing::{error, info};

use crate::validation::normalize_email;
use crate::{AuthError, Authenticator};

/// What the principal presents to prove control of their mailbox.
#[derive(Debug, Clone)]
pub enum VerificationProof {
    /// Signed proof from the verification email.
    Token(String),
    /// Bare email; accepted only when `allow_email_only_verification` is set.
    Email(String),
}

#[derive(Debug, Clone)]
pub struct VerificationOutcome {
    pub identity: Identity,
    /// Set when the owned department was cascaded to Verified.
    pub department_verified: bool,
}

impl Authenticator {
    pub async fn verify_email(
        &self,
        proof: VerificationProof,
    ) -> Result<VerificationOutcome, AuthError> {
        let (email, claimed_role) = match proof {
            VerificationProof::Token(token) => {
                let claims = self.tokens.verify_verification(&token)?;
                (normalize_email(&claims.email), Some(claims.role))
            }
            VerificationProof::Email(email) if self.allow_email_only_verification => {
                (normalize_email(&email), None)
            }
            VerificationProof::Email(_) => return Err(AuthError::InvalidOrExpiredProof),
        };

        let identity = identity_repository::find_by_email(&self.pool, &email)
            .await?
            .ok_or(AuthError::IdentityNotFound)?;

        if claimed_role.is_some_and(|role| role != identity.role) {
            return Err(AuthError::InvalidOrExpiredProof);
        }

        // Staff are verified by approval, never by proof.
        if identity.role == Role::Staff {
            return Err(match identity.verification_status {
                VerificationStatus::Pending => AuthError::PendingApproval,
                VerificationStatus::Verified => AuthError::AlreadyVerified,
                VerificationStatus::Rejected => AuthError::Rejected,
            });
        }

        if identity.is_verified {
            return Err(AuthError::AlreadyVerified);
        }

        let mut tx = self.pool.begin().await?;

        if !identity_repository::mark_verified(&mut *tx, identity.id).await? {
            return Err(AuthError::AlreadyVerified);
        }

        let department_verified = match identity.role {
            Role::Admin => {
                let cascaded =
                    department_repository::mark_verified_for_admin(&mut *tx, identity.id).await?;
                if cascaded == 0 {
                    error!(
                        identity = %identity.public_id,
                        email = %identity.email,
                        "verified admin owns no department; rolling back"
                    );
                    return Err(AuthError::OrphanedAdminDepartment(identity.public_id));
                }
                true
            }
            Role::User | Role::Staff => false,
        };

        tx.commit().await?;

        let identity = identity_repository::find_by_id(&self.pool, identity.id)
            .await?
            .ok_or(AuthError::IdentityNotFound)?;

        info!(
            identity = %identity.public_id,
            role = %identity.role,
            department_verified,
            "email verified"
        );

        Ok(VerificationOutcome {
            identity,
            department_verified,
        })
    }
}
