use gatehouse_database::{
    department_repository, identity_repository, profile_repository, DatabaseError, Identity, Role,
    StaffMember, VerificationStatus,
};
use serde::Deserialize;
use tracing::info;

use crate::{AuthError, Authenticator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffDecision {
    Approve,
    Reject,
}

fn already_decided(status: VerificationStatus) -> AuthError {
    match status {
        VerificationStatus::Verified => AuthError::AlreadyVerified,
        VerificationStatus::Rejected | VerificationStatus::Pending => AuthError::AlreadyDecided,
    }
}

impl Authenticator {
    async fn verified_admin(&self, session_token: &str) -> Result<Identity, AuthError> {
        let caller = self.authenticate(session_token).await?;
        match (caller.role, caller.is_verified) {
            (Role::Admin, true) => Ok(caller),
            _ => Err(AuthError::Forbidden),
        }
    }

    /// Approve or reject a pending Staff identity of the calling Admin's department.
    pub async fn decide_staff(
        &self,
        session_token: &str,
        staff_public_id: &str,
        decision: StaffDecision,
    ) -> Result<Identity, AuthError> {
        let admin = self.verified_admin(session_token).await?;

        let staff = identity_repository::find_by_public_id(&self.pool, staff_public_id)
            .await?
            .ok_or(AuthError::IdentityNotFound)?;
        if staff.role != Role::Staff {
            return Err(AuthError::validation(
                "Only staff registrations require approval",
            ));
        }

        let profile = profile_repository::find_by_identity(&self.pool, staff.id)
            .await?
            .ok_or_else(|| {
                DatabaseError::Corrupt(format!("staff {} has no profile", staff.public_id))
            })?;
        let department = match profile.department_id {
            Some(id) => department_repository::find_by_id(&self.pool, id).await?,
            None => None,
        };
        if department.map(|d| d.admin_identity_id) != Some(admin.id) {
            return Err(AuthError::Forbidden);
        }

        if staff.verification_status != VerificationStatus::Pending {
            return Err(already_decided(staff.verification_status));
        }

        let mut tx = self.pool.begin().await?;
        let changed = match decision {
            StaffDecision::Approve => {
                let changed = identity_repository::mark_verified(&mut *tx, staff.id).await?;
                if changed {
                    profile_repository::set_approved_by(&mut *tx, staff.id, admin.id).await?;
                }
                changed
            }
            StaffDecision::Reject => identity_repository::mark_rejected(&mut *tx, staff.id).await?,
        };

        if !changed {
            drop(tx);
            let current = identity_repository::find_by_id(&self.pool, staff.id)
                .await?
                .map(|identity| identity.verification_status)
                .unwrap_or(VerificationStatus::Rejected);
            return Err(already_decided(current));
        }
        tx.commit().await?;

        info!(
            staff = %staff.public_id,
            admin = %admin.public_id,
            ?decision,
            "staff registration decided"
        );

        identity_repository::find_by_id(&self.pool, staff.id)
            .await?
            .ok_or(AuthError::IdentityNotFound)
    }

    /// Pending Staff of the calling Admin's department.
    pub async fn pending_staff(&self, session_token: &str) -> Result<Vec<StaffMember>, AuthError> {
        let admin = self.verified_admin(session_token).await?;
        let department = department_repository::find_by_admin(&self.pool, admin.id)
            .await?
            .ok_or_else(|| AuthError::OrphanedAdminDepartment(admin.public_id.clone()))?;

        Ok(profile_repository::list_staff_by_department(
            &self.pool,
            department.id,
            VerificationStatus::Pending,
        )
        .await?)
    }
}
