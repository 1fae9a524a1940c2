use gatehouse_database::{
    department_repository, identity_repository, profile_repository, DatabaseError, Department,
    Identity, NewDepartment, NewIdentity, NewProfile, Role,
};
use serde::Deserialize;
use tracing::info;

use crate::validation::{self, normalize_email};
use crate::{password, AuthError, Authenticator};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
    /// Raw role name, matched case-insensitively.
    pub user_type: String,
    pub department: Option<DepartmentInput>,
}

/// Department details: `name`/`description` for an Admin creating one, `id`
/// (the department's public id) for Staff joining one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepartmentInput {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    pub identity: Identity,
    pub department: Option<Department>,
}

impl RegistrationOutcome {
    /// Staff wait for an Admin, everyone else for their verification email.
    pub fn awaiting_approval(&self) -> bool {
        self.identity.role.requires_approval()
    }

    pub fn message(&self) -> &'static str {
        if self.awaiting_approval() {
            "Staff registered. Awaiting admin approval."
        } else {
            "User registered. Verification email sent."
        }
    }
}

enum DepartmentPlan {
    Create { name: String, description: String },
    Join { public_id: String },
    None,
}

fn plan_department(
    role: Role,
    input: Option<&DepartmentInput>,
) -> Result<DepartmentPlan, AuthError> {
    let non_blank = |value: Option<&String>| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    match role {
        Role::Admin => {
            let name = non_blank(input.and_then(|d| d.name.as_ref()))
                .ok_or(AuthError::MissingDepartment)?;
            validation::validate_department_name(&name)?;
            let description = input
                .and_then(|d| d.description.as_ref())
                .map(|d| d.trim().to_string())
                .unwrap_or_default();
            Ok(DepartmentPlan::Create { name, description })
        }
        Role::Staff => {
            let public_id =
                non_blank(input.and_then(|d| d.id.as_ref())).ok_or(AuthError::MissingDepartment)?;
            Ok(DepartmentPlan::Join { public_id })
        }
        Role::User => Ok(DepartmentPlan::None),
    }
}

fn duplicate_as_conflict(error: DatabaseError) -> AuthError {
    if error.is_duplicate() {
        AuthError::DuplicateIdentity
    } else {
        AuthError::Database(error)
    }
}

impl Authenticator {
    /// Create an identity, its profile and (for Admins) its department in one
    /// transaction, then send the verification proof to Users and Admins.
    pub async fn register(
        &self,
        request: RegistrationRequest,
    ) -> Result<RegistrationOutcome, AuthError> {
        let role: Role = request
            .user_type
            .parse()
            .map_err(|_| AuthError::InvalidRole(request.user_type.clone()))?;

        let email = normalize_email(&request.email);
        let username = request.username.trim().to_string();
        let name = request.name.trim().to_string();
        let phone = request
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        validation::validate_email(&email)?;
        validation::validate_username(&username)?;
        validation::validate_password(&request.password)?;
        validation::validate_name(&name)?;
        if let Some(phone) = phone.as_deref() {
            validation::validate_phone(phone)?;
        }
        let plan = plan_department(role, request.department.as_ref())?;

        if identity_repository::exists_by_email_or_username(&self.pool, &email, &username).await? {
            return Err(AuthError::DuplicateIdentity);
        }

        let password_hash = password::hash_password(&request.password)?;

        let mut tx = self.pool.begin().await?;

        let identity = identity_repository::insert(
            &mut *tx,
            &NewIdentity {
                email,
                username,
                password_hash,
                role,
            },
        )
        .await
        .map_err(duplicate_as_conflict)?;

        let mut profile = NewProfile {
            identity_id: identity.id,
            name,
            phone,
            department_id: None,
        };

        let department = match plan {
            DepartmentPlan::Create { name, description } => {
                profile_repository::insert(&mut *tx, &profile).await?;
                let department = department_repository::insert(
                    &mut *tx,
                    &NewDepartment {
                        name,
                        description,
                        admin_identity_id: identity.id,
                    },
                )
                .await?;
                Some(department)
            }
            DepartmentPlan::Join { public_id } => {
                let department = department_repository::find_by_public_id(&mut *tx, &public_id)
                    .await?
                    .ok_or(AuthError::MissingDepartment)?;
                profile.department_id = Some(department.id);
                profile_repository::insert(&mut *tx, &profile).await?;
                Some(department)
            }
            DepartmentPlan::None => {
                profile_repository::insert(&mut *tx, &profile).await?;
                None
            }
        };

        let message = match role {
            Role::User | Role::Admin => Some(self.verification_message(&identity)?),
            Role::Staff => None,
        };

        tx.commit().await?;

        info!(
            identity = %identity.public_id,
            email = %identity.email,
            role = %identity.role,
            "registered identity"
        );

        if let Some(message) = message {
            self.notify(message);
        }

        Ok(RegistrationOutcome {
            identity,
            department,
        })
    }
}
