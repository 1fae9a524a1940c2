//! Department entity definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::VerificationStatus;

/// Organisational unit owned by a single Admin identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    #[serde(skip_serializing)]
    pub id: i64,
    pub public_id: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing)]
    pub admin_identity_id: i64,
    pub verification_status: VerificationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDepartment {
    pub name: String,
    pub description: String,
    pub admin_identity_id: i64,
}
