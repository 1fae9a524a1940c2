//! Role-specific profile records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile owned by exactly one identity.
///
/// `department_id` is set for Staff (membership), `approved_by` only once an
/// Admin has approved the Staff identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub identity_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub department_id: Option<i64>,
    pub approved_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProfile {
    pub identity_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub department_id: Option<i64>,
}

/// Staff identity joined with its profile, as listed for a department's Admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffMember {
    pub public_id: String,
    pub email: String,
    pub username: String,
    pub name: String,
    pub phone: Option<String>,
    pub verification_status: super::identity::VerificationStatus,
    pub registered_at: DateTime<Utc>,
}
