//! Entities stored by the identity service

pub mod department;
pub mod identity;
pub mod profile;

pub use department::{Department, NewDepartment};
pub use identity::{Identity, NewIdentity, Role, UnknownRole, VerificationStatus};
pub use profile::{NewProfile, Profile, StaffMember};
