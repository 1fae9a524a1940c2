pub mod auth;
pub mod departments;
pub mod health;
pub mod staff;
