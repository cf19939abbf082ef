pub mod admin;
pub mod attendance;
pub mod auth;
pub mod enrollment;
pub mod health;
pub mod marks;
pub mod mood;
pub mod parents;
pub mod reports;
pub mod study;
pub mod subjects;
