pub mod access;
pub mod aggregation;
pub mod attendance;
pub mod csv_export;
pub mod marks;
pub mod mood;
pub mod recommendations;
pub mod roster;
