pub mod attendance;
pub mod batch;
pub mod mark;
pub mod mood;
pub mod parent_child;
pub mod study;
pub mod subject;
pub mod user;
