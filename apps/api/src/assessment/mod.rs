pub mod grading;
pub mod handlers;
pub mod store;
pub mod submission;
