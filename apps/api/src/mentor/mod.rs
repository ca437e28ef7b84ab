pub mod chat;
pub mod handlers;
pub mod prompts;
pub mod store;
