pub mod achievement;
pub mod assessment;
pub mod chat;
pub mod progress;
pub mod roadmap;
pub mod user;
