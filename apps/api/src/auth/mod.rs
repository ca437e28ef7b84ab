pub mod extract;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod store;

pub use extract::CurrentUser;
