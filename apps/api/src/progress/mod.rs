pub mod badges;
pub mod handlers;
pub mod review;
pub mod store;
pub mod streak;
pub mod tracker;
