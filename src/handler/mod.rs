pub mod auth;
pub mod jobs;
pub mod payments;
pub mod users;
