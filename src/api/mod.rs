pub mod auth;
pub mod flights;
pub mod payments;
pub mod status;
pub mod webhooks;
