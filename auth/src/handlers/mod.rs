pub mod auth;
pub mod oauth;

pub use auth::configure_auth_routes;
