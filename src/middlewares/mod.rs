pub mod auth;
pub mod instructor;
