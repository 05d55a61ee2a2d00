pub mod access;
pub mod progress;
pub mod search;
