pub mod course;
pub mod lecture;
pub mod progress;
pub mod purchase;
pub mod tutorial;
pub mod user;
