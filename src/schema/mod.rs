use serde::{Deserialize, Serialize};

use crate::models::user::Role;

pub mod form;
pub mod user;
pub mod course;
pub mod lecture;
pub mod purchase;
pub mod progress;

#[derive(Deserialize, Serialize, Debug)]
pub struct JWTClaims{
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MessageResponse{
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }
}
