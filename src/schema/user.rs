use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{models::user::{Role, User}, schema::course::CourseResponse};

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateUser{
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct EmailAndPassword{
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfile{
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(url)]
    pub photo_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse{
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            photo_url: user.photo_url,
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse{
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse{
    pub success: bool,
    pub user: UserResponse,
    pub enrolled_courses: Vec<CourseResponse>,
}
