use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Pool, Postgres};
use uuid::Uuid;

use crate::schema::user::CreateUser;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role{
    #[default]
    Student,
    Instructor,
}

#[derive(Debug, Clone, FromRow)]
pub struct User{
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub async fn check_user_exists(pool:&Pool<Postgres>, email:&str) -> Result<bool, sqlx::Error>{

    let result: Option<(Uuid,)> = sqlx::query_as(
        r#"
            SELECT id FROM user_table
            WHERE lower(email) = lower($1)
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(result.is_some())
}

pub async fn create_user(pool:&Pool<Postgres>, user_meta:CreateUser) -> Result<User, sqlx::Error>{

    sqlx::query_as::<_, User>(
        r#"
            INSERT INTO user_table (id, name, email, password, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_meta.name)
    .bind(user_meta.email)
    .bind(user_meta.password)
    .bind(user_meta.role.unwrap_or_default())
    .fetch_one(pool)
    .await
}

pub async fn find_user_by_email(pool:&Pool<Postgres>, email:&str) -> Result<Option<User>, sqlx::Error>{

    sqlx::query_as::<_, User>(
        r#"
            SELECT * FROM user_table
            WHERE lower(email) = lower($1)
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn get_user_by_id(pool:&Pool<Postgres>, id:Uuid) -> Result<Option<User>, sqlx::Error>{

    sqlx::query_as::<_, User>("SELECT * FROM user_table WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update_profile(pool:&Pool<Postgres>, id:Uuid, name:Option<String>, photo_url:Option<String>) -> Result<Option<User>, sqlx::Error>{

    sqlx::query_as::<_, User>(
        r#"
            UPDATE user_table
            SET name = COALESCE($2, name),
                photo_url = COALESCE($3, photo_url),
                updated_at = now()
            WHERE id = $1
            RETURNING *
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(photo_url)
    .fetch_optional(pool)
    .await
}
