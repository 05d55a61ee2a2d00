use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Postgres};
use uuid::Uuid;

use crate::schema::lecture::{CreateTutorial, EditTutorial};

#[derive(Debug, Clone, FromRow)]
pub struct Tutorial{
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub content: String,
    pub video_url: Option<String>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub async fn create_tutorial(pool:&Pool<Postgres>, course_id:Uuid, tutorial:CreateTutorial) -> Result<Tutorial, sqlx::Error>{

    sqlx::query_as::<_, Tutorial>(
        r#"
            INSERT INTO tutorial_table (id, course_id, title, content, video_url, position)
            VALUES ($1, $2, $3, $4, $5,
                (SELECT COALESCE(MAX(position) + 1, 0) FROM tutorial_table WHERE course_id = $2))
            RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(course_id)
    .bind(tutorial.title)
    .bind(tutorial.content)
    .bind(tutorial.video_url)
    .fetch_one(pool)
    .await
}

pub async fn get_course_tutorials(pool:&Pool<Postgres>, course_id:Uuid) -> Result<Vec<Tutorial>, sqlx::Error>{

    sqlx::query_as::<_, Tutorial>(
        r#"
            SELECT * FROM tutorial_table
            WHERE course_id = $1
            ORDER BY position, created_at
        "#,
    )
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub async fn get_tutorial_by_id(pool:&Pool<Postgres>, id:Uuid) -> Result<Option<Tutorial>, sqlx::Error>{

    sqlx::query_as::<_, Tutorial>("SELECT * FROM tutorial_table WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update_tutorial(pool:&Pool<Postgres>, id:Uuid, edit:EditTutorial) -> Result<Tutorial, sqlx::Error>{

    sqlx::query_as::<_, Tutorial>(
        r#"
            UPDATE tutorial_table
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                video_url = COALESCE($4, video_url),
                updated_at = now()
            WHERE id = $1
            RETURNING *
        "#,
    )
    .bind(id)
    .bind(edit.title)
    .bind(edit.content)
    .bind(edit.video_url)
    .fetch_one(pool)
    .await
}

pub async fn delete_tutorial(pool:&Pool<Postgres>, id:Uuid) -> Result<u64, sqlx::Error>{

    let result = sqlx::query("DELETE FROM tutorial_table WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
