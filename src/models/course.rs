use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{domain::search::{PriceSort, SearchFilter}, schema::course::UpdateCourse};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "course_level", rename_all = "lowercase")]
#[serde(rename_all = "PascalCase")]
pub enum CourseLevel{
    Beginner,
    Medium,
    Advance,
}

#[derive(Debug, Clone, FromRow)]
pub struct Course{
    pub id: Uuid,
    pub creator_id: Uuid,
    pub course_title: String,
    pub sub_title: Option<String>,
    pub description: Option<String>,
    pub category: String,
    pub course_level: Option<CourseLevel>,
    pub course_price: Option<i32>,
    pub course_thumbnail: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn is_free(&self) -> bool {
        self.course_price.unwrap_or(0) == 0
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CourseWithCreator{
    #[sqlx(flatten)]
    pub course: Course,
    pub creator_name: String,
    pub creator_photo_url: Option<String>,
}

const WITH_CREATOR: &str = r#"
    SELECT c.*, u.name AS creator_name, u.photo_url AS creator_photo_url
    FROM course_table c
    JOIN user_table u ON u.id = c.creator_id
"#;

pub async fn create_course(pool:&Pool<Postgres>, creator_id:Uuid, title:&str, category:&str) -> Result<Course, sqlx::Error>{

    sqlx::query_as::<_, Course>(
        r#"
            INSERT INTO course_table (id, creator_id, course_title, category)
            VALUES ($1, $2, $3, $4)
            RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(creator_id)
    .bind(title)
    .bind(category)
    .fetch_one(pool)
    .await
}

pub async fn get_course_by_id(pool:&Pool<Postgres>, id:Uuid) -> Result<Option<Course>, sqlx::Error>{

    sqlx::query_as::<_, Course>("SELECT * FROM course_table WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_course_with_creator(pool:&Pool<Postgres>, id:Uuid) -> Result<Option<CourseWithCreator>, sqlx::Error>{

    sqlx::query_as::<_, CourseWithCreator>(&format!("{WITH_CREATOR} WHERE c.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update_course(pool:&Pool<Postgres>, id:Uuid, updated_course:UpdateCourse) -> Result<Course, sqlx::Error>{

    sqlx::query_as::<_, Course>(
        r#"
            UPDATE course_table
            SET course_title = COALESCE($2, course_title),
                sub_title = COALESCE($3, sub_title),
                description = COALESCE($4, description),
                category = COALESCE($5, category),
                course_level = COALESCE($6, course_level),
                course_price = COALESCE($7, course_price),
                course_thumbnail = COALESCE($8, course_thumbnail),
                updated_at = now()
            WHERE id = $1
            RETURNING *
        "#,
    )
    .bind(id)
    .bind(updated_course.course_title)
    .bind(updated_course.sub_title)
    .bind(updated_course.description)
    .bind(updated_course.category)
    .bind(updated_course.course_level)
    .bind(updated_course.course_price)
    .bind(updated_course.course_thumbnail)
    .fetch_one(pool)
    .await
}

pub async fn set_published(pool:&Pool<Postgres>, id:Uuid, publish:bool) -> Result<Course, sqlx::Error>{

    sqlx::query_as::<_, Course>(
        r#"
            UPDATE course_table
            SET is_published = $2, updated_at = now()
            WHERE id = $1
            RETURNING *
        "#,
    )
    .bind(id)
    .bind(publish)
    .fetch_one(pool)
    .await
}

pub async fn get_creator_courses(pool:&Pool<Postgres>, creator_id:Uuid) -> Result<Vec<Course>, sqlx::Error>{

    sqlx::query_as::<_, Course>(
        r#"
            SELECT * FROM course_table
            WHERE creator_id = $1
            ORDER BY created_at DESC
        "#,
    )
    .bind(creator_id)
    .fetch_all(pool)
    .await
}

pub async fn get_published_courses(pool:&Pool<Postgres>) -> Result<Vec<CourseWithCreator>, sqlx::Error>{

    sqlx::query_as::<_, CourseWithCreator>(&format!(
        "{WITH_CREATOR} WHERE c.is_published = TRUE ORDER BY c.created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn search_courses(pool:&Pool<Postgres>, filter:&SearchFilter) -> Result<Vec<CourseWithCreator>, sqlx::Error>{

    let mut builder = QueryBuilder::<Postgres>::new(WITH_CREATOR);
    builder.push(" WHERE c.is_published = TRUE");

    if let Some(pattern) = filter.like_pattern() {
        builder
            .push(" AND (c.course_title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR c.sub_title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR c.category ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if !filter.categories.is_empty() {
        builder
            .push(" AND lower(c.category) = ANY(")
            .push_bind(filter.categories.clone())
            .push(")");
    }

    builder.push(match filter.sort {
        PriceSort::Newest => " ORDER BY c.created_at DESC",
        PriceSort::LowToHigh => " ORDER BY c.course_price ASC NULLS FIRST, c.created_at DESC",
        PriceSort::HighToLow => " ORDER BY c.course_price DESC NULLS LAST, c.created_at DESC",
    });

    builder.build_query_as::<CourseWithCreator>().fetch_all(pool).await
}

pub async fn get_enrolled_courses(pool:&Pool<Postgres>, user_id:Uuid) -> Result<Vec<CourseWithCreator>, sqlx::Error>{

    sqlx::query_as::<_, CourseWithCreator>(&format!(
        "{WITH_CREATOR} JOIN enrollment_table e ON e.course_id = c.id WHERE e.user_id = $1 ORDER BY e.created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Lectures, sub-lectures, tutorials, progress and purchases go with it (FK cascade).
pub async fn delete_course(pool:&Pool<Postgres>, id:Uuid) -> Result<u64, sqlx::Error>{

    let result = sqlx::query("DELETE FROM course_table WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
