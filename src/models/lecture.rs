use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Postgres};
use uuid::Uuid;

use crate::{domain::progress::LectureOutline, models::progress::Progress, schema::lecture::{EditLecture, EditSubLecture}};

#[derive(Debug, Clone, FromRow)]
pub struct Lecture{
    pub id: Uuid,
    pub course_id: Uuid,
    pub lecture_title: String,
    pub video_url: Option<String>,
    pub public_id: Option<String>,
    pub is_preview_free: bool,
    pub duration_seconds: Option<i32>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct SubLecture{
    pub id: Uuid,
    pub lecture_id: Uuid,
    pub title: String,
    pub video_url: Option<String>,
    pub duration_seconds: Option<i32>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub async fn create_lecture(pool:&Pool<Postgres>, course_id:Uuid, title:&str) -> Result<Lecture, sqlx::Error>{

    sqlx::query_as::<_, Lecture>(
        r#"
            INSERT INTO lecture_table (id, course_id, lecture_title, position)
            VALUES ($1, $2, $3,
                (SELECT COALESCE(MAX(position) + 1, 0) FROM lecture_table WHERE course_id = $2))
            RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(course_id)
    .bind(title)
    .fetch_one(pool)
    .await
}

pub async fn get_course_lectures(pool:&Pool<Postgres>, course_id:Uuid) -> Result<Vec<Lecture>, sqlx::Error>{

    sqlx::query_as::<_, Lecture>(
        r#"
            SELECT * FROM lecture_table
            WHERE course_id = $1
            ORDER BY position, created_at
        "#,
    )
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub async fn count_course_lectures(pool:&Pool<Postgres>, course_id:Uuid) -> Result<i64, sqlx::Error>{

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM lecture_table WHERE course_id = $1")
        .bind(course_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

pub async fn get_lecture_by_id(pool:&Pool<Postgres>, id:Uuid) -> Result<Option<Lecture>, sqlx::Error>{

    sqlx::query_as::<_, Lecture>("SELECT * FROM lecture_table WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update_lecture(pool:&Pool<Postgres>, id:Uuid, edit:EditLecture) -> Result<Lecture, sqlx::Error>{

    let (video_url, public_id) = match edit.video_info {
        Some(info) => (Some(info.video_url), info.public_id),
        None => (None, None),
    };

    sqlx::query_as::<_, Lecture>(
        r#"
            UPDATE lecture_table
            SET lecture_title = COALESCE($2, lecture_title),
                video_url = COALESCE($3, video_url),
                public_id = COALESCE($4, public_id),
                is_preview_free = COALESCE($5, is_preview_free),
                duration_seconds = COALESCE($6, duration_seconds),
                updated_at = now()
            WHERE id = $1
            RETURNING *
        "#,
    )
    .bind(id)
    .bind(edit.lecture_title)
    .bind(video_url)
    .bind(public_id)
    .bind(edit.is_preview_free)
    .bind(edit.duration_seconds)
    .fetch_one(pool)
    .await
}

/// Deletes the lecture (sub-lectures cascade) and prunes its ids from every progress record.
pub async fn delete_lecture(pool:&Pool<Postgres>, id:Uuid) -> Result<u64, sqlx::Error>{

    let mut tx = pool.begin().await?;

    let sub_ids: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM sub_lecture_table WHERE lecture_id = $1")
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;
    let sub_ids: Vec<Uuid> = sub_ids.into_iter().map(|(sub_id,)| sub_id).collect();

    sqlx::query(
        r#"
            UPDATE progress_table
            SET viewed_lecture_ids = array_remove(viewed_lecture_ids, $1),
                viewed_sub_lecture_ids = ARRAY(
                    SELECT s FROM unnest(viewed_sub_lecture_ids) AS s WHERE s <> ALL($2)
                ),
                updated_at = now()
            WHERE $1 = ANY(viewed_lecture_ids) OR viewed_sub_lecture_ids && $2
        "#,
    )
    .bind(id)
    .bind(&sub_ids)
    .execute(&mut *tx)
    .await?;

    let result = sqlx::query("DELETE FROM lecture_table WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(result.rows_affected())
}

pub async fn get_lecture_sub_lectures(pool:&Pool<Postgres>, lecture_id:Uuid) -> Result<Vec<SubLecture>, sqlx::Error>{

    sqlx::query_as::<_, SubLecture>(
        r#"
            SELECT * FROM sub_lecture_table
            WHERE lecture_id = $1
            ORDER BY position, created_at
        "#,
    )
    .bind(lecture_id)
    .fetch_all(pool)
    .await
}

pub async fn get_course_sub_lectures(pool:&Pool<Postgres>, course_id:Uuid) -> Result<Vec<SubLecture>, sqlx::Error>{

    sqlx::query_as::<_, SubLecture>(
        r#"
            SELECT s.* FROM sub_lecture_table s
            JOIN lecture_table l ON l.id = s.lecture_id
            WHERE l.course_id = $1
            ORDER BY l.position, s.position, s.created_at
        "#,
    )
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub async fn create_sub_lecture(
    pool:&Pool<Postgres>,
    lecture_id:Uuid,
    title:&str,
    video_url:Option<String>,
    duration_seconds:Option<i32>,
) -> Result<SubLecture, sqlx::Error>{

    sqlx::query_as::<_, SubLecture>(
        r#"
            INSERT INTO sub_lecture_table (id, lecture_id, title, video_url, duration_seconds, position)
            VALUES ($1, $2, $3, $4, $5,
                (SELECT COALESCE(MAX(position) + 1, 0) FROM sub_lecture_table WHERE lecture_id = $2))
            RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(lecture_id)
    .bind(title)
    .bind(video_url)
    .bind(duration_seconds)
    .fetch_one(pool)
    .await
}

pub async fn get_sub_lecture_by_id(pool:&Pool<Postgres>, id:Uuid) -> Result<Option<SubLecture>, sqlx::Error>{

    sqlx::query_as::<_, SubLecture>("SELECT * FROM sub_lecture_table WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update_sub_lecture(pool:&Pool<Postgres>, id:Uuid, edit:EditSubLecture) -> Result<SubLecture, sqlx::Error>{

    sqlx::query_as::<_, SubLecture>(
        r#"
            UPDATE sub_lecture_table
            SET title = COALESCE($2, title),
                video_url = COALESCE($3, video_url),
                duration_seconds = COALESCE($4, duration_seconds),
                updated_at = now()
            WHERE id = $1
            RETURNING *
        "#,
    )
    .bind(id)
    .bind(edit.title)
    .bind(edit.video_url)
    .bind(edit.duration_seconds)
    .fetch_one(pool)
    .await
}

/// Deletes the sub-lecture and rewrites the progress rows of its course, so the
/// parent lecture's viewed flag reflects what is left in it.
pub async fn delete_sub_lecture(pool:&Pool<Postgres>, id:Uuid) -> Result<u64, sqlx::Error>{

    let mut tx = pool.begin().await?;

    let lecture_id = sqlx::query_scalar::<_, Uuid>("SELECT lecture_id FROM sub_lecture_table WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

    let Some(lecture_id) = lecture_id else {
        return Ok(0);
    };

    let result = sqlx::query("DELETE FROM sub_lecture_table WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let remaining = LectureOutline{
        lecture_id,
        sub_lecture_ids: sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM sub_lecture_table WHERE lecture_id = $1 ORDER BY position, created_at",
        )
        .bind(lecture_id)
        .fetch_all(&mut *tx)
        .await?,
    };

    let rows = sqlx::query_as::<_, Progress>(
        r#"
            SELECT p.* FROM progress_table p
            JOIN lecture_table l ON l.course_id = p.course_id
            WHERE l.id = $1
            FOR UPDATE OF p
        "#,
    )
    .bind(lecture_id)
    .fetch_all(&mut *tx)
    .await?;

    for row in rows {
        let mut state = row.state();
        if !state.remove_sub_lecture(&remaining, id) {
            continue;
        }

        sqlx::query(
            r#"
                UPDATE progress_table
                SET viewed_lecture_ids = $2,
                    viewed_sub_lecture_ids = $3,
                    updated_at = now()
                WHERE id = $1
            "#,
        )
        .bind(row.id)
        .bind(state.viewed_lectures.iter().copied().collect::<Vec<_>>())
        .bind(state.viewed_sub_lectures.iter().copied().collect::<Vec<_>>())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(result.rows_affected())
}
