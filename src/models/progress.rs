use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Postgres};
use uuid::Uuid;

use crate::domain::progress::ProgressState;

#[derive(Debug, Clone, FromRow)]
pub struct Progress{
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub completed: bool,
    pub viewed_lecture_ids: Vec<Uuid>,
    pub viewed_sub_lecture_ids: Vec<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl Progress {
    pub fn state(&self) -> ProgressState {
        ProgressState::new(
            self.viewed_lecture_ids.iter().copied(),
            self.viewed_sub_lecture_ids.iter().copied(),
        )
    }
}

pub async fn get_progress(pool:&Pool<Postgres>, user_id:Uuid, course_id:Uuid) -> Result<Option<Progress>, sqlx::Error>{

    sqlx::query_as::<_, Progress>(
        r#"
            SELECT * FROM progress_table
            WHERE user_id = $1 AND course_id = $2
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await
}

/// One row per (user, course): the first write inserts, later writes replace the id lists.
pub async fn save_progress(
    pool:&Pool<Postgres>,
    user_id:Uuid,
    course_id:Uuid,
    state:&ProgressState,
    completed:bool,
) -> Result<Progress, sqlx::Error>{

    let lecture_ids: Vec<Uuid> = state.viewed_lectures.iter().copied().collect();
    let sub_lecture_ids: Vec<Uuid> = state.viewed_sub_lectures.iter().copied().collect();

    sqlx::query_as::<_, Progress>(
        r#"
            INSERT INTO progress_table (id, user_id, course_id, completed, viewed_lecture_ids, viewed_sub_lecture_ids)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, course_id) DO UPDATE
            SET completed = EXCLUDED.completed,
                viewed_lecture_ids = EXCLUDED.viewed_lecture_ids,
                viewed_sub_lecture_ids = EXCLUDED.viewed_sub_lecture_ids,
                updated_at = now()
            RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(course_id)
    .bind(completed)
    .bind(lecture_ids)
    .bind(sub_lecture_ids)
    .fetch_one(pool)
    .await
}
