use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Pool, Postgres, Transaction};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus{
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, FromRow)]
pub struct Purchase{
    pub id: Uuid,
    pub course_id: Uuid,
    pub user_id: Uuid,
    pub amount: i32,
    pub status: PaymentStatus,
    pub payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PurchaseWithCourse{
    #[sqlx(flatten)]
    pub purchase: Purchase,
    pub course_title: String,
    pub course_thumbnail: Option<String>,
}

pub async fn is_enrolled(pool:&Pool<Postgres>, user_id:Uuid, course_id:Uuid) -> Result<bool, sqlx::Error>{

    let result: Option<(Uuid,)> = sqlx::query_as(
        r#"
            SELECT course_id FROM enrollment_table
            WHERE user_id = $1 AND course_id = $2
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await?;

    Ok(result.is_some())
}

pub async fn create_pending_purchase(
    pool:&Pool<Postgres>,
    user_id:Uuid,
    course_id:Uuid,
    amount:i32,
    payment_id:&str,
) -> Result<Purchase, sqlx::Error>{

    sqlx::query_as::<_, Purchase>(
        r#"
            INSERT INTO purchases_table (id, course_id, user_id, amount, status, payment_id)
            VALUES ($1, $2, $3, $4, 'pending', $5)
            RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(course_id)
    .bind(user_id)
    .bind(amount)
    .bind(payment_id)
    .fetch_one(pool)
    .await
}

/// Free courses skip the payment provider: the purchase is completed on the spot.
/// Returns `None` when the buyer already holds a completed purchase of the course.
pub async fn claim_free_course(pool:&Pool<Postgres>, user_id:Uuid, course_id:Uuid) -> Result<Option<Purchase>, sqlx::Error>{

    let mut tx = pool.begin().await?;

    // the partial unique index admits one completed purchase per (user, course)
    let purchase = sqlx::query_as::<_, Purchase>(
        r#"
            INSERT INTO purchases_table (id, course_id, user_id, amount, status)
            VALUES ($1, $2, $3, 0, 'completed')
            ON CONFLICT (user_id, course_id) WHERE status = 'completed' DO NOTHING
            RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(course_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(purchase) = purchase else {
        return Ok(None);
    };

    enroll(&mut tx, user_id, course_id).await?;

    tx.commit().await?;
    Ok(Some(purchase))
}

/// Marks the purchase behind a checkout session completed and enrolls the buyer.
/// Returns `None` when no purchase carries that session id, when it was already
/// completed, or when the buyer completed another purchase of the course first.
pub async fn complete_purchase(pool:&Pool<Postgres>, payment_id:&str, amount:Option<i32>) -> Result<Option<Purchase>, sqlx::Error>{

    let mut tx = pool.begin().await?;

    let purchase = sqlx::query_as::<_, Purchase>(
        r#"
            UPDATE purchases_table p
            SET status = 'completed',
                amount = COALESCE($2, p.amount),
                updated_at = now()
            WHERE p.payment_id = $1
              AND p.status <> 'completed'
              AND NOT EXISTS (
                SELECT 1 FROM purchases_table q
                WHERE q.user_id = p.user_id
                  AND q.course_id = p.course_id
                  AND q.status = 'completed'
              )
            RETURNING p.*
        "#,
    )
    .bind(payment_id)
    .bind(amount)
    .fetch_optional(&mut *tx)
    .await;

    let purchase = match purchase {
        Ok(Some(purchase)) => purchase,
        Ok(None) => return Ok(None),
        // a concurrent completion for the same buyer and course won the index
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => return Ok(None),
        Err(e) => return Err(e),
    };

    enroll(&mut tx, purchase.user_id, purchase.course_id).await?;

    tx.commit().await?;
    Ok(Some(purchase))
}

async fn enroll(tx:&mut Transaction<'_, Postgres>, user_id:Uuid, course_id:Uuid) -> Result<(), sqlx::Error>{

    sqlx::query(
        r#"
            INSERT INTO enrollment_table (user_id, course_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn mark_purchase_failed(pool:&Pool<Postgres>, payment_id:&str) -> Result<u64, sqlx::Error>{

    let result = sqlx::query(
        r#"
            UPDATE purchases_table
            SET status = 'failed', updated_at = now()
            WHERE payment_id = $1 AND status = 'pending'
        "#,
    )
    .bind(payment_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn get_user_purchases(pool:&Pool<Postgres>, user_id:Uuid) -> Result<Vec<PurchaseWithCourse>, sqlx::Error>{

    sqlx::query_as::<_, PurchaseWithCourse>(
        r#"
            SELECT p.*, c.course_title, c.course_thumbnail
            FROM purchases_table p
            JOIN course_table c ON c.id = p.course_id
            WHERE p.user_id = $1 AND p.status = 'completed'
            ORDER BY p.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn count_completed_purchases(pool:&Pool<Postgres>, course_id:Uuid) -> Result<i64, sqlx::Error>{

    let (count,): (i64,) = sqlx::query_as(
        r#"
            SELECT COUNT(*) FROM purchases_table
            WHERE course_id = $1 AND status = 'completed'
        "#,
    )
    .bind(course_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
