use actix_web::{get, post, web::{self, Json}, HttpRequest, HttpResponse};
use chrono::Utc;
use tracing::{info, warn};
use validator::Validate;

use crate::{
    domain::access::AccessLevel,
    errors::AppError,
    middlewares::auth::AuthUser,
    models::{course, lecture, purchase, tutorial},
    payments::{verify_webhook_signature, CheckoutSessionObject, CheckoutSessionRequest, WebhookEvent},
    schema::{
        lecture::{LectureResponse, TutorialResponse},
        purchase::{CheckoutRequest, CheckoutResponse, CourseDetailWithStatus, PurchaseListResponse},
    },
    utils::parse_id,
    GlobalState,
};

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

#[post("/checkout/create-checkout-session")]
async fn create_checkout_session(data:web::Data<GlobalState>, user:AuthUser, body:Json<CheckoutRequest>) -> Result<HttpResponse, AppError>{
    body.validate()?;
    let course_id = parse_id(&body.course_id, "course")?;

    let course = course::get_course_by_id(&data.pool, course_id)
        .await?
        .filter(|course| course.is_published)
        .ok_or(AppError::NotFound("Course not found"))?;

    if purchase::is_enrolled(&data.pool, user.id, course_id).await? {
        return Err(AppError::BadRequest("Course already purchased".to_string()));
    }

    let frontend = &data.config.frontend_url;
    let success_url = format!("{frontend}/course-progress/{course_id}");

    if course.is_free() {
        if purchase::claim_free_course(&data.pool, user.id, course_id).await?.is_none() {
            return Err(AppError::BadRequest("Course already purchased".to_string()));
        }
        info!(user_id = %user.id, course_id = %course_id, "free course claimed");

        return Ok(HttpResponse::Ok().json(CheckoutResponse{success: true, url: success_url}));
    }

    let price = course.course_price.unwrap_or_default();
    let session = data.payments.create_checkout_session(CheckoutSessionRequest{
        course_id,
        user_id: user.id,
        course_title: course.course_title.clone(),
        thumbnail: course.course_thumbnail.clone(),
        unit_amount: i64::from(price) * 100,
        success_url,
        cancel_url: format!("{frontend}/course-detail/{course_id}"),
    }).await?;

    let url = session
        .url
        .ok_or_else(|| AppError::PaymentProvider("checkout session has no url".to_string()))?;

    purchase::create_pending_purchase(&data.pool, user.id, course_id, price, &session.id).await?;
    info!(user_id = %user.id, course_id = %course_id, session_id = %session.id, "checkout session created");

    Ok(HttpResponse::Ok().json(CheckoutResponse{success: true, url}))
}

#[post("")]
async fn stripe_webhook(data:web::Data<GlobalState>, req:HttpRequest, body:web::Bytes) -> Result<HttpResponse, AppError>{
    let secret = data
        .config
        .stripe
        .webhook_secret
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Webhook secret is not configured".to_string()))?;

    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing webhook signature".to_string()))?;

    verify_webhook_signature(&body, signature, secret, Utc::now().timestamp()).inspect_err(|e| {
        warn!(error = %e, "rejected webhook");
    })?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|_| AppError::BadRequest("Invalid webhook payload".to_string()))?;

    match event.event_type.as_str() {
        "checkout.session.completed" => {
            let session: CheckoutSessionObject = serde_json::from_value(event.data.object)
                .map_err(|_| AppError::BadRequest("Invalid webhook payload".to_string()))?;

            let amount = session
                .amount_total
                .map(|total| i32::try_from(total / 100))
                .transpose()
                .map_err(|_| AppError::BadRequest("Invalid webhook payload".to_string()))?;

            match purchase::complete_purchase(&data.pool, &session.id, amount).await? {
                Some(completed) => info!(
                    purchase_id = %completed.id,
                    course_id = %completed.course_id,
                    user_id = %completed.user_id,
                    "purchase completed"
                ),
                None => warn!(session_id = %session.id, "completed session has no pending purchase"),
            }
        }
        "checkout.session.expired" | "checkout.session.async_payment_failed" => {
            let session: CheckoutSessionObject = serde_json::from_value(event.data.object)
                .map_err(|_| AppError::BadRequest("Invalid webhook payload".to_string()))?;

            purchase::mark_purchase_failed(&data.pool, &session.id).await?;
            info!(session_id = %session.id, event = %event.event_type, "purchase failed");
        }
        other => info!(event = other, "ignored webhook event"),
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "received": true })))
}

#[get("/course/{course_id}/detail-with-status")]
async fn course_detail_with_status(data:web::Data<GlobalState>, user:AuthUser, path:web::Path<String>) -> Result<HttpResponse, AppError>{
    let course_id = parse_id(&path, "course")?;

    let course = course::get_course_with_creator(&data.pool, course_id)
        .await?
        .filter(|row| row.course.is_published || row.course.creator_id == user.id)
        .ok_or(AppError::NotFound("Course not found"))?;

    let purchased = purchase::is_enrolled(&data.pool, user.id, course_id).await?;
    let access = AccessLevel::resolve(user.id, &course.course, purchased);

    let lectures = lecture::get_course_lectures(&data.pool, course_id).await?;
    let sub_lectures = lecture::get_course_sub_lectures(&data.pool, course_id).await?;
    let tutorials = tutorial::get_course_tutorials(&data.pool, course_id).await?;

    Ok(HttpResponse::Ok().json(CourseDetailWithStatus{
        course: course.into(),
        lectures: LectureResponse::with_sub_lectures(lectures, sub_lectures, |lecture| {
            access.lecture_unlocked(lecture.is_preview_free)
        }),
        tutorials: tutorials
            .into_iter()
            .map(|t| TutorialResponse::new(t, access.tutorial_unlocked()))
            .collect(),
        purchased,
    }))
}

#[get("")]
async fn get_purchased_courses(data:web::Data<GlobalState>, user:AuthUser) -> Result<HttpResponse, AppError>{
    let purchases = purchase::get_user_purchases(&data.pool, user.id).await?;

    Ok(HttpResponse::Ok().json(PurchaseListResponse{
        success: true,
        purchases: purchases.into_iter().map(Into::into).collect(),
    }))
}
