pub mod user;
pub mod course;
pub mod lecture;
pub mod tutorial;
pub mod purchase;
pub mod progress;

use actix_multipart::form::MultipartFormConfig;
use actix_web::{get, middleware::from_fn, web::{self, scope}, Responder};

use crate::{errors::AppError, middlewares::{auth::authenticate, instructor::require_instructor}};

#[get("/health")]
pub async fn health() -> impl Responder{
    "ok"
}

/// The whole `/api/v1` route table.
pub fn configure(cfg:&mut web::ServiceConfig){
    cfg.service(
        scope("/api/v1")
        // extractor failures answer with the same {"error": ..} body as handlers
        .app_data(web::JsonConfig::default().error_handler(|e, _req| AppError::BadRequest(e.to_string()).into()))
        .app_data(web::QueryConfig::default().error_handler(|e, _req| AppError::BadRequest(e.to_string()).into()))
        .app_data(web::PathConfig::default().error_handler(|e, _req| AppError::BadRequest(e.to_string()).into()))
        .app_data(MultipartFormConfig::default().error_handler(|e, _req| AppError::BadRequest(e.to_string()).into()))
        .service(health)
        // place this before /user , else other will get matched
        .service(
            scope("/user/profile")
            .wrap(from_fn(authenticate))
            .service(user::get_profile)
            .service(user::update_profile_handler)
        )
        .service(
            scope("/user")
            .service(user::register)
            .service(user::login)
            .service(user::logout)
        )
        // public listings, registered ahead of the instructor scope
        .service(
            scope("/course/search")
            .service(course::search_courses_handler)
        )
        .service(
            scope("/course/published-courses")
            .service(course::get_published_courses_handler)
        )
        .service(
            // wraps run outside-in: authenticate first, then the role check
            scope("/course")
            .wrap(from_fn(require_instructor))
            .wrap(from_fn(authenticate))
            .service(course::create_course_handler)
            .service(course::get_creator_courses_handler)
            .service(lecture::get_lecture_handler)
            .service(lecture::remove_lecture_handler)
            .service(lecture::create_sub_lecture_handler)
            .service(lecture::edit_sub_lecture_handler)
            .service(lecture::remove_sub_lecture_handler)
            .service(tutorial::edit_tutorial_handler)
            .service(tutorial::remove_tutorial_handler)
            .service(course::get_course_handler)
            .service(course::update_course_handler)
            .service(course::toggle_publish_handler)
            .service(course::remove_course_handler)
            .service(lecture::create_lecture_handler)
            .service(lecture::get_course_lectures_handler)
            .service(lecture::edit_lecture_handler)
            .service(tutorial::create_tutorial_handler)
            .service(tutorial::get_course_tutorials_handler)
        )
        // the provider calls this without a token
        .service(
            scope("/purchase/webhook")
            .service(purchase::stripe_webhook)
        )
        .service(
            scope("/purchase")
            .wrap(from_fn(authenticate))
            .service(purchase::create_checkout_session)
            .service(purchase::course_detail_with_status)
            .service(purchase::get_purchased_courses)
        )
        .service(
            scope("/progress")
            .wrap(from_fn(authenticate))
            .service(progress::get_course_progress)
            .service(progress::view_lecture)
            .service(progress::view_sub_lecture)
            .service(progress::mark_as_completed)
            .service(progress::mark_as_incompleted)
        )
    );
}

#[cfg(test)]
mod tests{
    use actix_web::test::{self, TestRequest};

    #[actix_web::test]
    async fn test_health(){
        let app = crate::test_init_app::init().await;

        let req = TestRequest::get().uri("/api/v1/health").to_request();
        let res = test::call_service(&app, req).await;

        let body_bytes = test::read_body(res).await;
        let body_str = std::str::from_utf8(&body_bytes).unwrap();

        assert_eq!(body_str, "ok");
    }

    #[actix_web::test]
    async fn test_malformed_json_gets_error_body(){
        use actix_web::http::{header, StatusCode};

        use crate::{errors::CustomError, models::user::Role, test_init_app::token_for};

        let app = crate::test_init_app::init().await;

        let res = TestRequest::post()
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(Role::Instructor))))
            .insert_header(header::ContentType::json())
            .set_payload(r#"{"category":"Docker"}"#)
            .uri("/api/v1/course")
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let error_body: CustomError = test::read_body_json(res).await;
        assert!(error_body.error.contains("courseTitle"), "{}", error_body.error);
    }

    #[actix_web::test]
    async fn test_malformed_query_gets_error_body(){
        use actix_web::http::StatusCode;

        use crate::errors::CustomError;

        let app = crate::test_init_app::init().await;

        let res = TestRequest::get()
            .uri("/api/v1/course/search?query=rust&query=go")
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let error_body: CustomError = test::read_body_json(res).await;
        assert!(error_body.error.contains("duplicate field"), "{}", error_body.error);
    }
}
