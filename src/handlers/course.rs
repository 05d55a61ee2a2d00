use actix_web::{delete, get, patch, post, put, web::{self, Json}, HttpResponse};
use sqlx::{Pool, Postgres};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::search::SearchFilter,
    errors::AppError,
    middlewares::auth::AuthUser,
    models::{course::{self, Course}, lecture::count_course_lectures, purchase::count_completed_purchases},
    schema::{course::{CourseEnvelope, CourseListResponse, CourseResponse, CreateCourse, PublishQuery, SearchQuery, UpdateCourse}, form::JsonOrForm, MessageResponse},
    utils::parse_id,
    GlobalState,
};

/// Loads the course and checks the caller created it.
pub(crate) async fn require_course_owner(pool:&Pool<Postgres>, course_id:Uuid, user:&AuthUser) -> Result<Course, AppError>{
    let course = course::get_course_by_id(pool, course_id)
        .await?
        .ok_or(AppError::NotFound("Course not found"))?;

    if course.creator_id != user.id {
        return Err(AppError::Forbidden("You are not the creator of this course"));
    }

    Ok(course)
}

fn parse_publish(query:&PublishQuery) -> Result<bool, AppError>{
    match query.publish.as_deref() {
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        _ => Err(AppError::BadRequest("publish must be 'true' or 'false'".to_string())),
    }
}

#[post("")]
async fn create_course_handler(data:web::Data<GlobalState>, user:AuthUser, course:Json<CreateCourse>) -> Result<HttpResponse, AppError>{
    course.validate()?;

    let created = course::create_course(&data.pool, user.id, course.course_title.trim(), course.category.trim()).await?;
    info!(course_id = %created.id, creator_id = %user.id, "course created");

    Ok(HttpResponse::Created().json(CourseEnvelope{
        success: true,
        message: "Course created.".to_string(),
        course: created.into(),
    }))
}

#[get("")]
async fn get_creator_courses_handler(data:web::Data<GlobalState>, user:AuthUser) -> Result<HttpResponse, AppError>{
    let courses = course::get_creator_courses(&data.pool, user.id).await?;

    Ok(HttpResponse::Ok().json(CourseListResponse::new(courses)))
}

#[get("/{course_id}")]
async fn get_course_handler(data:web::Data<GlobalState>, user:AuthUser, path:web::Path<String>) -> Result<HttpResponse, AppError>{
    let course_id = parse_id(&path, "course")?;
    let course = require_course_owner(&data.pool, course_id, &user).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "course": CourseResponse::from(course),
    })))
}

#[put("/{course_id}")]
async fn update_course_handler(data:web::Data<GlobalState>, user:AuthUser, path:web::Path<String>, course:JsonOrForm<UpdateCourse>) -> Result<HttpResponse, AppError>{
    let course_id = parse_id(&path, "course")?;
    let course = course.into_inner();
    course.validate()?;

    require_course_owner(&data.pool, course_id, &user).await?;

    let updated = course::update_course(&data.pool, course_id, course).await?;

    Ok(HttpResponse::Ok().json(CourseEnvelope{
        success: true,
        message: "Course updated successfully.".to_string(),
        course: updated.into(),
    }))
}

#[patch("/{course_id}")]
async fn toggle_publish_handler(data:web::Data<GlobalState>, user:AuthUser, path:web::Path<String>, query:web::Query<PublishQuery>) -> Result<HttpResponse, AppError>{
    let course_id = parse_id(&path, "course")?;
    let publish = parse_publish(&query)?;

    require_course_owner(&data.pool, course_id, &user).await?;

    if publish && count_course_lectures(&data.pool, course_id).await? == 0 {
        return Err(AppError::BadRequest("Add at least one lecture before publishing".to_string()));
    }

    let updated = course::set_published(&data.pool, course_id, publish).await?;
    info!(course_id = %course_id, publish, "course publication changed");

    let message = if publish { "Course is published" } else { "Course is unpublished" };
    Ok(HttpResponse::Ok().json(CourseEnvelope{
        success: true,
        message: message.to_string(),
        course: updated.into(),
    }))
}

#[delete("/{course_id}")]
async fn remove_course_handler(data:web::Data<GlobalState>, user:AuthUser, path:web::Path<String>) -> Result<HttpResponse, AppError>{
    let course_id = parse_id(&path, "course")?;

    require_course_owner(&data.pool, course_id, &user).await?;

    if count_completed_purchases(&data.pool, course_id).await? > 0 {
        return Err(AppError::Conflict("Course has buyers and cannot be deleted"));
    }

    course::delete_course(&data.pool, course_id).await?;
    info!(course_id = %course_id, "course deleted");

    Ok(HttpResponse::Ok().json(MessageResponse::ok("Course removed successfully.")))
}

#[get("")]
pub async fn search_courses_handler(data:web::Data<GlobalState>, query:web::Query<SearchQuery>) -> Result<HttpResponse, AppError>{
    let filter = SearchFilter::try_from(query.into_inner())?;

    let courses = course::search_courses(&data.pool, &filter).await?;

    Ok(HttpResponse::Ok().json(CourseListResponse::new(courses)))
}

#[get("")]
pub async fn get_published_courses_handler(data:web::Data<GlobalState>) -> Result<HttpResponse, AppError>{
    let courses = course::get_published_courses(&data.pool).await?;

    Ok(HttpResponse::Ok().json(CourseListResponse::new(courses)))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::{header, StatusCode}, test::{read_body_json, TestRequest}};

    use crate::{errors::CustomError, models::user::Role, test_init_app::{init, multipart_form, token_for}};
    use super::*;

    #[test]
    fn test_parse_publish(){
        assert!(parse_publish(&PublishQuery{publish: Some("true".into())}).unwrap());
        assert!(!parse_publish(&PublishQuery{publish: Some("false".into())}).unwrap());
        assert!(parse_publish(&PublishQuery{publish: Some("yes".into())}).is_err());
        assert!(parse_publish(&PublishQuery{publish: None}).is_err());
    }

    #[actix_web::test]
    async fn test_students_cannot_create_courses(){
        let app = init().await;

        let res = TestRequest::post()
            .append_header(("Authorization", token_for(Role::Student)))
            .set_json(CreateCourse{course_title: "Test Course".to_string(), category: "Docker".to_string()})
            .uri("/api/v1/course")
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let error_body: CustomError = read_body_json(res).await;
        assert_eq!(error_body.error, "Only instructors can manage courses");
    }

    #[actix_web::test]
    async fn test_course_routes_require_token(){
        let app = init().await;

        let res = TestRequest::get()
            .uri("/api/v1/course")
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_create_course_validates_title(){
        let app = init().await;

        let res = TestRequest::post()
            .append_header(("Authorization", format!("Bearer {}", token_for(Role::Instructor))))
            .set_json(CreateCourse{course_title: String::new(), category: "Docker".to_string()})
            .uri("/api/v1/course")
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_malformed_course_id(){
        let app = init().await;

        let res = TestRequest::get()
            .append_header(("Authorization", token_for(Role::Instructor)))
            .uri("/api/v1/course/not-a-uuid")
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let error_body: CustomError = read_body_json(res).await;
        assert_eq!(error_body.error, "Invalid course id");
    }

    #[actix_web::test]
    async fn test_publish_flag_must_be_boolean(){
        let app = init().await;

        let res = TestRequest::patch()
            .append_header(("Authorization", token_for(Role::Instructor)))
            .uri(&format!("/api/v1/course/{}?publish=maybe", Uuid::new_v4()))
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_negative_price_is_rejected(){
        let app = init().await;

        let res = TestRequest::put()
            .append_header(("Authorization", token_for(Role::Instructor)))
            .set_json(UpdateCourse{course_price: Some(-1), ..Default::default()})
            .uri(&format!("/api/v1/course/{}", Uuid::new_v4()))
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_search_rejects_unknown_sort(){
        let app = init().await;

        let res = TestRequest::get()
            .uri("/api/v1/course/search?query=rust&sortByPrice=cheapest")
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_course_form_is_validated(){
        let app = init().await;
        let (content_type, body) = multipart_form(&[
            ("courseTitle", None, "Rust in Practice"),
            ("courseLevel", None, "Beginner"),
            ("coursePrice", None, "-5"),
        ]);

        let res = TestRequest::put()
            .append_header(("Authorization", token_for(Role::Instructor)))
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .uri(&format!("/api/v1/course/{}", Uuid::new_v4()))
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let error_body: CustomError = read_body_json(res).await;
        assert!(error_body.error.starts_with("Invalid fields: course"), "{}", error_body.error);
    }

    #[actix_web::test]
    async fn test_course_form_rejects_unparsable_price(){
        let app = init().await;
        let (content_type, body) = multipart_form(&[("coursePrice", None, "free")]);

        let res = TestRequest::put()
            .append_header(("Authorization", token_for(Role::Instructor)))
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .uri(&format!("/api/v1/course/{}", Uuid::new_v4()))
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let error_body: CustomError = read_body_json(res).await;
        assert_eq!(error_body.error, "Invalid value for coursePrice");
    }

    #[actix_web::test]
    async fn test_course_form_refuses_thumbnail_file(){
        let app = init().await;
        let (content_type, body) = multipart_form(&[
            ("courseTitle", None, "Rust in Practice"),
            ("courseThumbnail", Some("thumb.png"), "not really a png"),
        ]);

        let res = TestRequest::put()
            .append_header(("Authorization", token_for(Role::Instructor)))
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .uri(&format!("/api/v1/course/{}", Uuid::new_v4()))
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let error_body: CustomError = read_body_json(res).await;
        assert_eq!(error_body.error, "File uploads are not supported; send courseThumbnail as a URL");
    }
}
