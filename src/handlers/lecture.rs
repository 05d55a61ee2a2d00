use actix_web::{delete, get, post, put, web::{self, Json}, HttpResponse};
use sqlx::{Pool, Postgres};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    errors::AppError,
    handlers::course::require_course_owner,
    middlewares::auth::AuthUser,
    models::lecture::{self, Lecture},
    schema::{lecture::{CreateLecture, CreateSubLecture, EditLecture, EditSubLecture, LectureEnvelope, LectureListResponse, LectureResponse, SubLectureEnvelope, SubLectureResponse}, form::JsonOrForm, MessageResponse},
    utils::parse_id,
    GlobalState,
};

async fn require_lecture_owner(pool:&Pool<Postgres>, lecture_id:Uuid, user:&AuthUser) -> Result<Lecture, AppError>{
    let lecture = lecture::get_lecture_by_id(pool, lecture_id)
        .await?
        .ok_or(AppError::NotFound("Lecture not found"))?;

    require_course_owner(pool, lecture.course_id, user).await?;
    Ok(lecture)
}

#[post("/{course_id}/lecture")]
async fn create_lecture_handler(data:web::Data<GlobalState>, user:AuthUser, path:web::Path<String>, body:Json<CreateLecture>) -> Result<HttpResponse, AppError>{
    let course_id = parse_id(&path, "course")?;
    body.validate()?;

    require_course_owner(&data.pool, course_id, &user).await?;

    let created = lecture::create_lecture(&data.pool, course_id, body.lecture_title.trim()).await?;
    info!(lecture_id = %created.id, course_id = %course_id, "lecture created");

    Ok(HttpResponse::Created().json(LectureEnvelope{
        success: true,
        message: "Lecture created successfully.".to_string(),
        lecture: LectureResponse::new(created, Vec::new(), true),
    }))
}

#[get("/{course_id}/lecture")]
async fn get_course_lectures_handler(data:web::Data<GlobalState>, user:AuthUser, path:web::Path<String>) -> Result<HttpResponse, AppError>{
    let course_id = parse_id(&path, "course")?;

    require_course_owner(&data.pool, course_id, &user).await?;

    let lectures = lecture::get_course_lectures(&data.pool, course_id).await?;
    let sub_lectures = lecture::get_course_sub_lectures(&data.pool, course_id).await?;

    Ok(HttpResponse::Ok().json(LectureListResponse{
        success: true,
        lectures: LectureResponse::with_sub_lectures(lectures, sub_lectures, |_| true),
    }))
}

#[post("/{course_id}/lecture/{lecture_id}")]
async fn edit_lecture_handler(data:web::Data<GlobalState>, user:AuthUser, path:web::Path<(String, String)>, body:JsonOrForm<EditLecture>) -> Result<HttpResponse, AppError>{
    let (course_id, lecture_id) = path.into_inner();
    let course_id = parse_id(&course_id, "course")?;
    let lecture_id = parse_id(&lecture_id, "lecture")?;
    let body = body.into_inner();
    body.validate()?;

    let existing = require_lecture_owner(&data.pool, lecture_id, &user).await?;
    if existing.course_id != course_id {
        return Err(AppError::NotFound("Lecture not found in this course"));
    }

    let updated = lecture::update_lecture(&data.pool, lecture_id, body).await?;
    let sub_lectures = lecture::get_lecture_sub_lectures(&data.pool, lecture_id).await?;

    Ok(HttpResponse::Ok().json(LectureEnvelope{
        success: true,
        message: "Lecture updated successfully.".to_string(),
        lecture: LectureResponse::new(updated, sub_lectures, true),
    }))
}

#[get("/lecture/{lecture_id}")]
async fn get_lecture_handler(data:web::Data<GlobalState>, user:AuthUser, path:web::Path<String>) -> Result<HttpResponse, AppError>{
    let lecture_id = parse_id(&path, "lecture")?;

    let existing = require_lecture_owner(&data.pool, lecture_id, &user).await?;
    let sub_lectures = lecture::get_lecture_sub_lectures(&data.pool, lecture_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "lecture": LectureResponse::new(existing, sub_lectures, true),
    })))
}

#[delete("/lecture/{lecture_id}")]
async fn remove_lecture_handler(data:web::Data<GlobalState>, user:AuthUser, path:web::Path<String>) -> Result<HttpResponse, AppError>{
    let lecture_id = parse_id(&path, "lecture")?;

    require_lecture_owner(&data.pool, lecture_id, &user).await?;

    lecture::delete_lecture(&data.pool, lecture_id).await?;
    info!(lecture_id = %lecture_id, "lecture removed");

    Ok(HttpResponse::Ok().json(MessageResponse::ok("Lecture removed successfully.")))
}

#[post("/lecture/{lecture_id}/sub-lecture")]
async fn create_sub_lecture_handler(data:web::Data<GlobalState>, user:AuthUser, path:web::Path<String>, body:Json<CreateSubLecture>) -> Result<HttpResponse, AppError>{
    let lecture_id = parse_id(&path, "lecture")?;
    let body = body.into_inner();
    body.validate()?;

    require_lecture_owner(&data.pool, lecture_id, &user).await?;

    let created = lecture::create_sub_lecture(&data.pool, lecture_id, body.title.trim(), body.video_url, body.duration_seconds).await?;

    Ok(HttpResponse::Created().json(SubLectureEnvelope{
        success: true,
        message: "Sub-lecture created successfully.".to_string(),
        sub_lecture: SubLectureResponse::new(created, true),
    }))
}

#[put("/sub-lecture/{sub_lecture_id}")]
async fn edit_sub_lecture_handler(data:web::Data<GlobalState>, user:AuthUser, path:web::Path<String>, body:Json<EditSubLecture>) -> Result<HttpResponse, AppError>{
    let sub_lecture_id = parse_id(&path, "sub-lecture")?;
    let body = body.into_inner();
    body.validate()?;

    let existing = lecture::get_sub_lecture_by_id(&data.pool, sub_lecture_id)
        .await?
        .ok_or(AppError::NotFound("Sub-lecture not found"))?;
    require_lecture_owner(&data.pool, existing.lecture_id, &user).await?;

    let updated = lecture::update_sub_lecture(&data.pool, sub_lecture_id, body).await?;

    Ok(HttpResponse::Ok().json(SubLectureEnvelope{
        success: true,
        message: "Sub-lecture updated successfully.".to_string(),
        sub_lecture: SubLectureResponse::new(updated, true),
    }))
}

#[delete("/sub-lecture/{sub_lecture_id}")]
async fn remove_sub_lecture_handler(data:web::Data<GlobalState>, user:AuthUser, path:web::Path<String>) -> Result<HttpResponse, AppError>{
    let sub_lecture_id = parse_id(&path, "sub-lecture")?;

    let existing = lecture::get_sub_lecture_by_id(&data.pool, sub_lecture_id)
        .await?
        .ok_or(AppError::NotFound("Sub-lecture not found"))?;
    require_lecture_owner(&data.pool, existing.lecture_id, &user).await?;

    lecture::delete_sub_lecture(&data.pool, sub_lecture_id).await?;

    Ok(HttpResponse::Ok().json(MessageResponse::ok("Sub-lecture removed successfully.")))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::{header, StatusCode}, test};

    use crate::{errors::CustomError, models::user::Role, schema::lecture::VideoInfo, test_init_app::{init, multipart_form, token_for}};
    use super::*;

    #[actix_web::test]
    async fn test_edit_lecture_rejects_bad_video_url(){
        let app = init().await;

        let body = EditLecture{
            video_info: Some(VideoInfo{video_url: "ftp//nope".to_string(), public_id: None}),
            ..Default::default()
        };

        let res = test::TestRequest::post()
            .append_header(("Authorization", token_for(Role::Instructor)))
            .set_json(body)
            .uri(&format!("/api/v1/course/{}/lecture/{}", Uuid::new_v4(), Uuid::new_v4()))
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let error_body: CustomError = test::read_body_json(res).await;
        assert!(error_body.error.starts_with("Invalid fields: video"), "{}", error_body.error);
    }

    #[actix_web::test]
    async fn test_lecture_form_is_validated(){
        let app = init().await;
        let (content_type, body) = multipart_form(&[
            ("lectureTitle", None, "Borrowing"),
            ("isFree", None, "true"),
            ("videoUrl", None, "not a url"),
        ]);

        let res = test::TestRequest::post()
            .append_header(("Authorization", token_for(Role::Instructor)))
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .uri(&format!("/api/v1/course/{}/lecture/{}", Uuid::new_v4(), Uuid::new_v4()))
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let error_body: CustomError = test::read_body_json(res).await;
        assert!(error_body.error.starts_with("Invalid fields: video"), "{}", error_body.error);
    }

    #[actix_web::test]
    async fn test_malformed_lecture_id(){
        let app = init().await;

        let res = test::TestRequest::delete()
            .append_header(("Authorization", token_for(Role::Instructor)))
            .uri("/api/v1/course/lecture/42")
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let error_body: CustomError = test::read_body_json(res).await;
        assert_eq!(error_body.error, "Invalid lecture id");
    }

    #[actix_web::test]
    async fn test_sub_lecture_needs_title(){
        let app = init().await;

        let body = CreateSubLecture{title: String::new(), video_url: None, duration_seconds: Some(30)};

        let res = test::TestRequest::post()
            .append_header(("Authorization", token_for(Role::Instructor)))
            .set_json(body)
            .uri(&format!("/api/v1/course/lecture/{}/sub-lecture", Uuid::new_v4()))
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_students_cannot_edit_sub_lectures(){
        let app = init().await;

        let res = test::TestRequest::put()
            .append_header(("Authorization", token_for(Role::Student)))
            .set_json(EditSubLecture::default())
            .uri(&format!("/api/v1/course/sub-lecture/{}", Uuid::new_v4()))
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
