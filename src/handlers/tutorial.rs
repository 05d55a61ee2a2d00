use actix_web::{delete, get, post, put, web::{self, Json}, HttpResponse};
use sqlx::{Pool, Postgres};
use uuid::Uuid;
use validator::Validate;

use crate::{
    errors::AppError,
    handlers::course::require_course_owner,
    middlewares::auth::AuthUser,
    models::tutorial::{self, Tutorial},
    schema::{lecture::{CreateTutorial, EditTutorial, TutorialEnvelope, TutorialListResponse, TutorialResponse}, MessageResponse},
    utils::parse_id,
    GlobalState,
};

async fn require_tutorial_owner(pool:&Pool<Postgres>, tutorial_id:Uuid, user:&AuthUser) -> Result<Tutorial, AppError>{
    let tutorial = tutorial::get_tutorial_by_id(pool, tutorial_id)
        .await?
        .ok_or(AppError::NotFound("Tutorial not found"))?;

    require_course_owner(pool, tutorial.course_id, user).await?;
    Ok(tutorial)
}

#[post("/{course_id}/tutorial")]
async fn create_tutorial_handler(data:web::Data<GlobalState>, user:AuthUser, path:web::Path<String>, body:Json<CreateTutorial>) -> Result<HttpResponse, AppError>{
    let course_id = parse_id(&path, "course")?;
    let body = body.into_inner();
    body.validate()?;

    require_course_owner(&data.pool, course_id, &user).await?;

    let created = tutorial::create_tutorial(&data.pool, course_id, body).await?;

    Ok(HttpResponse::Created().json(TutorialEnvelope{
        success: true,
        message: "Tutorial created successfully.".to_string(),
        tutorial: TutorialResponse::new(created, true),
    }))
}

#[get("/{course_id}/tutorial")]
async fn get_course_tutorials_handler(data:web::Data<GlobalState>, user:AuthUser, path:web::Path<String>) -> Result<HttpResponse, AppError>{
    let course_id = parse_id(&path, "course")?;

    require_course_owner(&data.pool, course_id, &user).await?;

    let tutorials = tutorial::get_course_tutorials(&data.pool, course_id).await?;

    Ok(HttpResponse::Ok().json(TutorialListResponse{
        success: true,
        tutorials: tutorials.into_iter().map(|t| TutorialResponse::new(t, true)).collect(),
    }))
}

#[put("/tutorial/{tutorial_id}")]
async fn edit_tutorial_handler(data:web::Data<GlobalState>, user:AuthUser, path:web::Path<String>, body:Json<EditTutorial>) -> Result<HttpResponse, AppError>{
    let tutorial_id = parse_id(&path, "tutorial")?;
    let body = body.into_inner();
    body.validate()?;

    require_tutorial_owner(&data.pool, tutorial_id, &user).await?;

    let updated = tutorial::update_tutorial(&data.pool, tutorial_id, body).await?;

    Ok(HttpResponse::Ok().json(TutorialEnvelope{
        success: true,
        message: "Tutorial updated successfully.".to_string(),
        tutorial: TutorialResponse::new(updated, true),
    }))
}

#[delete("/tutorial/{tutorial_id}")]
async fn remove_tutorial_handler(data:web::Data<GlobalState>, user:AuthUser, path:web::Path<String>) -> Result<HttpResponse, AppError>{
    let tutorial_id = parse_id(&path, "tutorial")?;

    require_tutorial_owner(&data.pool, tutorial_id, &user).await?;
    tutorial::delete_tutorial(&data.pool, tutorial_id).await?;

    Ok(HttpResponse::Ok().json(MessageResponse::ok("Tutorial removed successfully.")))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};

    use crate::{models::user::Role, test_init_app::{init, token_for}};
    use super::*;

    #[actix_web::test]
    async fn test_tutorial_needs_content(){
        let app = init().await;

        let body = CreateTutorial{title: "Install Docker".to_string(), content: String::new(), video_url: None};

        let res = test::TestRequest::post()
            .append_header(("Authorization", token_for(Role::Instructor)))
            .set_json(body)
            .uri(&format!("/api/v1/course/{}/tutorial", Uuid::new_v4()))
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_malformed_tutorial_id(){
        let app = init().await;

        let res = test::TestRequest::put()
            .append_header(("Authorization", token_for(Role::Instructor)))
            .set_json(EditTutorial::default())
            .uri("/api/v1/course/tutorial/abc")
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
