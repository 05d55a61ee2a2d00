use actix_web::{cookie::{time::Duration, Cookie, SameSite}, get, post, put, web::{self, Json}, HttpResponse};
use tracing::info;
use validator::Validate;

use crate::{
    config::Environment,
    errors::AppError,
    middlewares::auth::{AuthUser, TOKEN_COOKIE},
    models::{course::get_enrolled_courses, user::{check_user_exists, create_user, find_user_by_email, get_user_by_id, update_profile}},
    schema::{user::{CreateUser, EmailAndPassword, LoginResponse, ProfileResponse, UpdateProfile, UserResponse}, MessageResponse},
    utils::{hash_password, issue_token, verify_password},
    GlobalState,
};

fn normalize_email(email:&str) -> String{
    email.trim().to_lowercase()
}

#[post("/register")]
async fn register(data:web::Data<GlobalState>, user:Json<CreateUser>) -> Result<HttpResponse, AppError>{
    let user = user.into_inner();
    user.validate()?;

    let email = normalize_email(&user.email);

    if check_user_exists(&data.pool, &email).await? {
        return Err(AppError::BadRequest("User already exists with this email.".to_string()));
    }

    let password_hash = hash_password(&user.password).map_err(|_| AppError::InternalError)?;

    let user_meta = CreateUser{
        email,
        name: user.name.trim().to_string(),
        password: password_hash,
        role: user.role,
    };

    let created = create_user(&data.pool, user_meta).await?;
    info!(user_id = %created.id, role = ?created.role, "user registered");

    Ok(HttpResponse::Created().json(MessageResponse::ok("Account created successfully.")))
}

#[post("/login")]
async fn login(data:web::Data<GlobalState>, user_data:Json<EmailAndPassword>) -> Result<HttpResponse, AppError>{
    user_data.validate()?;

    let user = find_user_by_email(&data.pool, &normalize_email(&user_data.email))
        .await?
        .ok_or_else(|| AppError::BadRequest("Incorrect email or password".to_string()))?;

    verify_password(&user_data.password, &user.password)
        .map_err(|_| AppError::BadRequest("Incorrect email or password".to_string()))?;

    let config = &data.config;
    let token = issue_token(&config.jwt_secret, user.id, user.role, config.token_ttl_hours)
        .map_err(|_| AppError::InternalError)?;

    let cookie = Cookie::build(TOKEN_COOKIE, token.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(config.environment == Environment::Production)
        .max_age(Duration::hours(config.token_ttl_hours))
        .finish();

    info!(user_id = %user.id, "user logged in");

    let message = format!("Welcome back {}", user.name);
    Ok(HttpResponse::Ok().cookie(cookie).json(LoginResponse{
        success: true,
        message,
        token,
        user: UserResponse::from(user),
    }))
}

#[get("/logout")]
async fn logout() -> HttpResponse{
    let mut cookie = Cookie::build(TOKEN_COOKIE, "").path("/").finish();
    cookie.make_removal();

    HttpResponse::Ok().cookie(cookie).json(MessageResponse::ok("Logged out successfully."))
}

#[get("")]
async fn get_profile(data:web::Data<GlobalState>, user:AuthUser) -> Result<HttpResponse, AppError>{
    let profile = get_user_by_id(&data.pool, user.id)
        .await?
        .ok_or(AppError::NotFound("Profile not found"))?;

    let enrolled = get_enrolled_courses(&data.pool, user.id).await?;

    Ok(HttpResponse::Ok().json(ProfileResponse{
        success: true,
        user: UserResponse::from(profile),
        enrolled_courses: enrolled.into_iter().map(Into::into).collect(),
    }))
}

#[put("/update")]
async fn update_profile_handler(data:web::Data<GlobalState>, user:AuthUser, body:Json<UpdateProfile>) -> Result<HttpResponse, AppError>{
    let body = body.into_inner();
    body.validate()?;

    let name = body.name.map(|name| name.trim().to_string());
    let updated = update_profile(&data.pool, user.id, name, body.photo_url)
        .await?
        .ok_or(AppError::NotFound("Profile not found"))?;

    let enrolled = get_enrolled_courses(&data.pool, user.id).await?;

    Ok(HttpResponse::Ok().json(ProfileResponse{
        success: true,
        user: UserResponse::from(updated),
        enrolled_courses: enrolled.into_iter().map(Into::into).collect(),
    }))
}
