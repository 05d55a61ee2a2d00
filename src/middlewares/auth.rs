use std::future::{ready, Ready};

use actix_web::{body::{EitherBody, MessageBody}, dev::{Payload, ServiceRequest, ServiceResponse}, http::header, middleware::Next, web, Error, FromRequest, HttpMessage, HttpRequest};
use tracing::warn;
use uuid::Uuid;

use crate::{errors::AppError, models::user::Role, utils::decode_token, GlobalState};

pub const TOKEN_COOKIE: &str = "token";

/// The caller, as established by [`authenticate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthUser{
    pub id: Uuid,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .copied()
                .ok_or(AppError::Unauthorized("Token not found")),
        )
    }
}

/// `Authorization: Bearer <t>`, a bare `Authorization: <t>`, or the `token` cookie.
fn extract_token(req:&ServiceRequest) -> Option<String>{

    if let Some(value) = req.headers().get(header::AUTHORIZATION) {
        let value = value.to_str().ok()?.trim();
        let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
        return (!token.is_empty()).then(|| token.to_string());
    }

    req.cookie(TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

fn resolve_user(req:&ServiceRequest) -> Result<AuthUser, AppError>{
    let token = extract_token(req).ok_or(AppError::Unauthorized("Token not found"))?;

    let state = req
        .app_data::<web::Data<GlobalState>>()
        .ok_or(AppError::InternalError)?;

    let claims = decode_token(&state.config.jwt_secret, &token).map_err(|e| {
        warn!(error = %e, path = req.path(), "rejected token");
        AppError::Unauthorized("Invalid token")
    })?;

    let id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized("Invalid token"))?;

    Ok(AuthUser{id, role: claims.role})
}

/// Rejections are rendered here so that the CORS layer still sees a response.
pub async fn authenticate<B:MessageBody>(
    req:ServiceRequest,
    next:Next<B>) -> Result<ServiceResponse<EitherBody<B>>, Error>
{
    let user = match resolve_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(req.error_response(e).map_into_right_body()),
    };

    // handlers read this back through the AuthUser extractor
    req.extensions_mut().insert(user);
    next.call(req).await.map(ServiceResponse::map_into_left_body)
}
