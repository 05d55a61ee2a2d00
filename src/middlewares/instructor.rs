use actix_web::{body::{EitherBody, MessageBody}, dev::{ServiceRequest, ServiceResponse}, middleware::Next, Error, HttpMessage};
use tracing::warn;

use crate::{errors::AppError, middlewares::auth::AuthUser, models::user::Role};

/// Must run inside [`crate::middlewares::auth::authenticate`].
pub async fn require_instructor<B:MessageBody>(
    req:ServiceRequest,
    next:Next<B>
) -> Result<ServiceResponse<EitherBody<B>>, Error>{

    let user = req.extensions().get::<AuthUser>().copied();

    let rejection = match user {
        None => Some(AppError::Unauthorized("Token not found")),
        Some(user) if user.role != Role::Instructor => {
            warn!(user_id = %user.id, path = req.path(), "non-instructor on instructor route");
            Some(AppError::Forbidden("Only instructors can manage courses"))
        }
        Some(_) => None,
    };

    if let Some(e) = rejection {
        return Ok(req.error_response(e).map_into_right_body());
    }

    next.call(req).await.map(ServiceResponse::map_into_left_body)
}
