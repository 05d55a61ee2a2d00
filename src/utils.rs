use argon2::{
    password_hash::{
        rand_core::OsRng, Error, PasswordHasher, SaltString
    }, Argon2, PasswordHash, PasswordVerifier
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{models::user::Role, schema::JWTClaims};

pub fn hash_password(password:&str)->Result<String, Error>{

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2.hash_password(password.as_bytes(), salt.as_salt())?.to_string();
    Ok(password_hash)
}

pub fn verify_password(password:&str, hash:&str)->Result<(), Error>{

    let argon2 = Argon2::default();
    let parsed_hash = PasswordHash::new(hash)?;
    argon2.verify_password(password.as_bytes(), &parsed_hash)?;

    Ok(())
}

pub fn issue_token(secret:&str, user_id:Uuid, role:Role, ttl_hours:i64) -> Result<String, jsonwebtoken::errors::Error>{

    let expires_at = Utc::now() + Duration::hours(ttl_hours);

    let claims = JWTClaims{
        sub: user_id.to_string(),
        role,
        exp: expires_at.timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

pub fn decode_token(secret:&str, token:&str) -> Result<JWTClaims, jsonwebtoken::errors::Error>{

    let decoded = decode::<JWTClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())?;
    Ok(decoded.claims)
}

/// Parses an id taken from the path or body, rejecting anything that isn't a UUID.
pub fn parse_id(raw:&str, what:&'static str) -> Result<Uuid, crate::errors::AppError>{
    Uuid::parse_str(raw.trim()).map_err(|_| crate::errors::AppError::BadRequest(format!("Invalid {what} id")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_round_trip(){
        let hash = hash_password("THERIYATHU").unwrap();

        assert_ne!(hash, "THERIYATHU");
        assert!(verify_password("THERIYATHU", &hash).is_ok());
        assert!(verify_password("IRONMAN", &hash).is_err());
    }

    #[test]
    fn test_token_carries_user_and_role(){
        let user_id = Uuid::new_v4();
        let token = issue_token("secret", user_id, Role::Instructor, 1).unwrap();

        let claims = decode_token("secret", &token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, Role::Instructor);
    }

    #[test]
    fn test_token_with_wrong_secret_is_rejected(){
        let token = issue_token("secret", Uuid::new_v4(), Role::Student, 1).unwrap();
        assert!(decode_token("other-secret", &token).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected(){
        // beyond the default 60s leeway
        let token = issue_token("secret", Uuid::new_v4(), Role::Student, -2).unwrap();
        assert!(decode_token("secret", &token).is_err());
    }

    #[test]
    fn test_parse_id(){
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "course").unwrap(), id);

        let err = parse_id("abc", "course").unwrap_err();
        assert_eq!(err.to_string(), "Invalid course id");
    }
}
