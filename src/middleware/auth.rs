use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use secrecy::ExposeSecret;
use uuid::Uuid;

use crate::{dto::auth::Claims, error::AppError, models::UserType, state::AppState};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: String,
}

impl AuthUser {
    pub fn user_type(&self) -> Option<UserType> {
        self.role.parse().ok()
    }
}

pub fn ensure_role(user: &AuthUser, allowed: &[UserType]) -> Result<(), AppError> {
    match user.user_type() {
        Some(role) if allowed.contains(&role) => Ok(()),
        _ => Err(AppError::Forbidden),
    }
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, &[UserType::Superadmin])
}

/// Store staff handle fulfillment; superadmins may act on their behalf.
pub fn ensure_store(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, &[UserType::Store, UserType::Superadmin])
}

pub fn ensure_partner(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, &[UserType::Partner])
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?
            .trim();

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.config.jwt_secret.expose_secret().as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

        let user_id = Uuid::parse_str(&decoded.claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;

        Ok(AuthUser {
            user_id,
            role: decoded.claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &str) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            role: role.into(),
        }
    }

    #[test]
    fn store_guard_admits_store_and_superadmin() {
        assert!(ensure_store(&user("store")).is_ok());
        assert!(ensure_store(&user("superadmin")).is_ok());
        assert!(matches!(ensure_store(&user("partner")), Err(AppError::Forbidden)));
    }

    #[test]
    fn unknown_roles_are_forbidden() {
        assert!(matches!(ensure_admin(&user("root")), Err(AppError::Forbidden)));
        assert!(matches!(ensure_partner(&user("")), Err(AppError::Forbidden)));
    }
}
