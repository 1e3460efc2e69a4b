//! Authentication middleware
//!
//! Decodes the bearer JWT into an [`Actor`]. Tokens are issued elsewhere;
//! this service only verifies them with the configured HS256 secret.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::{Deserialize, Serialize};
use shared::{Actor, Role};
use uuid::Uuid;

use crate::error::AppError;
use crate::AppState;

/// JWT claims accepted by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    /// Required for vendor tokens
    pub vendor_id: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

/// The authenticated caller, inserted into request extensions
#[derive(Clone, Debug)]
pub struct CurrentUser(pub Actor);

/// Validate the bearer token and attach the caller
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return AppError::Unauthorized("Missing or invalid Authorization header".to_string())
            .into_response();
    };

    match decode_actor(bearer.token(), &state.config.jwt.secret) {
        Ok(actor) => {
            request.extensions_mut().insert(CurrentUser(actor));
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Decode and validate a token into the acting user
pub fn decode_actor(token: &str, secret: &str) -> Result<Actor, AppError> {
    use jsonwebtoken::{decode, DecodingKey, Validation};

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("Rejected token: {}", e);
        AppError::InvalidToken
    })?;

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)?;
    match claims.role {
        Role::PurchasingManager => Ok(Actor::purchasing_manager(user_id)),
        Role::Vendor => {
            let vendor_id = claims
                .vendor_id
                .as_deref()
                .and_then(|v| Uuid::parse_str(v).ok())
                .ok_or(AppError::InvalidToken)?;
            Ok(Actor::vendor(user_id, vendor_id))
        }
    }
}

/// Require the purchasing-manager role
pub fn require_purchasing_manager(actor: &Actor) -> Result<(), AppError> {
    if actor.is_purchasing_manager() {
        Ok(())
    } else {
        Err(AppError::InsufficientPermissions)
    }
}

/// Require a vendor user; returns the vendor they act for
pub fn require_vendor(actor: &Actor) -> Result<Uuid, AppError> {
    match (actor.role, actor.vendor_id) {
        (Role::Vendor, Some(vendor_id)) => Ok(vendor_id),
        _ => Err(AppError::InsufficientPermissions),
    }
}

/// Vendor scope for list queries: `None` for purchasing managers
pub fn vendor_scope(actor: &Actor) -> Option<Uuid> {
    if actor.is_purchasing_manager() {
        None
    } else {
        // A vendor token without a vendor never passes `decode_actor`
        Some(actor.vendor_id.unwrap_or_else(Uuid::nil))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(claims: &Claims, secret: &str) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn claims(role: Role, vendor_id: Option<Uuid>) -> Claims {
        let now = chrono::Utc::now().timestamp();
        Claims {
            sub: Uuid::new_v4().to_string(),
            role,
            vendor_id: vendor_id.map(|v| v.to_string()),
            exp: now + 3600,
            iat: now,
        }
    }

    #[test]
    fn vendor_token_carries_vendor() {
        let vendor_id = Uuid::new_v4();
        let actor = decode_actor(&token(&claims(Role::Vendor, Some(vendor_id)), "s"), "s").unwrap();
        assert!(actor.is_vendor(vendor_id));
        assert_eq!(require_vendor(&actor).unwrap(), vendor_id);
        assert!(require_purchasing_manager(&actor).is_err());
    }

    #[test]
    fn vendor_token_without_vendor_is_invalid() {
        let result = decode_actor(&token(&claims(Role::Vendor, None), "s"), "s");
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let result = decode_actor(&token(&claims(Role::PurchasingManager, None), "a"), "b");
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }
}
