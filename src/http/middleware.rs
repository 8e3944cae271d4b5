//! Authentication and rate limiting middleware
//!
//! Player tokens are issued by the account service; this layer only verifies them.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::warn;

use crate::app::AppState;
use crate::game::PlayerId;
use crate::http::routes::AppError;
use crate::util::time::unix_millis;

type HmacSha256 = Hmac<Sha256>;

/// Claims carried by a player token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerClaims {
    /// Subject: stable per-account identity, opaque to the game
    pub sub: String,
    /// Display name chosen at registration
    #[serde(default)]
    pub name: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: u64,
}

/// Verify a player token and extract claims
pub fn verify_token(token: &str, secret: &str) -> Result<PlayerClaims, AuthError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(AuthError::InvalidToken);
    }

    let header_b64 = parts[0];
    let payload_b64 = parts[1];
    let signature_b64 = parts[2];

    // Verify signature (HMAC-SHA256)
    let message = format!("{}.{}", header_b64, payload_b64);

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AuthError::InvalidToken)?;
    mac.update(message.as_bytes());

    let provided_signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AuthError::InvalidToken)?;
    mac.verify_slice(&provided_signature)
        .map_err(|_| AuthError::InvalidToken)?;

    let payload_json = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AuthError::InvalidToken)?;

    let claims: PlayerClaims = serde_json::from_slice(&payload_json)
        .map_err(|_| AuthError::InvalidToken)?;

    if claims.sub.trim().is_empty() {
        return Err(AuthError::InvalidToken);
    }

    let now = unix_millis() / 1000;
    if claims.exp < now {
        return Err(AuthError::TokenExpired);
    }

    Ok(claims)
}

/// Extract token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

/// Authentication error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingHeader,

    #[error("Invalid authorization header format")]
    InvalidFormat,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::InvalidFormat => StatusCode::BAD_REQUEST,
            AuthError::MissingHeader | AuthError::InvalidToken | AuthError::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "code": "unauthorized",
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Authenticated player attached to the request
#[derive(Debug, Clone)]
pub struct AuthenticatedPlayer {
    pub player_id: PlayerId,
    pub display_name: String,
}

impl AuthenticatedPlayer {
    fn from_claims(claims: PlayerClaims) -> Self {
        let display_name = claims
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("Player_{}", claims.sub.chars().take(8).collect::<String>()));

        Self {
            player_id: PlayerId::new(claims.sub),
            display_name,
        }
    }
}

/// Middleware to require authentication
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingHeader)?;

    let token = extract_bearer_token(auth_header).ok_or(AuthError::InvalidFormat)?;

    let claims = verify_token(token, &state.config.auth_token_secret)?;

    // Insert into request extensions for handlers to access
    request
        .extensions_mut()
        .insert(AuthenticatedPlayer::from_claims(claims));

    Ok(next.run(request).await)
}

/// Middleware enforcing the per-player request budget; runs after `require_auth`
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(player) = request.extensions().get::<AuthenticatedPlayer>() {
        if !state.rate_limiter.check(&player.player_id) {
            warn!(player_id = %player.player_id, "Request rate limit exceeded");
            return Err(AppError::RateLimited);
        }
    }

    Ok(next.run(request).await)
}

/// Sign claims the way the account service does. Test-only.
#[cfg(test)]
pub(crate) fn sign_token(claims: &PlayerClaims, secret: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap());
    let message = format!("{}.{}", header, payload);

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(message.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    format!("{}.{}", message, signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn claims(sub: &str, exp: u64) -> PlayerClaims {
        PlayerClaims {
            sub: sub.to_string(),
            name: Some("Tester".to_string()),
            exp,
            iat: 0,
        }
    }

    fn far_future() -> u64 {
        unix_millis() / 1000 + 3600
    }

    #[test]
    fn valid_token_round_trips_identity() {
        let token = sign_token(&claims("user_42", far_future()), SECRET);
        let verified = verify_token(&token, SECRET).unwrap();
        assert_eq!(verified.sub, "user_42");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = sign_token(&claims("user_42", far_future()), SECRET);
        assert!(matches!(
            verify_token(&token, "other-secret"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = sign_token(&claims("user_42", 1), SECRET);
        assert!(matches!(
            verify_token(&token, SECRET),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert!(matches!(
            verify_token("abc.def", SECRET),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn missing_name_falls_back_to_identity_prefix() {
        let mut c = claims("user_123456789", far_future());
        c.name = None;
        let player = AuthenticatedPlayer::from_claims(c);
        assert_eq!(player.display_name, "Player_user_123");
        assert_eq!(player.player_id, PlayerId::new("user_123456789"));
    }
}
