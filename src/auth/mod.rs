use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims carried by identity-provider access tokens. Only `sub` and `exp`
/// are relied upon; the rest is informational.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

impl Claims {
    pub fn new(sub: impl Into<String>, email: Option<String>, expiry_hours: i64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours)).timestamp();

        Self {
            sub: sub.into(),
            exp,
            iat: Some(now.timestamp()),
            email,
            role: Some("authenticated".to_string()),
            aud: Some("authenticated".to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingToken,

    #[error("Malformed Authorization header: {0}")]
    MalformedHeader(&'static str),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("JWT secret not configured")]
    SecretNotConfigured,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("No local user for subject {0}")]
    UserNotProvisioned(String),
}

/// Verifies HS256 tokens signed with the identity provider's shared secret.
/// Built once at startup and shared through `AppState`.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::SecretNotConfigured);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Provider tokens carry aud = "authenticated"; audience is not part of the contract
        validation.validate_aud = false;

        Ok(Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        if data.claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidToken("empty subject".to_string()));
        }

        Ok(data.claims)
    }
}

/// Sign a token the way the identity provider would. Used by tests and the CLI.
pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::SecretNotConfigured);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), claims, &encoding_key)
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MissingToken)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedHeader("expected Bearer scheme"))?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MalformedHeader("empty token"));
    }
    Ok(token)
}
