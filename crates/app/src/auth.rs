use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::problem::ProblemResponse;
use crate::router::AppState;

/// Claims carried by bearer tokens presented to admin routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminClaims {
    pub sub: String,
    #[serde(default)]
    pub is_admin: bool,
    pub exp: u64,
}

#[derive(Clone)]
pub struct AdminTokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AdminTokenValidator {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_aud = false;
        validation.validate_exp = false;
        validation.validate_nbf = false;
        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Decodes `token` and checks it is unexpired at `now` and grants admin.
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<AdminClaims, TokenError> {
        let claims = decode::<AdminClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|err| TokenError::Invalid(format!("{err}")))?
            .claims;

        if now.timestamp() >= claims.exp as i64 {
            return Err(TokenError::Expired);
        }
        if !claims.is_admin {
            return Err(TokenError::NotAdmin(claims.sub));
        }
        Ok(claims)
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("missing bearer token")]
    Missing,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("token expired")]
    Expired,
    #[error("user {0} is not an admin")]
    NotAdmin(String),
}

impl From<TokenError> for ProblemResponse {
    fn from(err: TokenError) -> Self {
        let (status, problem_type) = match &err {
            TokenError::Missing => (StatusCode::UNAUTHORIZED, "missing_token"),
            TokenError::Invalid(_) => (StatusCode::UNAUTHORIZED, "invalid_token"),
            TokenError::Expired => (StatusCode::UNAUTHORIZED, "token_expired"),
            TokenError::NotAdmin(_) => (StatusCode::FORBIDDEN, "admin_required"),
        };
        ProblemResponse::new(status, problem_type, err.to_string())
    }
}

/// Extractor that only succeeds for requests bearing a valid admin token.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AdminClaims);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ProblemResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let result = bearer_token(parts)
            .ok_or(TokenError::Missing)
            .and_then(|token| state.admin_tokens().validate(token, state.now()));

        match result {
            Ok(claims) => Ok(Self(claims)),
            Err(err) => {
                warn!(stage = "auth", path = %parts.uri.path(), error = %err, "admin request rejected");
                Err(err.into())
            }
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
pub(crate) fn mint_token(secret: &[u8], sub: &str, is_admin: bool, exp: u64) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = AdminClaims {
        sub: sub.to_string(),
        is_admin,
        exp,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret)).expect("encode token")
}
