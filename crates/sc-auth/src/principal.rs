//! Authenticated principal

use std::sync::Arc;

use sc_contracts::Actor;
use sc_core::ScError;
use sc_models::Role;
use thiserror::Error;

use crate::jwt::{extract_bearer_token, JwtError, JwtService};

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    Required,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::TokenExpired,
            JwtError::Missing => AuthError::Required,
            other => AuthError::InvalidToken(other.to_string()),
        }
    }
}

impl From<AuthError> for ScError {
    fn from(err: AuthError) -> Self {
        ScError::Unauthorized {
            message: err.to_string(),
        }
    }
}

/// Verified principal taken from a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub role: Role,
    pub email: Option<String>,
}

impl CurrentUser {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
            email: None,
        }
    }
}

impl Actor for CurrentUser {
    fn id(&self) -> &str {
        &self.id
    }

    fn role(&self) -> Role {
        self.role
    }
}

/// Turns an `Authorization` header into a [`CurrentUser`]
#[derive(Clone)]
pub struct Authenticator {
    jwt: Arc<JwtService>,
}

impl Authenticator {
    pub fn new(jwt: Arc<JwtService>) -> Self {
        Self { jwt }
    }

    pub fn authenticate(&self, authorization: Option<&str>) -> Result<CurrentUser, AuthError> {
        let token = authorization
            .and_then(extract_bearer_token)
            .ok_or(AuthError::Required)?;
        let claims = self.jwt.validate_token(token)?;

        let role = claims
            .role
            .parse::<Role>()
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        if claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidToken("empty subject".into()));
        }

        tracing::debug!(subject = %claims.sub, role = %role, "request authenticated");
        Ok(CurrentUser {
            id: claims.sub,
            role,
            email: claims.email,
        })
    }
}
