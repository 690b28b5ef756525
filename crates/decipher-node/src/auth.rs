//! Session boundary.
//!
//! Every user route takes an [`AuthUser`]; worker write-back routes take an
//! [`InternalCaller`]. Both reject before the handler body runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use decipher_core::{DecipherError, UserId};
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the worker shared secret.
pub const INTERNAL_KEY_HEADER: &str = "x-internal-api-key";

/// Resolves a session token to the user it belongs to.
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Option<UserId>;
}

/// Token table kept in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessions {
    tokens: Arc<RwLock<HashMap<String, UserId>>>,
}

impl InMemorySessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, T, U>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (T, U)>,
        T: Into<String>,
        U: Into<String>,
    {
        let tokens = pairs
            .into_iter()
            .map(|(token, user)| (token.into(), UserId::new(user)))
            .collect();
        Self {
            tokens: Arc::new(RwLock::new(tokens)),
        }
    }

    pub async fn insert(&self, token: impl Into<String>, user: UserId) {
        self.tokens.write().await.insert(token.into(), user);
    }

    pub async fn revoke(&self, token: &str) {
        self.tokens.write().await.remove(token);
    }
}

#[async_trait]
impl SessionVerifier for InMemorySessions {
    async fn verify(&self, token: &str) -> Option<UserId> {
        self.tokens.read().await.get(token).cloned()
    }
}

/// The authenticated caller of a user route.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserId);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError(DecipherError::Unauthorized))?;

        state
            .sessions
            .verify(token)
            .await
            .map(AuthUser)
            .ok_or(ApiError(DecipherError::Unauthorized))
    }
}

/// A research worker presenting the shared internal key.
#[derive(Debug, Clone, Copy)]
pub struct InternalCaller;

#[async_trait]
impl FromRequestParts<AppState> for InternalCaller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.internal_api_key.as_deref() else {
            return Err(ApiError(DecipherError::Unauthorized));
        };

        let presented = parts
            .headers
            .get(INTERNAL_KEY_HEADER)
            .and_then(|value| value.to_str().ok());

        match presented {
            Some(key) if internal_key_matches(key, expected) => Ok(InternalCaller),
            _ => Err(ApiError(DecipherError::Unauthorized)),
        }
    }
}

/// Compare a presented key against the configured one in constant time.
fn internal_key_matches(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}
