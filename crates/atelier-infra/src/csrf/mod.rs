//! Scoped anti-forgery tokens.
//!
//! Token format: `<hmac>.<timestamp>.<nonce>`. The HMAC-SHA256 covers the
//! action name, the entity scope (an item id or `"new"`), the actor id, the
//! timestamp and the nonce, so a token issued for one action on one item by
//! one user is worthless anywhere else.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Scope used when the target entity does not exist yet
pub const NEW_SCOPE: &str = "new";

/// Scope string for an optional target entity
pub fn scope_for(entity_id: Option<Uuid>) -> String {
    entity_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| NEW_SCOPE.to_string())
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Malformed anti-forgery token")]
    Malformed,

    #[error("Anti-forgery token expired")]
    Expired,

    #[error("Anti-forgery token does not match its scope")]
    Mismatch,

    #[error("Invalid anti-forgery key")]
    InvalidKey,
}

/// Issues and verifies anti-forgery tokens
#[derive(Clone)]
pub struct AntiForgery {
    secret: String,
    ttl_secs: i64,
}

impl std::fmt::Debug for AntiForgery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AntiForgery")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl AntiForgery {
    pub fn new(secret: impl Into<String>, ttl_secs: u64) -> Self {
        Self {
            secret: secret.into(),
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        }
    }

    pub fn issue(&self, action: &str, scope: &str, actor_id: Uuid) -> Result<String, TokenError> {
        self.issue_at(action, scope, actor_id, Utc::now().timestamp())
    }

    pub fn verify(
        &self,
        token: &str,
        action: &str,
        scope: &str,
        actor_id: Uuid,
    ) -> Result<(), TokenError> {
        self.verify_at(token, action, scope, actor_id, Utc::now().timestamp())
    }

    fn issue_at(
        &self,
        action: &str,
        scope: &str,
        actor_id: Uuid,
        timestamp: i64,
    ) -> Result<String, TokenError> {
        let nonce = Uuid::new_v4().simple().to_string();
        let signature = self.sign(action, scope, actor_id, timestamp, &nonce)?;
        Ok(format!("{}.{}.{}", signature, timestamp, nonce))
    }

    fn verify_at(
        &self,
        token: &str,
        action: &str,
        scope: &str,
        actor_id: Uuid,
        now: i64,
    ) -> Result<(), TokenError> {
        let mut parts = token.trim().split('.');
        let (Some(signature), Some(timestamp), Some(nonce), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed);
        };

        let timestamp: i64 = timestamp.parse().map_err(|_| TokenError::Malformed)?;
        if nonce.is_empty() {
            return Err(TokenError::Malformed);
        }

        if timestamp.saturating_add(self.ttl_secs) < now {
            tracing::debug!(action = %action, "Anti-forgery token expired");
            return Err(TokenError::Expired);
        }

        let expected = self.sign(action, scope, actor_id, timestamp, nonce)?;

        // Constant-time comparison to prevent timing attacks
        if bool::from(expected.as_bytes().ct_eq(signature.as_bytes())) {
            Ok(())
        } else {
            Err(TokenError::Mismatch)
        }
    }

    fn sign(
        &self,
        action: &str,
        scope: &str,
        actor_id: Uuid,
        timestamp: i64,
        nonce: &str,
    ) -> Result<String, TokenError> {
        let mut mac =
            HmacSha256::new_from_slice(self.secret.as_bytes()).map_err(|_| TokenError::InvalidKey)?;
        mac.update(format!("{}|{}|{}|{}|{}", action, scope, actor_id, timestamp, nonce).as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}
