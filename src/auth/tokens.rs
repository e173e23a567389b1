use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::state::AppState;

/// Audience claim scoping these JWTs to the reset flow; tokens signed with
/// the same secret for any other purpose will not verify here.
const RESET_AUDIENCE: &str = "password-reset";

#[derive(Debug, Serialize, Deserialize)]
struct ResetClaims {
    sub: Uuid,
    iat: usize,
    exp: usize,
    iss: String,
    aud: String,
}

/// Signs and verifies time-limited password-reset tokens. Verification is
/// stateless: the token carries the user id, issuance time, and expiry,
/// sealed by the process-wide secret. Nothing is stored server-side, so a
/// token cannot be revoked early; the short TTL bounds the exposure.
#[derive(Clone)]
pub struct ResetKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl_minutes: i64,
}

impl ResetKeys {
    pub fn new(cfg: &AuthConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            ttl_minutes: cfg.reset_ttl_minutes,
        }
    }

    pub fn ttl_minutes(&self) -> i64 {
        self.ttl_minutes
    }

    /// Issue a reset token for `user_id`, valid for the configured window.
    pub fn issue(&self, user_id: Uuid) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::minutes(self.ttl_minutes);
        let claims = ResetClaims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: RESET_AUDIENCE.to_string(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "reset token issued");
        Ok(token)
    }

    /// Returns the user id the token was issued for, or an error when the
    /// signature does not check out, the audience/issuer mismatch, or the
    /// expiry has passed. Callers treat all causes as one rejection.
    pub fn verify(&self, token: &str) -> anyhow::Result<Uuid> {
        let mut validation = Validation::default();
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_audience(&[RESET_AUDIENCE]);
        // default leeway is 60s; expiry here is exact
        validation.leeway = 0;
        let data = decode::<ResetClaims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, "reset token verified");
        Ok(data.claims.sub)
    }
}

impl FromRef<AppState> for ResetKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::new(&state.config.auth)
    }
}
