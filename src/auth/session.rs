use anyhow::Context;
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use time::{Duration as TimeDuration, OffsetDateTime};
use uuid::Uuid;

use crate::config::AuthConfig;

/// Server-tracked proof that a bearer belongs to an authenticated user.
/// Only the SHA-256 of the issued token is stored; the raw token exists
/// nowhere but in the client's hands.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub token_hash: String,
    pub user_id: Uuid,
    pub remember: bool,
    pub expires_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

/// Generate a fresh session token: returns (raw_token, token_hash).
pub fn generate_session_token() -> (String, String) {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    let raw: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    let hash = hash_session_token(&raw);
    (raw, hash)
}

pub fn hash_session_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Session lifetime: the default covers roughly one working day, the
/// remember flag stretches it to the configured long window.
pub fn session_ttl(cfg: &AuthConfig, remember: bool) -> TimeDuration {
    if remember {
        TimeDuration::days(cfg.remember_ttl_days)
    } else {
        TimeDuration::hours(cfg.session_ttl_hours)
    }
}

impl Session {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }

    pub async fn create(
        db: &PgPool,
        token_hash: &str,
        user_id: Uuid,
        remember: bool,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token_hash, user_id, remember, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(remember)
        .bind(expires_at)
        .execute(db)
        .await
        .context("create session")?;
        Ok(())
    }

    pub async fn find_by_hash(db: &PgPool, token_hash: &str) -> anyhow::Result<Option<Session>> {
        let row = sqlx::query_as::<_, Session>(
            r#"
            SELECT token_hash, user_id, remember, expires_at, created_at
            FROM sessions
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(db)
        .await
        .context("find session by hash")?;
        Ok(row)
    }

    /// Deleting an unknown hash is a no-op, which keeps logout idempotent.
    pub async fn delete_by_hash(db: &PgPool, token_hash: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(db)
            .await
            .context("delete session")?;
        Ok(())
    }

    /// Revoke every session of one user (used after a password reset).
    pub async fn delete_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(db)
            .await
            .context("delete sessions for user")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_auth_config() -> AuthConfig {
        AuthConfig {
            secret: "test".into(),
            issuer: "test".into(),
            reset_ttl_minutes: 30,
            session_ttl_hours: 12,
            remember_ttl_days: 30,
        }
    }

    #[test]
    fn generated_tokens_are_unique() {
        let (raw1, hash1) = generate_session_token();
        let (raw2, hash2) = generate_session_token();
        assert_ne!(raw1, raw2);
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn token_and_hash_shapes() {
        let (raw, hash) = generate_session_token();
        assert_eq!(raw.len(), 64, "32 random bytes as hex");
        assert_eq!(hash.len(), 64, "sha256 as hex");
        assert_ne!(raw, hash, "stored hash must not equal the raw token");
        assert!(raw.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn hashing_is_deterministic() {
        let raw = "fixed-token-value";
        assert_eq!(hash_session_token(raw), hash_session_token(raw));
    }

    #[test]
    fn remember_extends_ttl() {
        let cfg = test_auth_config();
        assert_eq!(session_ttl(&cfg, false), TimeDuration::hours(12));
        assert_eq!(session_ttl(&cfg, true), TimeDuration::days(30));
        assert!(session_ttl(&cfg, true) > session_ttl(&cfg, false));
    }

    #[test]
    fn expiry_boundary() {
        let now = OffsetDateTime::now_utc();
        let session = Session {
            token_hash: "h".into(),
            user_id: Uuid::new_v4(),
            remember: false,
            expires_at: now,
            created_at: now - TimeDuration::hours(1),
        };
        assert!(session.is_expired(now), "expires_at == now counts as expired");
        assert!(!session.is_expired(now - TimeDuration::seconds(1)));
    }
}
