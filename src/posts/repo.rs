use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// A published post. This service only reads them; authoring lives in the
/// posting service.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub date_posted: OffsetDateTime,
}

impl Post {
    pub async fn list_by_author(
        db: &PgPool,
        author_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, title, content, date_posted
            FROM posts
            WHERE author_id = $1
            ORDER BY date_posted DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(author_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
        .context("list posts by author")?;
        Ok(rows)
    }

    pub async fn count_by_author(db: &PgPool, author_id: Uuid) -> anyhow::Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM posts WHERE author_id = $1",
        )
        .bind(author_id)
        .fetch_one(db)
        .await
        .context("count posts by author")?;
        Ok(count)
    }
}
