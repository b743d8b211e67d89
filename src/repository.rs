use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::debug;

use crate::traits::ArticleRepository;
use crate::types::{ProcessedArticle, Result};

/// Postgres-backed store of processed articles. The schema lives under
/// `migrations/` and is applied before the scanner runs.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArticleRepository for PostgresRepository {
    async fn already_processed(&self, ids: &[String]) -> Result<HashSet<String>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let rows = sqlx::query(
            "SELECT external_id FROM processed_articles WHERE external_id = ANY($1)",
        )
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        let mut known = HashSet::with_capacity(rows.len());
        for row in rows {
            known.insert(row.try_get::<String, _>("external_id")?);
        }

        debug!(requested = ids.len(), known = known.len(), "looked up processed ids");
        Ok(known)
    }

    async fn save_processed(&self, article: &ProcessedArticle) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO processed_articles (external_id, title, summary, score, status)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (external_id) DO UPDATE
            SET summary = EXCLUDED.summary,
                score = EXCLUDED.score,
                status = EXCLUDED.status,
                updated_at = NOW()
            "#,
        )
        .bind(&article.article.id)
        .bind(&article.article.title)
        .bind(&article.summary)
        .bind(article.score)
        .bind(article.status.as_str())
        .execute(&self.pool)
        .await?;

        debug!(article_id = %article.article.id, "persisted processed article");
        Ok(())
    }
}
