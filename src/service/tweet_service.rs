use color_eyre::Result;
use eyre::WrapErr;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::tweet::Tweet;

/// Persists tweets produced by the upload path.
pub struct TweetService {
    pool: PgPool,
}

impl TweetService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_audio_tweet(
        &self,
        user_id: &Uuid,
        description: &str,
        audio_url: &str,
        audio_duration: i32,
    ) -> Result<Tweet> {
        let tweet = sqlx::query_as::<_, Tweet>(
            r#"
                INSERT INTO tweets (id, user_id, description, audio_url, audio_duration, created_at)
                VALUES ($1, $2, $3, $4, $5, NOW())
                RETURNING id, user_id, description, audio_url, audio_duration, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(description)
        .bind(audio_url)
        .bind(audio_duration)
        .fetch_one(&self.pool)
        .await
        .wrap_err("Failed to insert audio tweet")?;

        Ok(tweet)
    }
}
