use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A persisted audio tweet.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Tweet {
    pub id: Uuid,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub description: String,
    #[serde(rename = "audioUrl")]
    pub audio_url: String,
    /// Duration in whole seconds, as measured at upload time.
    #[serde(rename = "audioDuration")]
    pub audio_duration: i32,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}
