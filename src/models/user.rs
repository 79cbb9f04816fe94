use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// User row, limited to what the OTP and upload paths touch.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}
