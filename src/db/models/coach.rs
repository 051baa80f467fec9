use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;

/// Directory entry for a coach. The coach id is the coach's user id.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct CoachProfile {
    pub id: Uuid,
    pub display_name: String,
    pub hourly_rate: f64,
    pub is_active: bool,
}
