use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::booking::{BookingResult, CoachDirectory};
use crate::db::CoachProfile;

#[derive(Debug, Clone)]
pub struct CoachRepository {
    pool: PgPool,
}

impl CoachRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CoachDirectory for CoachRepository {
    async fn find_coach(&self, coach_id: Uuid) -> BookingResult<Option<CoachProfile>> {
        Ok(sqlx::query_as::<_, CoachProfile>(
            r#"
            SELECT id, display_name, hourly_rate, is_active
            FROM coaches
            WHERE id = $1 AND is_active = true
            "#,
        )
        .bind(coach_id)
        .fetch_optional(&self.pool)
        .await?)
    }
}
