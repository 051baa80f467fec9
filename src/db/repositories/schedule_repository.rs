use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::booking::{BookingResult, ScheduleStore};
use crate::db::{ScheduleTemplate, WeeklyDays};

#[derive(Debug, sqlx::FromRow)]
struct ScheduleTemplateRow {
    coach_id: Uuid,
    days: Json<WeeklyDays>,
    updated_at: OffsetDateTime,
}

impl From<ScheduleTemplateRow> for ScheduleTemplate {
    fn from(row: ScheduleTemplateRow) -> Self {
        ScheduleTemplate {
            coach_id: row.coach_id,
            days: row.days.0,
            updated_at: row.updated_at,
        }
    }
}

/// `schedule_templates` keyed by coach; the weekly days live in one JSONB column.
#[derive(Debug, Clone)]
pub struct ScheduleRepository {
    pool: PgPool,
}

impl ScheduleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScheduleStore for ScheduleRepository {
    async fn get(&self, coach_id: Uuid) -> BookingResult<Option<ScheduleTemplate>> {
        let row = sqlx::query_as::<_, ScheduleTemplateRow>(
            "SELECT coach_id, days, updated_at FROM schedule_templates WHERE coach_id = $1",
        )
        .bind(coach_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ScheduleTemplate::from))
    }

    async fn put(&self, template: ScheduleTemplate) -> BookingResult<ScheduleTemplate> {
        let row = sqlx::query_as::<_, ScheduleTemplateRow>(
            r#"
            INSERT INTO schedule_templates (coach_id, days, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (coach_id) DO UPDATE SET
                days = EXCLUDED.days,
                updated_at = EXCLUDED.updated_at
            RETURNING coach_id, days, updated_at
            "#,
        )
        .bind(template.coach_id)
        .bind(Json(&template.days))
        .bind(template.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }
}
