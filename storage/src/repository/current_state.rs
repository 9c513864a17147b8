use sqlx::PgPool;

use crate::error::Result;
use crate::models::CurrentStateRow;

/// CurrentState is a single row with `id = 1`; this repository is the
/// durable backing for the engine's in-memory singleton, restored on
/// process restart.
pub struct CurrentStateRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CurrentStateRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn load(&self) -> Result<CurrentStateRow> {
        let row = sqlx::query_as!(
            CurrentStateRow,
            r#"
            SELECT id, meet_id, flight_id, group_id, lift_id, round,
                   current_registration_id, timer_start, timer_duration_s, status
            FROM current_state WHERE id = 1
            "#
        )
        .fetch_optional(self.pool)
        .await?;

        Ok(row.unwrap_or_else(|| CurrentStateRow {
            id: 1,
            status: "IDLE".to_string(),
            ..Default::default()
        }))
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn save(&self, row: &CurrentStateRow) -> Result<()> {
        sqlx::query!(
            r#"
            INSERT INTO current_state
                (id, meet_id, flight_id, group_id, lift_id, round,
                 current_registration_id, timer_start, timer_duration_s, status)
            VALUES (1, $1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                meet_id = EXCLUDED.meet_id,
                flight_id = EXCLUDED.flight_id,
                group_id = EXCLUDED.group_id,
                lift_id = EXCLUDED.lift_id,
                round = EXCLUDED.round,
                current_registration_id = EXCLUDED.current_registration_id,
                timer_start = EXCLUDED.timer_start,
                timer_duration_s = EXCLUDED.timer_duration_s,
                status = EXCLUDED.status
            "#,
            row.meet_id,
            row.flight_id,
            row.group_id,
            row.lift_id,
            row.round,
            row.current_registration_id,
            row.timer_start,
            row.timer_duration_s,
            row.status
        )
        .execute(self.pool)
        .await?;

        Ok(())
    }

    pub async fn reset(&self) -> Result<()> {
        self.save(&CurrentStateRow {
            id: 1,
            status: "IDLE".to_string(),
            ..Default::default()
        })
        .await
    }
}
