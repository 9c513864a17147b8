use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Flight, Group, Lift};

pub struct FlightRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FlightRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, flight_id: Uuid) -> Result<Option<Flight>> {
        sqlx::query_as!(
            Flight,
            "SELECT flight_id, meet_id, name, ord FROM flights WHERE flight_id = $1",
            flight_id
        )
        .fetch_optional(self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn first_group(&self, flight_id: Uuid) -> Result<Option<Group>> {
        sqlx::query_as!(
            Group,
            r#"
            SELECT group_id, flight_id, name, ord FROM groups
            WHERE flight_id = $1 ORDER BY ord ASC LIMIT 1
            "#,
            flight_id
        )
        .fetch_optional(self.pool)
        .await
        .map_err(Into::into)
    }

    /// The group in the same flight immediately after `group_id` by `ord`,
    /// or `None` if `group_id` was the flight's last group.
    pub async fn next_group(&self, flight_id: Uuid, group_id: Uuid) -> Result<Option<Group>> {
        sqlx::query_as!(
            Group,
            r#"
            SELECT g2.group_id, g2.flight_id, g2.name, g2.ord
            FROM groups g1
            JOIN groups g2 ON g2.flight_id = g1.flight_id AND g2.ord > g1.ord
            WHERE g1.flight_id = $1 AND g1.group_id = $2
            ORDER BY g2.ord ASC
            LIMIT 1
            "#,
            flight_id,
            group_id
        )
        .fetch_optional(self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn group_entry_count(&self, group_id: Uuid) -> Result<i64> {
        sqlx::query_scalar!(
            r#"SELECT COUNT(*) as "count!" FROM group_entries WHERE group_id = $1"#,
            group_id
        )
        .fetch_one(self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn first_lift(&self, meet_type_id: Uuid) -> Result<Option<Lift>> {
        sqlx::query_as!(
            Lift,
            r#"
            SELECT lift_id, meet_type_id, code, order_index FROM lifts
            WHERE meet_type_id = $1 ORDER BY order_index ASC LIMIT 1
            "#,
            meet_type_id
        )
        .fetch_optional(self.pool)
        .await
        .map_err(Into::into)
    }

    /// Every lift in a meet-type's sequence, in order -- used by the
    /// ranking engine's `total()` to know which lifts sum into a total,
    /// and by `seed`/`initdb` to enumerate a meet-type's format.
    pub async fn lifts_for_meet_type(&self, meet_type_id: Uuid) -> Result<Vec<Lift>> {
        sqlx::query_as!(
            Lift,
            r#"
            SELECT lift_id, meet_type_id, code, order_index FROM lifts
            WHERE meet_type_id = $1 ORDER BY order_index ASC
            "#,
            meet_type_id
        )
        .fetch_all(self.pool)
        .await
        .map_err(Into::into)
    }

    /// Finds or creates a lift by its logical key (meet_type_id, code),
    /// transaction-scoped for the sync resolver's (C7) all-or-nothing
    /// write into the remote archive; the local `lift_id` is never
    /// propagated.
    pub async fn upsert_lift_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        meet_type_id: Uuid,
        code: &str,
        order_index: i16,
    ) -> Result<Lift> {
        if let Some(existing) = sqlx::query_as!(
            Lift,
            r#"
            SELECT lift_id, meet_type_id, code, order_index FROM lifts
            WHERE meet_type_id = $1 AND code = $2
            "#,
            meet_type_id,
            code
        )
        .fetch_optional(&mut **tx)
        .await?
        {
            return Ok(existing);
        }

        sqlx::query_as!(
            Lift,
            r#"
            INSERT INTO lifts (meet_type_id, code, order_index)
            VALUES ($1, $2, $3)
            ON CONFLICT (meet_type_id, code) DO UPDATE SET order_index = EXCLUDED.order_index
            RETURNING lift_id, meet_type_id, code, order_index
            "#,
            meet_type_id,
            code,
            order_index
        )
        .fetch_one(&mut **tx)
        .await
        .map_err(Into::into)
    }

    /// The lift immediately after `lift_id` in its meet-type's sequence.
    pub async fn next_lift(&self, meet_type_id: Uuid, lift_id: Uuid) -> Result<Option<Lift>> {
        sqlx::query_as!(
            Lift,
            r#"
            SELECT l2.lift_id, l2.meet_type_id, l2.code, l2.order_index
            FROM lifts l1
            JOIN lifts l2 ON l2.meet_type_id = l1.meet_type_id AND l2.order_index > l1.order_index
            WHERE l1.meet_type_id = $1 AND l1.lift_id = $2
            ORDER BY l2.order_index ASC
            LIMIT 1
            "#,
            meet_type_id,
            lift_id
        )
        .fetch_optional(self.pool)
        .await
        .map_err(Into::into)
    }
}
