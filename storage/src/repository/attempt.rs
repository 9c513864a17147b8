use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{Attempt, AttemptStatus};

/// One group-entry's relevant declared weight for a given round, batched
/// across the whole group in a single query (see REDESIGN FLAGS: the
/// ordering engine must never fetch declarations one athlete at a time).
#[derive(Debug, Clone)]
pub struct GroupRoundWeight {
    pub registration_id: Uuid,
    pub bodyweight_kg: Decimal,
    pub start_ord: i32,
    /// `None` when the athlete has not yet declared this round; the
    /// ordering engine treats that as deferred.
    pub declared_kg: Option<Decimal>,
    /// `None` when no attempt row exists yet for this round.
    pub status: Option<AttemptStatus>,
}

pub struct AttemptRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AttemptRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// `attemptsFor(regId, liftId)` — stable order by `attempt_no`.
    pub async fn attempts_for(&self, registration_id: Uuid, lift_id: Uuid) -> Result<Vec<Attempt>> {
        sqlx::query_as!(
            Attempt,
            r#"
            SELECT attempt_id, registration_id, lift_id, attempt_no,
                   weight_kg, status as "status: AttemptStatus",
                   created_at, created_by
            FROM attempts
            WHERE registration_id = $1 AND lift_id = $2
            ORDER BY attempt_no ASC
            "#,
            registration_id,
            lift_id
        )
        .fetch_all(self.pool)
        .await
        .map_err(Into::into)
    }

    /// `openersFor(regId)` — declared openers across every lift.
    pub async fn openers_for(
        &self,
        registration_id: Uuid,
    ) -> Result<Vec<(Uuid, Decimal)>> {
        let rows = sqlx::query!(
            r#"
            SELECT lift_id, kg FROM declared_openers WHERE registration_id = $1
            "#,
            registration_id
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| (r.lift_id, r.kg)).collect())
    }

    /// Batched declared-weight lookup for an entire group/lift/round, used
    /// exclusively by the ordering engine (C3) so the call count is O(1)
    /// per query regardless of group size.
    pub async fn group_round_weights(
        &self,
        group_id: Uuid,
        lift_id: Uuid,
        round: i16,
    ) -> Result<Vec<GroupRoundWeight>> {
        if round == 1 {
            let rows = sqlx::query!(
                r#"
                SELECT
                    r.registration_id,
                    r.bodyweight_kg,
                    ge.start_ord,
                    o.kg as "declared_kg?",
                    a.status as "status?: AttemptStatus"
                FROM group_entries ge
                JOIN registrations r ON r.registration_id = ge.registration_id
                LEFT JOIN declared_openers o
                    ON o.registration_id = r.registration_id AND o.lift_id = $2
                LEFT JOIN attempts a
                    ON a.registration_id = r.registration_id AND a.lift_id = $2 AND a.attempt_no = 1
                WHERE ge.group_id = $1
                "#,
                group_id,
                lift_id
            )
            .fetch_all(self.pool)
            .await?;

            Ok(rows
                .into_iter()
                .map(|r| GroupRoundWeight {
                    registration_id: r.registration_id,
                    bodyweight_kg: r.bodyweight_kg,
                    start_ord: r.start_ord,
                    declared_kg: r.declared_kg,
                    status: r.status,
                })
                .collect())
        } else {
            let rows = sqlx::query!(
                r#"
                SELECT
                    r.registration_id,
                    r.bodyweight_kg,
                    ge.start_ord,
                    a.weight_kg as "declared_kg?",
                    a.status as "status?: AttemptStatus"
                FROM group_entries ge
                JOIN registrations r ON r.registration_id = ge.registration_id
                LEFT JOIN attempts a
                    ON a.registration_id = r.registration_id AND a.lift_id = $2 AND a.attempt_no = $3
                WHERE ge.group_id = $1
                "#,
                group_id,
                lift_id,
                round
            )
            .fetch_all(self.pool)
            .await?;

            Ok(rows
                .into_iter()
                .map(|r| GroupRoundWeight {
                    registration_id: r.registration_id,
                    bodyweight_kg: r.bodyweight_kg,
                    start_ord: r.start_ord,
                    declared_kg: r.declared_kg,
                    status: r.status,
                })
                .collect())
        }
    }

    /// `declareAttempt(regId, liftId, attempt_no, weightKg)` — upsert;
    /// rejects out-of-range `attempt_no`, a missing/still-pending
    /// predecessor, or redeclaring a non-pending attempt.
    pub async fn declare_attempt(
        &self,
        registration_id: Uuid,
        lift_id: Uuid,
        attempt_no: i16,
        weight_kg: Decimal,
        created_by: Option<&str>,
    ) -> Result<Attempt> {
        if !(1..=4).contains(&attempt_no) {
            return Err(StorageError::BadInput(format!(
                "attempt_no {attempt_no} out of range 1..=4"
            )));
        }
        StorageError::check_quantized(weight_kg)?;

        let mut tx = self.pool.begin().await?;

        if attempt_no > 1 {
            let predecessor = sqlx::query!(
                r#"
                SELECT status as "status: AttemptStatus"
                FROM attempts
                WHERE registration_id = $1 AND lift_id = $2 AND attempt_no = $3
                "#,
                registration_id,
                lift_id,
                attempt_no - 1
            )
            .fetch_optional(&mut *tx)
            .await?;

            match predecessor {
                None => {
                    return Err(StorageError::StateConflict(format!(
                        "attempt {} does not yet exist",
                        attempt_no - 1
                    )));
                }
                Some(row) if row.status == AttemptStatus::Pending => {
                    return Err(StorageError::StateConflict(format!(
                        "attempt {} is still pending",
                        attempt_no - 1
                    )));
                }
                Some(_) => {}
            }
        }

        let existing = sqlx::query!(
            r#"
            SELECT status as "status: AttemptStatus"
            FROM attempts
            WHERE registration_id = $1 AND lift_id = $2 AND attempt_no = $3
            "#,
            registration_id,
            lift_id,
            attempt_no
        )
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(row) = &existing {
            if row.status != AttemptStatus::Pending {
                return Err(StorageError::StateConflict(format!(
                    "attempt {attempt_no} is already finalized"
                )));
            }
        }

        let attempt = sqlx::query_as!(
            Attempt,
            r#"
            INSERT INTO attempts (registration_id, lift_id, attempt_no, weight_kg, status, created_by)
            VALUES ($1, $2, $3, $4, 'PENDING', $5)
            ON CONFLICT (registration_id, lift_id, attempt_no)
            DO UPDATE SET weight_kg = EXCLUDED.weight_kg, created_by = EXCLUDED.created_by
            RETURNING attempt_id, registration_id, lift_id, attempt_no,
                      weight_kg, status as "status: AttemptStatus",
                      created_at, created_by
            "#,
            registration_id,
            lift_id,
            attempt_no,
            weight_kg,
            created_by
        )
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(attempt)
    }

    /// `finalizeAttempt(attemptId, VALID|INVALID)` — rejects if the current
    /// status is not `Pending`.
    pub async fn finalize_attempt(
        &self,
        attempt_id: Uuid,
        outcome: AttemptStatus,
    ) -> Result<Attempt> {
        if outcome == AttemptStatus::Pending {
            return Err(StorageError::BadInput(
                "cannot finalize into Pending".to_string(),
            ));
        }

        let attempt = sqlx::query_as!(
            Attempt,
            r#"
            UPDATE attempts
            SET status = $2
            WHERE attempt_id = $1 AND status = 'PENDING'
            RETURNING attempt_id, registration_id, lift_id, attempt_no,
                      weight_kg, status as "status: AttemptStatus",
                      created_at, created_by
            "#,
            attempt_id,
            outcome as AttemptStatus
        )
        .fetch_optional(self.pool)
        .await?;

        attempt.ok_or_else(|| {
            StorageError::StateConflict(format!(
                "attempt {attempt_id} is not pending or does not exist"
            ))
        })
    }
}
