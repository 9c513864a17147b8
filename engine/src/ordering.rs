//! Ordering Engine (C3): given (group, lift, round), returns the ordered
//! queue of registrations still to attempt in that round. Pure function
//! over a batched input — no storage dependency, so it is testable
//! without a database.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::ports::{AttemptStatus, GroupRoundWeight};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueEntry {
    pub registration_id: Uuid,
    pub declared_kg: Decimal,
}

/// Implements the 5-step algorithm over an already-fetched
/// batch of group-round weights. The ordering is recomputed fresh from
/// `entries` on every call; callers must re-fetch before re-invoking if
/// state may have changed since.
pub fn compute_queue(entries: &[GroupRoundWeight]) -> Vec<QueueEntry> {
    let mut eligible: Vec<&GroupRoundWeight> = entries
        .iter()
        // Step 2: deferred when no declaration exists yet, or the
        // declared weight is zero (athlete has not yet called a weight).
        .filter(|e| e.declared_kg.is_some_and(|kg| kg > Decimal::ZERO))
        // Step 3: exclude athletes whose attempt for this round already
        // has a non-pending status.
        .filter(|e| !matches!(e.status, Some(AttemptStatus::Valid) | Some(AttemptStatus::Invalid)))
        .collect();

    eligible.sort_by(|a, b| {
        let kg_a = a.declared_kg.expect("filtered for Some above");
        let kg_b = b.declared_kg.expect("filtered for Some above");

        kg_a.cmp(&kg_b)
            .then_with(|| b.bodyweight_kg.cmp(&a.bodyweight_kg))
            .then_with(|| a.start_ord.cmp(&b.start_ord))
            .then(Ordering::Equal)
    });

    eligible
        .into_iter()
        .map(|e| QueueEntry {
            registration_id: e.registration_id,
            declared_kg: e.declared_kg.expect("filtered for Some above"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(reg: Uuid, bw: &str, kg: &str, start_ord: i32) -> GroupRoundWeight {
        GroupRoundWeight {
            registration_id: reg,
            bodyweight_kg: bw.parse().unwrap(),
            start_ord,
            declared_kg: Some(kg.parse().unwrap()),
            status: None,
        }
    }

    #[test]
    fn scenario_reordering_by_declared_weight() {
        let marco = Uuid::new_v4();
        let ivan = Uuid::new_v4();
        let fabio = Uuid::new_v4();

        let round1 = vec![
            entry(marco, "70", "85", 1),
            entry(ivan, "75", "90", 2),
            entry(fabio, "80", "95", 3),
        ];
        let queue1 = compute_queue(&round1);
        assert_eq!(
            queue1.iter().map(|e| e.registration_id).collect::<Vec<_>>(),
            vec![marco, ivan, fabio]
        );

        let round2 = vec![
            entry(marco, "70", "92", 1),
            entry(ivan, "75", "100", 2),
            entry(fabio, "80", "95", 3),
        ];
        let queue2 = compute_queue(&round2);
        assert_eq!(
            queue2.iter().map(|e| e.registration_id).collect::<Vec<_>>(),
            vec![marco, fabio, ivan]
        );

        let round3 = vec![
            entry(marco, "70", "97", 1),
            entry(fabio, "80", "97", 3),
            entry(ivan, "75", "100", 2),
        ];
        let queue3 = compute_queue(&round3);
        // 97 tie between Marco (70) and Fabio (80): heavier bodyweight
        // goes first.
        assert_eq!(
            queue3.iter().map(|e| e.registration_id).collect::<Vec<_>>(),
            vec![fabio, marco, ivan]
        );
    }

    #[test]
    fn deferred_when_no_declaration() {
        let a = Uuid::new_v4();
        let entries = vec![GroupRoundWeight {
            registration_id: a,
            bodyweight_kg: "70".parse().unwrap(),
            start_ord: 1,
            declared_kg: None,
            status: None,
        }];
        assert!(compute_queue(&entries).is_empty());
    }

    #[test]
    fn excludes_non_pending_attempts() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let entries = vec![
            GroupRoundWeight {
                registration_id: a,
                bodyweight_kg: "70".parse().unwrap(),
                start_ord: 1,
                declared_kg: Some("100".parse().unwrap()),
                status: Some(AttemptStatus::Valid),
            },
            entry(b, "75", "95", 2),
        ];
        let queue = compute_queue(&entries);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].registration_id, b);
    }

    #[test]
    fn tied_weight_and_bodyweight_falls_back_to_start_ord() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let entries = vec![entry(a, "80", "100", 5), entry(b, "80", "100", 2)];
        let queue = compute_queue(&entries);
        assert_eq!(queue[0].registration_id, b);
        assert_eq!(queue[1].registration_id, a);
    }

    #[test]
    fn queue_contains_each_registration_at_most_once() {
        let ids: Vec<Uuid> = (0..10).map(|_| Uuid::new_v4()).collect();
        let entries: Vec<GroupRoundWeight> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| entry(*id, "70", &format!("{}", 80 + i), i as i32))
            .collect();
        let queue = compute_queue(&entries);
        let mut seen = std::collections::HashSet::new();
        for e in &queue {
            assert!(seen.insert(e.registration_id), "duplicate in queue");
        }
        assert_eq!(queue.len(), ids.len());
    }
}
