//! Ranking Engine (C5): best-valid-attempt aggregation, category
//! placement, and the bodyweight-normalized RIS absolute score.

use std::cmp::Ordering;
use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::ports::{BestMark, RankableRegistration};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CategoryKey {
    pub sex: String,
    pub weight_category_id: Option<Uuid>,
    pub age_category_id: Option<Uuid>,
}

impl CategoryKey {
    /// `true` when either category axis is unknown — an athlete missing a
    /// weight or age category falls into the OPEN bucket and is ranked only
    /// in the absolute (RIS) list, never a category list.
    pub fn is_category_less(&self) -> bool {
        self.weight_category_id.is_none() || self.age_category_id.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedEntry {
    pub registration_id: Uuid,
    pub category: CategoryKey,
    pub total_kg: Decimal,
    pub bodyweight_kg: Decimal,
    pub category_placement: Option<u32>,
    pub ris_score: Decimal,
    pub absolute_placement: Option<u32>,
}

struct Constants {
    a: Decimal,
    k: Decimal,
    b: Decimal,
    v: Decimal,
    q: Decimal,
}

fn constants_for(sex: &str) -> Constants {
    match sex.to_uppercase().as_str() {
        "F" => Constants {
            a: Decimal::new(164, 0),
            k: Decimal::new(270, 0),
            b: Decimal::new(13776, 5),
            v: Decimal::new(57855, 3),
            q: Decimal::new(37089, 5),
        },
        _ => Constants {
            a: Decimal::new(338, 0),
            k: Decimal::new(549, 0),
            b: Decimal::new(11354, 5),
            v: Decimal::new(74777, 3),
            q: Decimal::new(53096, 5),
        },
    }
}

/// RIS = total * 100 / d(bodyweight, sex), where
/// d(bw, sex) = A + (K-A) / (1 + Q * e^(-B * (bw - v))).
/// Zero when `total` or `bodyweight` is zero; otherwise rounded to 2dp.
/// The `exp` term round-trips through `f64` since `Decimal` has no native
/// transcendental support.
pub fn compute_ris(total_kg: Decimal, bodyweight_kg: Decimal, sex: &str) -> Decimal {
    if total_kg.is_zero() || bodyweight_kg.is_zero() {
        return Decimal::ZERO;
    }

    let c = constants_for(sex);
    let exp_arg = -c.b * (bodyweight_kg - c.v);
    let exp_term = decimal_exp(exp_arg);
    let denominator = c.a + (c.k - c.a) / (Decimal::ONE + c.q * exp_term);

    (total_kg * Decimal::from(100) / denominator).round_dp(2)
}

fn decimal_exp(x: Decimal) -> Decimal {
    let x_f64: f64 = x.to_string().parse().unwrap_or(0.0);
    Decimal::from_f64_retain(x_f64.exp()).unwrap_or(Decimal::ONE)
}

/// Aggregates best-valid-attempt totals, assigns within-category
/// placements, and computes the absolute RIS ranking, in one pass over
/// batched data (no per-athlete queries).
pub fn rank_meet(
    registrations: &[RankableRegistration],
    best_marks: &[BestMark],
) -> Vec<RankedEntry> {
    let mut totals: HashMap<Uuid, Decimal> = HashMap::new();
    for mark in best_marks {
        *totals.entry(mark.registration_id).or_insert(Decimal::ZERO) += mark.best_kg;
    }

    let mut entries: Vec<RankedEntry> = registrations
        .iter()
        .map(|reg| {
            let total_kg = totals.get(&reg.registration_id).copied().unwrap_or(Decimal::ZERO);
            let ris_score = compute_ris(total_kg, reg.bodyweight_kg, &reg.sex);
            RankedEntry {
                registration_id: reg.registration_id,
                category: CategoryKey {
                    sex: reg.sex.clone(),
                    weight_category_id: reg.weight_category_id,
                    age_category_id: reg.age_category_id,
                },
                total_kg,
                bodyweight_kg: reg.bodyweight_kg,
                category_placement: None,
                ris_score,
                absolute_placement: None,
            }
        })
        .collect();

    let start_ord: HashMap<Uuid, i32> = registrations
        .iter()
        .map(|r| (r.registration_id, r.start_ord))
        .collect();

    let mut by_category: HashMap<CategoryKey, Vec<usize>> = HashMap::new();
    for (i, e) in entries.iter().enumerate() {
        if !e.category.is_category_less() {
            by_category.entry(e.category.clone()).or_default().push(i);
        }
    }

    for indices in by_category.values_mut() {
        indices.sort_by(|&i, &j| {
            let a = &entries[i];
            let b = &entries[j];
            b.total_kg
                .cmp(&a.total_kg)
                .then_with(|| a.bodyweight_kg.cmp(&b.bodyweight_kg))
                .then_with(|| {
                    start_ord[&a.registration_id].cmp(&start_ord[&b.registration_id])
                })
        });
        for (placement, &idx) in indices.iter().enumerate() {
            entries[idx].category_placement = Some(placement as u32 + 1);
        }
    }

    let mut absolute_order: Vec<usize> = (0..entries.len()).collect();
    absolute_order.sort_by(|&i, &j| {
        entries[j]
            .ris_score
            .partial_cmp(&entries[i].ris_score)
            .unwrap_or(Ordering::Equal)
    });
    for (placement, idx) in absolute_order.into_iter().enumerate() {
        entries[idx].absolute_placement = Some(placement as u32 + 1);
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn ris_total_100_bw_75_male() {
        let ris = compute_ris(dec("100"), dec("75"), "M");
        let expected = dec("20.96");
        assert!((ris - expected).abs() < dec("0.5"));
    }

    #[test]
    fn ris_total_60_bw_60_female() {
        let ris = compute_ris(dec("60"), dec("60"), "F");
        let expected = dec("24.28");
        assert!((ris - expected).abs() < dec("0.5"));
    }

    #[test]
    fn ris_zero_when_total_or_bw_zero() {
        assert_eq!(compute_ris(Decimal::ZERO, dec("75"), "M"), Decimal::ZERO);
        assert_eq!(compute_ris(dec("100"), Decimal::ZERO, "M"), Decimal::ZERO);
    }

    #[test]
    fn scenario_sync_record_promotion_sole_athlete_gets_placement_one() {
        let fabio = Uuid::new_v4();
        let wc = Uuid::new_v4();
        let ac = Uuid::new_v4();
        let regs = vec![RankableRegistration {
            registration_id: fabio,
            sex: "M".to_string(),
            weight_category_id: Some(wc),
            age_category_id: Some(ac),
            bodyweight_kg: dec("80"),
            start_ord: 1,
        }];
        let marks = vec![BestMark {
            registration_id: fabio,
            lift_id: Uuid::new_v4(),
            best_kg: dec("100"),
        }];
        let ranked = rank_meet(&regs, &marks);
        assert_eq!(ranked[0].category_placement, Some(1));
    }

    #[test]
    fn category_less_athletes_excluded_from_category_placement() {
        let a = Uuid::new_v4();
        let regs = vec![RankableRegistration {
            registration_id: a,
            sex: "M".to_string(),
            weight_category_id: None,
            age_category_id: None,
            bodyweight_kg: dec("80"),
            start_ord: 1,
        }];
        let ranked = rank_meet(&regs, &[]);
        assert_eq!(ranked[0].category_placement, None);
        assert_eq!(ranked[0].absolute_placement, Some(1));
    }

    #[test]
    fn category_less_when_only_one_axis_is_missing() {
        let with_weight_only = CategoryKey { sex: "M".to_string(), weight_category_id: Some(Uuid::new_v4()), age_category_id: None };
        let with_age_only = CategoryKey { sex: "M".to_string(), weight_category_id: None, age_category_id: Some(Uuid::new_v4()) };
        assert!(with_weight_only.is_category_less());
        assert!(with_age_only.is_category_less());

        let a = Uuid::new_v4();
        let regs = vec![RankableRegistration {
            registration_id: a,
            sex: "M".to_string(),
            weight_category_id: Some(Uuid::new_v4()),
            age_category_id: None,
            bodyweight_kg: dec("80"),
            start_ord: 1,
        }];
        let ranked = rank_meet(&regs, &[]);
        assert_eq!(ranked[0].category_placement, None, "a known weight class with no age class is still OPEN, not category-placed");
        assert_eq!(ranked[0].absolute_placement, Some(1));
    }

    #[test]
    fn placements_are_dense_and_break_ties_on_bodyweight_then_start_ord() {
        let wc = Uuid::new_v4();
        let ac = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let regs = vec![
            RankableRegistration {
                registration_id: a,
                sex: "M".to_string(),
                weight_category_id: Some(wc),
                age_category_id: Some(ac),
                bodyweight_kg: dec("82"),
                start_ord: 2,
            },
            RankableRegistration {
                registration_id: b,
                sex: "M".to_string(),
                weight_category_id: Some(wc),
                age_category_id: Some(ac),
                bodyweight_kg: dec("79"),
                start_ord: 1,
            },
        ];
        let marks = vec![
            BestMark { registration_id: a, lift_id: Uuid::new_v4(), best_kg: dec("300") },
            BestMark { registration_id: b, lift_id: Uuid::new_v4(), best_kg: dec("300") },
        ];
        let ranked = rank_meet(&regs, &marks);
        let b_entry = ranked.iter().find(|e| e.registration_id == b).unwrap();
        assert_eq!(b_entry.category_placement, Some(1));
    }
}
