//! Pure decision logic factored out of the resolver's orchestration so it
//! can be exercised without a database: which (weight category, age
//! category, lift) combo's mark becomes the promotion candidate, whether a
//! candidate actually beats the archive's current record, and how a ranked
//! meet turns into per-athlete result uploads.

use std::collections::HashMap;

use engine::ranking::RankedEntry;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::ports::{BestMark, CategoryNames, RankableRegistration, RecordCandidate, ResultUpload};

/// A tie never promotes the standing record (DESIGN.md OQ-2): only a
/// strictly greater mark replaces it.
pub fn should_promote(candidate_kg: Decimal, existing_kg: Option<Decimal>) -> bool {
    match existing_kg {
        Some(existing) => candidate_kg > existing,
        None => true,
    }
}

/// Picks, per (weight category, age category, lift) combo, the single best
/// valid mark across every registration sharing that combo -- records are
/// category-wide, never per-athlete. A registration missing either
/// category axis (OPEN) never contributes a candidate.
pub fn select_record_candidates(
    rankable: &[RankableRegistration],
    best_marks: &[BestMark],
    athlete_cf_by_registration: &HashMap<Uuid, String>,
    category_names_by_registration: &HashMap<Uuid, CategoryNames>,
    lift_code_by_id: &HashMap<Uuid, String>,
) -> Vec<RecordCandidate> {
    let bodyweight_by_registration: HashMap<Uuid, Decimal> =
        rankable.iter().map(|r| (r.registration_id, r.bodyweight_kg)).collect();

    let mut best_by_combo: HashMap<(String, String, String), (Decimal, Uuid)> = HashMap::new();
    for mark in best_marks {
        let Some(names) = category_names_by_registration.get(&mark.registration_id) else { continue };
        let (Some(weight_category_name), Some(age_category_name)) =
            (&names.weight_category_name, &names.age_category_name)
        else {
            continue;
        };
        let Some(lift_code) = lift_code_by_id.get(&mark.lift_id) else { continue };

        let key = (weight_category_name.clone(), age_category_name.clone(), lift_code.clone());
        let is_new_best = match best_by_combo.get(&key) {
            Some((kg, _)) => mark.best_kg > *kg,
            None => true,
        };
        if is_new_best {
            best_by_combo.insert(key, (mark.best_kg, mark.registration_id));
        }
    }

    best_by_combo
        .into_iter()
        .filter_map(|((weight_category_name, age_category_name, lift_code), (kg, registration_id))| {
            let athlete_cf = athlete_cf_by_registration.get(&registration_id)?.clone();
            let bodyweight_kg = *bodyweight_by_registration.get(&registration_id)?;
            Some(RecordCandidate { weight_category_name, age_category_name, lift_code, kg, bodyweight_kg, athlete_cf })
        })
        .collect()
}

/// Builds the per-athlete result upload rows from a ranked meet, resolving
/// the athlete's CF and category names by logical key only -- local ids
/// are never propagated to the remote archive.
pub fn build_result_uploads(
    ranked: &[RankedEntry],
    athlete_cf_by_registration: &HashMap<Uuid, String>,
    category_names_by_registration: &HashMap<Uuid, CategoryNames>,
    best_marks: &[BestMark],
    lift_code_by_id: &HashMap<Uuid, String>,
) -> Vec<ResultUpload> {
    ranked
        .iter()
        .filter_map(|entry| {
            let athlete_cf = athlete_cf_by_registration.get(&entry.registration_id)?.clone();
            let names = category_names_by_registration.get(&entry.registration_id).cloned().unwrap_or_default();
            let lift_bests = best_marks
                .iter()
                .filter(|m| m.registration_id == entry.registration_id)
                .filter_map(|m| lift_code_by_id.get(&m.lift_id).map(|code| (code.clone(), m.best_kg)))
                .collect();

            Some(ResultUpload {
                athlete_cf,
                weight_category_name: names.weight_category_name,
                age_category_name: names.age_category_name,
                total_kg: entry.total_kg,
                bodyweight_kg: entry.bodyweight_kg,
                ris_score: entry.ris_score,
                category_placement: entry.category_placement.map(|p| p as i32),
                absolute_placement: entry.absolute_placement.map(|p| p as i32),
                lift_bests,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn should_promote_requires_strictly_greater() {
        assert!(should_promote(dec("100"), None));
        assert!(should_promote(dec("100"), Some(dec("95"))));
        assert!(!should_promote(dec("95"), Some(dec("95"))));
        assert!(!should_promote(dec("90"), Some(dec("95"))));
    }

    #[test]
    fn select_record_candidates_keeps_only_the_best_mark_per_combo() {
        let weaker = Uuid::new_v4();
        let stronger = Uuid::new_v4();
        let lift = Uuid::new_v4();

        let rankable = vec![
            RankableRegistration {
                registration_id: weaker,
                sex: "M".to_string(),
                weight_category_id: Some(Uuid::new_v4()),
                age_category_id: Some(Uuid::new_v4()),
                bodyweight_kg: dec("79"),
                start_ord: 1,
            },
            RankableRegistration {
                registration_id: stronger,
                sex: "M".to_string(),
                weight_category_id: Some(Uuid::new_v4()),
                age_category_id: Some(Uuid::new_v4()),
                bodyweight_kg: dec("80"),
                start_ord: 2,
            },
        ];
        let marks = vec![
            BestMark { registration_id: weaker, lift_id: lift, best_kg: dec("90") },
            BestMark { registration_id: stronger, lift_id: lift, best_kg: dec("100") },
        ];
        let names: HashMap<Uuid, CategoryNames> = [weaker, stronger]
            .into_iter()
            .map(|id| (id, CategoryNames { weight_category_name: Some("CF".to_string()), age_category_name: Some("F1".to_string()) }))
            .collect();
        let cfs: HashMap<Uuid, String> =
            HashMap::from([(weaker, "weak-cf".to_string()), (stronger, "strong-cf".to_string())]);
        let lift_codes: HashMap<Uuid, String> = HashMap::from([(lift, "PU".to_string())]);

        let candidates = select_record_candidates(&rankable, &marks, &cfs, &names, &lift_codes);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].kg, dec("100"));
        assert_eq!(candidates[0].athlete_cf, "strong-cf");
    }

    #[test]
    fn select_record_candidates_skips_category_less_marks() {
        let reg = Uuid::new_v4();
        let lift = Uuid::new_v4();
        let rankable = vec![RankableRegistration {
            registration_id: reg,
            sex: "M".to_string(),
            weight_category_id: None,
            age_category_id: None,
            bodyweight_kg: dec("80"),
            start_ord: 1,
        }];
        let marks = vec![BestMark { registration_id: reg, lift_id: lift, best_kg: dec("100") }];
        let names: HashMap<Uuid, CategoryNames> = HashMap::from([(reg, CategoryNames::default())]);
        let cfs: HashMap<Uuid, String> = HashMap::from([(reg, "cf".to_string())]);
        let lift_codes: HashMap<Uuid, String> = HashMap::from([(lift, "PU".to_string())]);

        let candidates = select_record_candidates(&rankable, &marks, &cfs, &names, &lift_codes);
        assert!(candidates.is_empty());
    }
}
