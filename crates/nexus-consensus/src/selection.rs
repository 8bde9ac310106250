// crates/nexus-consensus/src/selection.rs
//
// Score-weighted proposer selection.
//
// Roulette-wheel draw over candidates ordered by score: a validator's chance
// of being picked is proportional to its PoTC score.

use rand::Rng;

use nexus_core::Validator;

/// Pick one candidate with probability proportional to its score.
///
/// Candidates are expected in score-descending order. Returns `None` for an
/// empty slice and the first candidate when every score is zero.
pub fn select_weighted<'a, R: Rng + ?Sized>(
    candidates: &'a [Validator],
    rng: &mut R,
) -> Option<&'a Validator> {
    let first = candidates.first()?;

    let total: f64 = candidates.iter().map(|v| v.potc_score as f64).sum();
    if total <= 0.0 {
        return Some(first);
    }

    let draw = rng.gen_range(0.0..total);
    let mut cumulative = 0.0;
    for candidate in candidates {
        cumulative += candidate.potc_score as f64;
        if cumulative >= draw {
            return Some(candidate);
        }
    }

    // Float accumulation can fall short of `total` by an ulp.
    Some(first)
}

/// Sort validators by score, highest first. Ties keep their input order.
pub fn order_by_score(validators: &mut [Validator]) {
    validators.sort_by(|a, b| b.potc_score.cmp(&a.potc_score));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use nexus_core::{NewValidator, ValidatorStatus};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scored(id: &str, score: u64) -> Validator {
        let mut v = NewValidator {
            validator_id: id.to_string(),
            node_id: id.to_string(),
            stake_amount: 10_000,
            commitment_duration: 1440,
            end_time: None,
            uptime: 100.0,
            reputation: 100.0,
            status: ValidatorStatus::Active,
        }
        .into_validator(1, Utc::now());
        v.potc_score = score;
        v
    }

    #[test]
    fn test_empty_selects_none() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(select_weighted(&[], &mut rng).is_none());
    }

    #[test]
    fn test_only_nonzero_candidate_always_wins() {
        let candidates = vec![scored("a", 100), scored("b", 0), scored("c", 0)];
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let picked = select_weighted(&candidates, &mut rng).unwrap();
            assert_eq!(picked.validator_id, "a");
        }
    }

    #[test]
    fn test_all_zero_scores_pick_first() {
        let candidates = vec![scored("a", 0), scored("b", 0)];
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(select_weighted(&candidates, &mut rng).unwrap().validator_id, "a");
    }

    #[test]
    fn test_selection_roughly_proportional() {
        let candidates = vec![scored("heavy", 900), scored("light", 100)];
        let mut rng = StdRng::seed_from_u64(7);
        let heavy = (0..10_000)
            .filter(|_| select_weighted(&candidates, &mut rng).unwrap().validator_id == "heavy")
            .count();
        assert!((8_500..=9_500).contains(&heavy), "heavy picked {} times", heavy);
    }

    #[test]
    fn test_order_by_score_is_stable() {
        let mut validators = vec![scored("a", 5), scored("b", 9), scored("c", 5)];
        order_by_score(&mut validators);
        let ids: Vec<_> = validators.iter().map(|v| v.validator_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }
}
