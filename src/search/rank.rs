//! Candidate ranking
//!
//! A total order over candidates, applied key by key:
//!
//! 1. availability ratio for the requested lot type, descending
//! 2. fee score, ascending
//! 3. road distance, ascending (unknown sorts last)
//! 4. travel time, ascending (unknown sorts last)
//! 5. name, then id, ascending

use crate::carpark::{Candidate, FeeSchedule, LotType};
use crate::constants::rank::UNKNOWN_FEE_SCORE;
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid price regex"));

/// Sort candidates best first
pub fn rank(mut candidates: Vec<Candidate>, lot_type: LotType) -> Vec<Candidate> {
    candidates.sort_by(|a, b| compare(a, b, lot_type));
    candidates
}

/// The ranking comparator; `Less` means `a` ranks ahead of `b`
pub fn compare(a: &Candidate, b: &Candidate, lot_type: LotType) -> Ordering {
    availability_ratio(b, lot_type)
        .total_cmp(&availability_ratio(a, lot_type))
        .then_with(|| fee_score(&a.carpark.fee).total_cmp(&fee_score(&b.carpark.fee)))
        .then_with(|| or_infinity(a.distance_m).total_cmp(&or_infinity(b.distance_m)))
        .then_with(|| or_infinity(a.eta_s).total_cmp(&or_infinity(b.eta_s)))
        .then_with(|| a.carpark.name.cmp(&b.carpark.name))
        .then_with(|| a.carpark.id.cmp(&b.carpark.id))
}

/// Free lots over total lots for `lot_type`, 0 when unknown
pub fn availability_ratio(candidate: &Candidate, lot_type: LotType) -> f64 {
    candidate.lot_availability.ratio(lot_type)
}

/// Lower is cheaper
///
/// 0 when a free-parking window is published, otherwise the first number in
/// the weekday, saturday or sunday/PH rate (checked in that order), otherwise
/// [`UNKNOWN_FEE_SCORE`].
pub fn fee_score(fee: &FeeSchedule) -> f64 {
    if fee.has_free_parking() {
        return 0.0;
    }

    [&fee.weekday, &fee.saturday, &fee.sunday_ph]
        .into_iter()
        .flatten()
        .find_map(|rate| first_number(rate))
        .unwrap_or(UNKNOWN_FEE_SCORE)
}

fn first_number(text: &str) -> Option<f64> {
    PRICE_RE.find(text).and_then(|m| m.as_str().parse().ok())
}

fn or_infinity(value: Option<f64>) -> f64 {
    value.unwrap_or(f64::INFINITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carpark::{Carpark, Lot, LotAvailability};
    use crate::store::tests::carpark;
    use std::sync::Arc;

    fn fee(weekday: Option<&str>, saturday: Option<&str>, free: Option<&str>) -> FeeSchedule {
        FeeSchedule {
            weekday: weekday.map(str::to_string),
            saturday: saturday.map(str::to_string),
            sunday_ph: None,
            free_parking: free.map(str::to_string),
        }
    }

    fn candidate(
        record: Carpark,
        lots: Option<(u32, u32)>,
        distance_m: Option<f64>,
        eta_s: Option<f64>,
    ) -> Candidate {
        let mut candidate = Candidate::new(Arc::new(record), distance_m.unwrap_or(0.0));
        if let Some((total, available)) = lots {
            candidate.lot_availability =
                LotAvailability::new().with(LotType::Car, Lot::new(total, available));
        }
        candidate.distance_m = distance_m;
        candidate.eta_s = eta_s;
        candidate
    }

    fn ids(ranked: &[Candidate]) -> Vec<&str> {
        ranked.iter().map(|c| c.carpark.id.as_str()).collect()
    }

    /// A mixed set that exercises every key of the comparator
    fn sample() -> Vec<Candidate> {
        let mut free = carpark("F", 1.3, 103.8);
        free.fee = fee(None, None, Some("SUN & PH FR 7AM-10.30PM"));
        let mut cheap = carpark("C", 1.3, 103.8);
        cheap.fee = fee(Some("$0.60 per half-hour"), None, None);
        let mut pricey = carpark("P", 1.3, 103.8);
        pricey.fee = fee(Some("$1.20 per half-hour"), None, None);
        let mut twin_a = carpark("T2", 1.3, 103.8);
        twin_a.name = "Twin".to_string();
        let mut twin_b = carpark("T1", 1.3, 103.8);
        twin_b.name = "Twin".to_string();

        vec![
            candidate(pricey, Some((10, 5)), Some(300.0), Some(60.0)),
            candidate(twin_a, None, Some(900.0), None),
            candidate(carpark("N", 1.3, 103.8), None, None, None),
            candidate(free, Some((10, 5)), Some(800.0), Some(90.0)),
            candidate(twin_b, None, Some(900.0), None),
            candidate(carpark("B", 1.3, 103.8), Some((100, 90)), Some(2000.0), Some(400.0)),
            candidate(cheap, Some((10, 5)), Some(100.0), Some(20.0)),
            candidate(carpark("Z", 1.3, 103.8), Some((0, 0)), Some(50.0), Some(10.0)),
        ]
    }

    #[test]
    fn test_fee_score() {
        assert_eq!(fee_score(&fee(Some("$0.60 per half-hour"), None, Some("YES"))), 0.0);
        assert_eq!(fee_score(&fee(Some("$0.60 per half-hour"), None, None)), 0.6);
        assert_eq!(fee_score(&fee(Some("Free"), Some("$1.20 / 30 mins"), None)), 1.2);
        assert_eq!(fee_score(&fee(Some("see signboard"), None, None)), UNKNOWN_FEE_SCORE);
        assert_eq!(fee_score(&FeeSchedule::default()), UNKNOWN_FEE_SCORE);
        assert_eq!(fee_score(&fee(Some("$2"), None, Some("  "))), 2.0);
    }

    #[test]
    fn test_availability_ratio() {
        let full = candidate(carpark("A", 1.3, 103.8), Some((40, 10)), None, None);
        let empty = candidate(carpark("B", 1.3, 103.8), Some((0, 0)), None, None);
        let unknown = candidate(carpark("C", 1.3, 103.8), None, None, None);

        assert_eq!(availability_ratio(&full, LotType::Car), 0.25);
        assert_eq!(availability_ratio(&full, LotType::Motorcycle), 0.0);
        assert_eq!(availability_ratio(&empty, LotType::Car), 0.0);
        assert_eq!(availability_ratio(&unknown, LotType::Car), 0.0);
    }

    #[test]
    fn test_rank_order() {
        let ranked = rank(sample(), LotType::Car);
        assert_eq!(ids(&ranked), vec!["B", "F", "C", "P", "Z", "T1", "T2", "N"]);
    }

    #[test]
    fn test_rank_is_permutation() {
        let input = sample();
        let ranked = rank(input.clone(), LotType::Car);

        let mut before: Vec<_> = ids(&input).into_iter().map(String::from).collect();
        let mut after: Vec<_> = ids(&ranked).into_iter().map(String::from).collect();
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[test]
    fn test_rank_is_idempotent() {
        let once = rank(sample(), LotType::Car);
        let twice = rank(once.clone(), LotType::Car);
        assert_eq!(ids(&once), ids(&twice));
    }

    #[test]
    fn test_rank_ignores_input_order() {
        let mut reversed = sample();
        reversed.reverse();
        assert_eq!(
            ids(&rank(reversed, LotType::Car)),
            ids(&rank(sample(), LotType::Car))
        );
    }

    #[test]
    fn test_adjacent_pairs_obey_comparator() {
        let ranked = rank(sample(), LotType::Car);
        for pair in ranked.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let ratio_a = availability_ratio(a, LotType::Car);
            let ratio_b = availability_ratio(b, LotType::Car);
            assert!(ratio_a >= ratio_b);
            if ratio_a == ratio_b {
                let fee_a = fee_score(&a.carpark.fee);
                let fee_b = fee_score(&b.carpark.fee);
                assert!(fee_a <= fee_b);
                if fee_a == fee_b {
                    assert!(or_infinity(a.distance_m) <= or_infinity(b.distance_m));
                }
            }
            assert_ne!(compare(a, b, LotType::Car), Ordering::Greater);
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(rank(Vec::new(), LotType::Car).is_empty());
    }
}
