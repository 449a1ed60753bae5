//! Eligibility evaluation and the canonical match score.
//!
//! All numeric bounds are inclusive and a `None` bound means the offer is
//! unrestricted on that side. Evaluation is pure: results are derived from
//! `(Profile, Offer)` at call time and never stored as offer state.

use serde::{Deserialize, Serialize};

use crate::models::{Offer, Profile};

/// Per-criterion evaluation of a profile against an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityBreakdown {
    pub age_eligible: bool,
    pub income_eligible: bool,
    pub household_eligible: bool,
    pub housing_owned_eligible: bool,
    pub eligible: bool,
    /// Canonical match score, 0–100. Always 0 when ineligible.
    pub match_score: i32,
}

/// Check every criterion; eligibility is the conjunction of all four.
pub fn is_eligible(profile: &Profile, offer: &Offer) -> bool {
    age_eligible(profile.age, offer.min_age, offer.max_age)
        && income_eligible(profile.annual_income, offer.min_income, offer.max_income)
        && household_eligible(
            profile.household_members,
            offer.min_household_members,
            offer.max_household_members,
        )
        && housing_owned_eligible(profile.housing_owned, offer.max_housing_owned)
}

/// Canonical match score for an eligible pair, 0–100.
///
/// Ineligible profiles short-circuit to 0. Eligible profiles start at 100
/// and collect penalties:
/// - 5 when the offer caps owned housing and the profile owns any;
/// - 10 when the income position falls in the outer 10% of the offer's
///   income range on either side (both bounds present);
/// - 15 when the profile names preferred regions and none is a substring of
///   the offer's region.
pub fn match_score(profile: &Profile, offer: &Offer) -> i32 {
    if !is_eligible(profile, offer) {
        return 0;
    }

    let mut penalties = 0;

    if offer.max_housing_owned.is_some() && profile.housing_owned > 0 {
        penalties += 5;
    }

    if let (Some(min), Some(max)) = (offer.min_income, offer.max_income) {
        let range = (max - min) as f64;
        let position = (profile.annual_income - min) as f64;
        if position < range * 0.1 || position > range * 0.9 {
            penalties += 10;
        }
    }

    let mut tokens = profile.region_tokens().peekable();
    if tokens.peek().is_some() && !tokens.any(|t| offer.region.contains(t)) {
        penalties += 15;
    }

    (100 - penalties).max(0)
}

/// Full evaluation with per-criterion flags and the canonical score.
pub fn evaluate(profile: &Profile, offer: &Offer) -> EligibilityBreakdown {
    EligibilityBreakdown {
        age_eligible: age_eligible(profile.age, offer.min_age, offer.max_age),
        income_eligible: income_eligible(profile.annual_income, offer.min_income, offer.max_income),
        household_eligible: household_eligible(
            profile.household_members,
            offer.min_household_members,
            offer.max_household_members,
        ),
        housing_owned_eligible: housing_owned_eligible(
            profile.housing_owned,
            offer.max_housing_owned,
        ),
        eligible: is_eligible(profile, offer),
        match_score: match_score(profile, offer),
    }
}

fn age_eligible(age: i32, min: Option<i32>, max: Option<i32>) -> bool {
    within_bounds(age as i64, min.map(i64::from), max.map(i64::from))
}

fn income_eligible(income: i64, min: Option<i64>, max: Option<i64>) -> bool {
    within_bounds(income, min, max)
}

fn household_eligible(members: i32, min: Option<i32>, max: Option<i32>) -> bool {
    within_bounds(members as i64, min.map(i64::from), max.map(i64::from))
}

fn housing_owned_eligible(owned: i32, max: Option<i32>) -> bool {
    match max {
        Some(max) => owned <= max,
        None => true,
    }
}

fn within_bounds(value: i64, min: Option<i64>, max: Option<i64>) -> bool {
    if let Some(min) = min {
        if value < min {
            return false;
        }
    }
    if let Some(max) = max {
        if value > max {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HousingCategory, Provenance};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn profile() -> Profile {
        Profile {
            user_id: Uuid::new_v4(),
            age: 30,
            annual_income: 50_000_000,
            household_members: 2,
            housing_owned: 0,
            preferred_regions: vec!["서울".to_string()],
        }
    }

    fn offer() -> Offer {
        Offer {
            id: Uuid::new_v4(),
            name: "강남 아파트".to_string(),
            region: "서울".to_string(),
            address: None,
            category: HousingCategory::Apartment,
            min_price: None,
            max_price: None,
            min_age: Some(19),
            max_age: Some(65),
            min_income: Some(30_000_000),
            max_income: Some(100_000_000),
            min_household_members: Some(1),
            max_household_members: Some(5),
            max_housing_owned: Some(0),
            special_qualifications: None,
            preference_categories: None,
            application_start: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            application_end: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            provenance: Provenance::Registry,
            external_id: None,
            document_id: None,
            active: true,
        }
    }

    #[test]
    fn test_reference_profile_is_eligible_with_positive_score() {
        let p = profile();
        let o = offer();
        assert!(is_eligible(&p, &o));
        assert!(match_score(&p, &o) > 0);
    }

    #[test]
    fn test_each_criterion_fails_independently() {
        let o = offer();

        let mut p = profile();
        p.age = 18;
        assert!(!is_eligible(&p, &o));
        let b = evaluate(&p, &o);
        assert!(!b.age_eligible);
        assert!(b.income_eligible && b.household_eligible && b.housing_owned_eligible);

        let mut p = profile();
        p.annual_income = 29_999_999;
        let b = evaluate(&p, &o);
        assert!(!b.income_eligible && !b.eligible);
        assert!(b.age_eligible);

        let mut p = profile();
        p.household_members = 0;
        let b = evaluate(&p, &o);
        assert!(!b.household_eligible && !b.eligible);

        let mut p = profile();
        p.housing_owned = 1;
        let b = evaluate(&p, &o);
        assert!(!b.housing_owned_eligible && !b.eligible);
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let o = offer();

        let mut p = profile();
        p.age = 19;
        assert!(is_eligible(&p, &o));
        p.age = 65;
        assert!(is_eligible(&p, &o));
        p.age = 18;
        assert!(!is_eligible(&p, &o));
        p.age = 66;
        assert!(!is_eligible(&p, &o));

        let mut p = profile();
        p.annual_income = 30_000_000;
        assert!(is_eligible(&p, &o));
        p.annual_income = 100_000_000;
        assert!(is_eligible(&p, &o));

        let mut p = profile();
        p.housing_owned = 0;
        assert!(is_eligible(&p, &o));
    }

    #[test]
    fn test_null_bound_is_unrestricted() {
        let mut o = offer();
        o.min_age = None;
        o.max_age = None;
        o.min_income = None;
        o.max_income = None;
        o.min_household_members = None;
        o.max_household_members = None;
        o.max_housing_owned = None;

        let mut p = profile();
        p.age = 1;
        p.annual_income = 0;
        p.household_members = 99;
        p.housing_owned = 42;
        assert!(is_eligible(&p, &o));
    }

    #[test]
    fn test_ineligible_scores_zero() {
        let mut p = profile();
        p.age = 10;
        assert_eq!(match_score(&p, &offer()), 0);
        assert_eq!(evaluate(&p, &offer()).match_score, 0);
    }

    #[test]
    fn test_score_in_range_and_no_penalties_is_100() {
        // Mid-range income, no housing owned, matching region.
        let p = profile();
        let mut o = offer();
        o.max_housing_owned = None;
        let score = match_score(&p, &o);
        assert_eq!(score, 100);
        assert!((0..=100).contains(&score));
    }

    #[test]
    fn test_owned_housing_penalty() {
        let mut p = profile();
        p.housing_owned = 1;
        let mut o = offer();
        o.max_housing_owned = Some(2);
        // Owned > 0 under a cap: -5.
        assert_eq!(match_score(&p, &o), 95);
    }

    #[test]
    fn test_income_tail_penalty_both_sides() {
        let o = offer(); // income range 30M..100M, 10% tail = 7M

        let mut p = profile();
        p.annual_income = 31_000_000; // position 1M < 7M
        assert_eq!(match_score(&p, &o), 90);

        p.annual_income = 99_000_000; // position 69M > 63M
        assert_eq!(match_score(&p, &o), 90);

        p.annual_income = 65_000_000; // mid-range
        assert_eq!(match_score(&p, &o), 100);
    }

    #[test]
    fn test_income_penalty_skipped_with_single_bound() {
        let mut o = offer();
        o.max_income = None;
        let mut p = profile();
        p.annual_income = 30_000_000; // right at the min, but no range to judge
        assert_eq!(match_score(&p, &o), 100);
    }

    #[test]
    fn test_region_mismatch_penalty() {
        let mut p = profile();
        p.preferred_regions = vec!["부산".to_string()];
        assert_eq!(match_score(&p, &offer()), 85);
    }

    #[test]
    fn test_region_token_substring_match() {
        let mut p = profile();
        p.preferred_regions = vec!["대구".to_string(), "서울".to_string()];
        let mut o = offer();
        o.region = "서울특별시 강남구".to_string();
        assert_eq!(match_score(&p, &o), 100);
    }

    #[test]
    fn test_no_region_preferences_no_penalty() {
        let mut p = profile();
        p.preferred_regions = vec![];
        assert_eq!(match_score(&p, &offer()), 100);

        p.preferred_regions = vec!["  ".to_string()];
        assert_eq!(match_score(&p, &offer()), 100);
    }

    #[test]
    fn test_penalties_accumulate_and_never_increase_score() {
        let mut p = profile();
        let mut o = offer();

        let base = match_score(&p, &o);

        p.preferred_regions = vec!["부산".to_string()];
        let with_region = match_score(&p, &o);
        assert!(with_region < base);

        p.annual_income = 31_000_000;
        let with_income = match_score(&p, &o);
        assert!(with_income < with_region);

        o.max_housing_owned = Some(1);
        p.housing_owned = 1;
        let with_owned = match_score(&p, &o);
        assert!(with_owned < with_income);
        assert_eq!(with_owned, 100 - 15 - 10 - 5);
    }

    #[test]
    fn test_zero_width_income_range_no_penalty() {
        let mut o = offer();
        o.min_income = Some(50_000_000);
        o.max_income = Some(50_000_000);
        let p = profile();
        assert_eq!(match_score(&p, &o), 100);
    }
}
