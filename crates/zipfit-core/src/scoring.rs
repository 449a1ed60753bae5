//! Detailed five-axis match decomposition.
//!
//! Decomposes a match into weighted axes (age 10, income 30, household 10,
//! owned housing 20, location 30) using distance-from-boundary and midpoint
//! heuristics. The decomposition is **advisory**: it explains where a match
//! is strong or weak, but its total may diverge from the canonical
//! [`crate::eligibility::match_score`], which remains authoritative for
//! ranking and persistence.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::eligibility;
use crate::models::{Offer, Profile};

/// Advisory per-axis decomposition of a match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchBreakdown {
    pub offer_id: Uuid,
    pub offer_name: String,
    pub eligible: bool,
    /// Sum of axis scores, 0–100. 0 when ineligible.
    pub overall_score: i32,
    /// 0–10.
    pub age_score: i32,
    /// 0–30.
    pub income_score: i32,
    /// 0–10.
    pub household_score: i32,
    /// 0–20.
    pub housing_owned_score: i32,
    /// 0–30.
    pub location_score: i32,
    /// Human-readable verdict for the uploader.
    pub reason: String,
}

/// Compute the advisory breakdown for a profile/offer pair.
pub fn detailed_score(profile: &Profile, offer: &Offer) -> MatchBreakdown {
    debug!(offer_name = %offer.name, "Computing detailed match breakdown");

    if !eligibility::is_eligible(profile, offer) {
        return MatchBreakdown {
            offer_id: offer.id,
            offer_name: offer.name.clone(),
            eligible: false,
            overall_score: 0,
            age_score: 0,
            income_score: 0,
            household_score: 0,
            housing_owned_score: 0,
            location_score: 0,
            reason: "자격 조건 미달".to_string(),
        };
    }

    let age_score = age_score(profile.age, offer.min_age, offer.max_age);
    let income_score = income_score(profile.annual_income, offer.min_income, offer.max_income);
    let household_score = household_score(
        profile.household_members,
        offer.min_household_members,
        offer.max_household_members,
    );
    let housing_owned_score = housing_owned_score(profile.housing_owned, offer.max_housing_owned);
    let location_score = location_score(profile, &offer.region);

    let penalties = (10 - age_score)
        + (30 - income_score)
        + (10 - household_score)
        + (20 - housing_owned_score)
        + (30 - location_score);
    let overall_score = (100 - penalties).max(0);

    MatchBreakdown {
        offer_id: offer.id,
        offer_name: offer.name.clone(),
        eligible: true,
        overall_score,
        age_score,
        income_score,
        household_score,
        housing_owned_score,
        location_score,
        reason: reason_for(overall_score),
    }
}

/// Age axis: full marks unless the age sits within 5 years of a bound.
fn age_score(age: i32, min: Option<i32>, max: Option<i32>) -> i32 {
    if min.is_none() && max.is_none() {
        return 10;
    }
    if let Some(min) = min {
        if age < min + 5 {
            return 7;
        }
    }
    if let Some(max) = max {
        if age > max - 5 {
            return 7;
        }
    }
    10
}

/// Income axis: best in the middle 60% of the range.
fn income_score(income: i64, min: Option<i64>, max: Option<i64>) -> i32 {
    match (min, max) {
        (None, None) => 30,
        (Some(min), Some(max)) => {
            let range = (max - min) as f64;
            let position = (income - min) as f64;
            let ratio = if range > 0.0 { position / range } else { 0.0 };
            if (0.2..=0.8).contains(&ratio) {
                30
            } else if (0.1..=0.9).contains(&ratio) {
                25
            } else {
                20
            }
        }
        _ => 25,
    }
}

/// Household axis: distance from the range midpoint.
fn household_score(members: i32, min: Option<i32>, max: Option<i32>) -> i32 {
    match (min, max) {
        (None, None) => 10,
        (Some(min), Some(max)) => {
            let middle = (min + max) / 2;
            match (members - middle).abs() {
                0 => 10,
                1 => 8,
                _ => 6,
            }
        }
        _ => 8,
    }
}

/// Owned-housing axis: proportional to how close the profile sits to the cap.
fn housing_owned_score(owned: i32, max: Option<i32>) -> i32 {
    let Some(max) = max else {
        return 20;
    };
    if owned == 0 && max == 0 {
        return 20;
    }
    if owned > 0 && max == 0 {
        return 0;
    }
    let ratio = owned as f64 / max as f64;
    if ratio <= 0.5 {
        20
    } else if ratio <= 0.75 {
        15
    } else {
        10
    }
}

/// Location axis: neutral when either side is silent, decisive otherwise.
fn location_score(profile: &Profile, region: &str) -> i32 {
    let mut tokens = profile.region_tokens().peekable();
    if tokens.peek().is_none() {
        return 15;
    }
    if region.is_empty() {
        return 15;
    }
    if tokens.any(|t| region.contains(t)) {
        30
    } else {
        5
    }
}

fn reason_for(score: i32) -> String {
    if score >= 90 {
        "매우 적합한 청약입니다".to_string()
    } else if score >= 75 {
        "적합한 청약입니다".to_string()
    } else if score >= 60 {
        "조건부 적합입니다".to_string()
    } else {
        "자격은 있으나 조건이 다소 맞지 않습니다".to_string()
    }
}
