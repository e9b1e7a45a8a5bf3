use chrono::{DateTime, Utc};

use super::super::domain::{AvailabilityStatus, DonorRecord, RequestCriteria};
use super::{MatchFactor, ScoreComponent};

pub(crate) const BLOOD_GROUP_MATCH_POINTS: i16 = 5;
pub(crate) const DISTRICT_MATCH_POINTS: i16 = 3;
pub(crate) const UPAZILA_MATCH_POINTS: i16 = 2;
pub(crate) const AVAILABLE_POINTS: i16 = 4;
pub(crate) const RECOVERED_DONOR_POINTS: i16 = 2;
pub(crate) const RECENT_DONATION_PENALTY: i16 = -3;

pub(crate) const RECOVERED_AFTER_DAYS: f64 = 90.0;
pub(crate) const COOLDOWN_DAYS: f64 = 60.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

pub(crate) fn score_donor(
    donor: &DonorRecord,
    criteria: &RequestCriteria,
    now: DateTime<Utc>,
) -> (Vec<ScoreComponent>, i16) {
    let mut components = Vec::new();

    if let (Some(wanted), Some(actual)) = (criteria.blood_group, donor.blood_group) {
        if wanted == actual {
            components.push(ScoreComponent {
                factor: MatchFactor::BloodGroup,
                score: BLOOD_GROUP_MATCH_POINTS,
                notes: format!("blood group {actual} matches request"),
            });
        }
    }

    if location_matches(&criteria.district, &donor.district) {
        components.push(ScoreComponent {
            factor: MatchFactor::District,
            score: DISTRICT_MATCH_POINTS,
            notes: format!("same district ({})", donor.district),
        });
    }

    if location_matches(&criteria.upazila, &donor.upazila) {
        components.push(ScoreComponent {
            factor: MatchFactor::Upazila,
            score: UPAZILA_MATCH_POINTS,
            notes: format!("same upazila ({})", donor.upazila),
        });
    }

    if donor.availability_status == AvailabilityStatus::Available {
        components.push(ScoreComponent {
            factor: MatchFactor::Availability,
            score: AVAILABLE_POINTS,
            notes: "donor marked available".to_string(),
        });
    }

    if let Some(last_donation) = donor.last_donation_at() {
        let age_in_days = (now - last_donation).num_milliseconds() as f64 / MILLIS_PER_DAY;
        if age_in_days > RECOVERED_AFTER_DAYS {
            components.push(ScoreComponent {
                factor: MatchFactor::DonationRecency,
                score: RECOVERED_DONOR_POINTS,
                notes: format!("last donation {age_in_days:.0} days ago"),
            });
        } else if age_in_days < COOLDOWN_DAYS {
            components.push(ScoreComponent {
                factor: MatchFactor::DonationRecency,
                score: RECENT_DONATION_PENALTY,
                notes: format!("last donation {age_in_days:.0} days ago, likely in cooldown"),
            });
        }
    }

    let total = components.iter().map(|component| component.score).sum();
    (components, total)
}

// Blank criteria never count as a location match.
fn location_matches(wanted: &str, actual: &str) -> bool {
    !wanted.is_empty() && wanted == actual
}
