//! Donor suggestion scoring.
//!
//! Eligible donors (role `donor`, status `active`) earn additive points for blood-group,
//! district, upazila and availability matches, adjusted by how long ago they last donated.
//! The ranking is a pure function of its inputs and is recomputed on every call.

mod rules;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{DonorRecord, RequestCriteria, ScoredDonor};

/// Number of suggestions surfaced to requesters.
pub const DEFAULT_SUGGESTION_LIMIT: usize = 3;

/// Rank `donors` against `criteria` and keep the top three.
pub fn score_donors(
    donors: &[DonorRecord],
    criteria: &RequestCriteria,
    now: DateTime<Utc>,
) -> Vec<ScoredDonor> {
    DonorMatcher::default().rank(donors, criteria, now)
}

/// Stateless ranker holding the suggestion limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DonorMatcher {
    limit: usize,
}

impl Default for DonorMatcher {
    fn default() -> Self {
        Self::with_limit(DEFAULT_SUGGESTION_LIMIT)
    }
}

impl DonorMatcher {
    pub fn with_limit(limit: usize) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Score eligible donors, sort descending (stable on ties) and truncate.
    pub fn rank(
        &self,
        donors: &[DonorRecord],
        criteria: &RequestCriteria,
        now: DateTime<Utc>,
    ) -> Vec<ScoredDonor> {
        if criteria.blood_group.is_none() {
            return Vec::new();
        }

        let mut scored: Vec<ScoredDonor> = donors
            .iter()
            .filter(|donor| donor.is_eligible())
            .map(|donor| {
                let (_, score) = rules::score_donor(donor, criteria, now);
                ScoredDonor {
                    name: donor.name.clone(),
                    email: donor.email.clone(),
                    district: donor.district.clone(),
                    upazila: donor.upazila.clone(),
                    availability_status: donor.availability_status,
                    score,
                }
            })
            .collect();

        scored.sort_by(|left, right| right.score.cmp(&left.score));
        scored.truncate(self.limit);
        scored
    }

    /// Per-factor contributions for a single donor, ignoring eligibility.
    pub fn breakdown(
        &self,
        donor: &DonorRecord,
        criteria: &RequestCriteria,
        now: DateTime<Utc>,
    ) -> DonorScoreBreakdown {
        let (components, total_score) = rules::score_donor(donor, criteria, now);
        DonorScoreBreakdown {
            email: donor.email.clone(),
            eligible: donor.is_eligible(),
            total_score,
            components,
        }
    }
}

/// Factors that contribute to a donor's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchFactor {
    BloodGroup,
    District,
    Upazila,
    Availability,
    DonationRecency,
}

/// Discrete contribution to a donor score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: MatchFactor,
    pub score: i16,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonorScoreBreakdown {
    pub email: String,
    pub eligible: bool,
    pub total_score: i16,
    pub components: Vec<ScoreComponent>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::donors::domain::{AccountStatus, AvailabilityStatus, BloodGroup, UserRole};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    fn days_ago(days: i64) -> Option<String> {
        Some((now() - Duration::days(days)).to_rfc3339())
    }

    fn donor(email: &str) -> DonorRecord {
        DonorRecord {
            email: email.to_string(),
            name: email.split('@').next().unwrap_or_default().to_string(),
            blood_group: Some(BloodGroup::OPositive),
            district: "Dhaka".to_string(),
            upazila: "Savar".to_string(),
            availability_status: AvailabilityStatus::Available,
            status: AccountStatus::Active,
            role: UserRole::Donor,
            last_donation_date: None,
        }
    }

    fn criteria() -> RequestCriteria {
        RequestCriteria {
            blood_group: Some(BloodGroup::OPositive),
            district: "Dhaka".to_string(),
            upazila: "Savar".to_string(),
        }
    }

    fn score_of(donor: DonorRecord) -> i16 {
        let ranked = score_donors(&[donor], &criteria(), now());
        ranked.first().expect("donor ranked").score
    }

    #[test]
    fn full_match_scores_fourteen_before_recency() {
        assert_eq!(score_of(donor("a@bb.org")), 14);
    }

    #[test]
    fn recency_adjusts_full_match() {
        let mut recovered = donor("a@bb.org");
        recovered.last_donation_date = days_ago(120);
        assert_eq!(score_of(recovered), 16);

        let mut cooling = donor("b@bb.org");
        cooling.last_donation_date = days_ago(30);
        assert_eq!(score_of(cooling), 11);
    }

    #[test]
    fn recency_thresholds_are_strict() {
        for days in [60, 75, 90] {
            let mut candidate = donor("edge@bb.org");
            candidate.last_donation_date = days_ago(days);
            assert_eq!(score_of(candidate), 14, "{days} days should be neutral");
        }
    }

    #[test]
    fn malformed_last_donation_date_contributes_nothing() {
        let mut candidate = donor("a@bb.org");
        candidate.last_donation_date = Some("sometime in March".to_string());
        assert_eq!(score_of(candidate), 14);
    }

    #[test]
    fn ineligible_donors_are_excluded() {
        let mut blocked = donor("blocked@bb.org");
        blocked.status = AccountStatus::Blocked;
        let mut admin = donor("admin@bb.org");
        admin.role = UserRole::Admin;
        let mut unknown_status = donor("pending@bb.org");
        unknown_status.status = AccountStatus::Unknown;
        let mut low = donor("low@bb.org");
        low.blood_group = Some(BloodGroup::ANegative);
        low.district = "Sylhet".to_string();
        low.upazila = "Beanibazar".to_string();
        low.availability_status = AvailabilityStatus::Resting;

        let ranked = score_donors(&[blocked, admin, unknown_status, low], &criteria(), now());

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].email, "low@bb.org");
        assert_eq!(ranked[0].score, 0);
    }

    #[test]
    fn ties_keep_input_order_and_output_is_truncated() {
        let donors: Vec<DonorRecord> = (0..5)
            .map(|index| donor(&format!("d{index}@bb.org")))
            .collect();

        let ranked = score_donors(&donors, &criteria(), now());

        let emails: Vec<&str> = ranked.iter().map(|entry| entry.email.as_str()).collect();
        assert_eq!(emails, ["d0@bb.org", "d1@bb.org", "d2@bb.org"]);
    }

    #[test]
    fn missing_blood_group_criteria_yields_no_suggestions() {
        let criteria = RequestCriteria {
            blood_group: None,
            ..criteria()
        };
        assert!(score_donors(&[donor("a@bb.org")], &criteria, now()).is_empty());
    }

    #[test]
    fn blank_location_criteria_never_match_blank_donor_locations() {
        let mut candidate = donor("a@bb.org");
        candidate.district.clear();
        candidate.upazila.clear();
        let criteria = RequestCriteria {
            blood_group: Some(BloodGroup::OPositive),
            district: String::new(),
            upazila: String::new(),
        };

        let ranked = score_donors(&[candidate], &criteria, now());
        assert_eq!(ranked[0].score, 9);
    }

    #[test]
    fn custom_limit_controls_truncation() {
        let donors: Vec<DonorRecord> = (0..4)
            .map(|index| donor(&format!("d{index}@bb.org")))
            .collect();
        let matcher = DonorMatcher::with_limit(1);
        assert_eq!(matcher.rank(&donors, &criteria(), now()).len(), 1);
        assert_eq!(DonorMatcher::default().limit(), DEFAULT_SUGGESTION_LIMIT);
    }

    #[test]
    fn breakdown_lists_each_contribution() {
        let mut candidate = donor("a@bb.org");
        candidate.last_donation_date = days_ago(10);
        candidate.status = AccountStatus::Blocked;

        let breakdown = DonorMatcher::default().breakdown(&candidate, &criteria(), now());

        assert!(!breakdown.eligible);
        assert_eq!(breakdown.total_score, 11);
        let factors: Vec<MatchFactor> = breakdown
            .components
            .iter()
            .map(|component| component.factor)
            .collect();
        assert_eq!(
            factors,
            [
                MatchFactor::BloodGroup,
                MatchFactor::District,
                MatchFactor::Upazila,
                MatchFactor::Availability,
                MatchFactor::DonationRecency,
            ]
        );
        assert_eq!(breakdown.components[4].score, -3);
    }
}
