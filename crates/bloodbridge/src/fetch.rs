//! Explicit lifecycle for externally fetched data.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::workflows::donors::{DonorMatcher, DonorRecord, RequestCriteria, ScoredDonor};
use crate::workflows::requests::DonorDirectory;

/// State of an outstanding fetch as seen by the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<T> {
    Pending,
    Resolved(T),
    Rejected(String),
}

impl<T> FetchState<T> {
    pub fn from_result<E: std::fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Resolved(value),
            Err(error) => Self::Rejected(error.to_string()),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn resolved(&self) -> Option<&T> {
        match self {
            Self::Resolved(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> FetchState<U> {
        match self {
            Self::Pending => FetchState::Pending,
            Self::Resolved(value) => FetchState::Resolved(f(value)),
            Self::Rejected(reason) => FetchState::Rejected(reason),
        }
    }
}

/// Donor snapshot backing the suggestion panel of a single form session.
#[derive(Debug, Clone)]
pub struct DonorPool {
    state: FetchState<Vec<DonorRecord>>,
    matcher: DonorMatcher,
}

impl Default for DonorPool {
    fn default() -> Self {
        Self::new(DonorMatcher::default())
    }
}

impl DonorPool {
    pub fn new(matcher: DonorMatcher) -> Self {
        Self {
            state: FetchState::Pending,
            matcher,
        }
    }

    /// Fetch the directory on a blocking worker and settle the pool.
    pub async fn load<D>(directory: Arc<D>, matcher: DonorMatcher) -> Self
    where
        D: DonorDirectory + 'static,
    {
        let joined = tokio::task::spawn_blocking(move || directory.donors()).await;
        let state = match joined {
            Ok(result) => FetchState::from_result(result),
            Err(join_error) => FetchState::Rejected(join_error.to_string()),
        };

        if let FetchState::Rejected(reason) = &state {
            warn!(%reason, "donor directory fetch rejected");
        }

        Self { state, matcher }
    }

    pub fn state(&self) -> &FetchState<Vec<DonorRecord>> {
        &self.state
    }

    pub fn settle(&mut self, state: FetchState<Vec<DonorRecord>>) {
        self.state = state;
    }

    /// Ranked suggestions; empty until the snapshot resolves.
    pub fn suggestions(&self, criteria: &RequestCriteria, now: DateTime<Utc>) -> Vec<ScoredDonor> {
        self.state
            .resolved()
            .map(|donors| self.matcher.rank(donors, criteria, now))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::donors::{AccountStatus, AvailabilityStatus, BloodGroup, UserRole};
    use crate::workflows::requests::DirectoryError;
    use chrono::TimeZone;

    struct FixedDirectory(Result<Vec<DonorRecord>, String>);

    impl DonorDirectory for FixedDirectory {
        fn donors(&self) -> Result<Vec<DonorRecord>, DirectoryError> {
            self.0.clone().map_err(DirectoryError::Unavailable)
        }
    }

    fn donor() -> DonorRecord {
        DonorRecord {
            email: "tania@bb.org".to_string(),
            name: "Tania".to_string(),
            blood_group: Some(BloodGroup::BNegative),
            district: "Khulna".to_string(),
            upazila: "Rupsa".to_string(),
            availability_status: AvailabilityStatus::Available,
            status: AccountStatus::Active,
            role: UserRole::Donor,
            last_donation_date: None,
        }
    }

    fn criteria() -> RequestCriteria {
        RequestCriteria {
            blood_group: Some(BloodGroup::BNegative),
            district: "Khulna".to_string(),
            upazila: "Rupsa".to_string(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn pending_pool_has_no_suggestions() {
        let pool = DonorPool::default();
        assert!(pool.state().is_pending());
        assert!(pool.suggestions(&criteria(), now()).is_empty());
    }

    #[test]
    fn fetch_state_maps_results() {
        let ok: FetchState<usize> = FetchState::from_result(Ok::<_, String>(2));
        assert_eq!(ok.map(|count| count * 2), FetchState::Resolved(4));

        let failed: FetchState<usize> = FetchState::from_result(Err("offline"));
        assert_eq!(failed, FetchState::Rejected("offline".to_string()));
    }

    #[tokio::test]
    async fn load_resolves_directory_snapshot() {
        let directory = Arc::new(FixedDirectory(Ok(vec![donor()])));
        let pool = DonorPool::load(directory, DonorMatcher::default()).await;

        let suggestions = pool.suggestions(&criteria(), now());
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].score, 14);
    }

    #[tokio::test]
    async fn load_rejection_yields_empty_suggestions() {
        let directory = Arc::new(FixedDirectory(Err("directory offline".to_string())));
        let pool = DonorPool::load(directory, DonorMatcher::default()).await;

        assert!(matches!(pool.state(), FetchState::Rejected(reason) if reason.contains("offline")));
        assert!(pool.suggestions(&criteria(), now()).is_empty());
    }

    #[test]
    fn settle_replaces_previous_snapshot() {
        let mut pool = DonorPool::default();
        pool.settle(FetchState::Resolved(vec![donor()]));
        assert_eq!(pool.suggestions(&criteria(), now()).len(), 1);

        pool.settle(FetchState::Resolved(Vec::new()));
        assert!(pool.suggestions(&criteria(), now()).is_empty());
    }
}
