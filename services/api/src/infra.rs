use bloodbridge::config::DataConfig;
use bloodbridge::regions::{RegionDirectory, RegionError};
use bloodbridge::workflows::donors::{parse_timestamp, BloodGroup, DonorRecord, UserRole};
use bloodbridge::workflows::requests::{
    DirectoryError, DonationRequest, DonationRequestId, DonationRequestRepository,
    DonationStatus, DonorDirectory, RepositoryError,
};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, RwLock};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryDonationRequestRepository {
    records: Arc<Mutex<HashMap<DonationRequestId, DonationRequest>>>,
}

impl DonationRequestRepository for InMemoryDonationRequestRepository {
    fn insert(&self, request: DonationRequest) -> Result<DonationRequest, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&request.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(request.id.clone(), request.clone());
        Ok(request)
    }

    fn update_if(
        &self,
        expected: DonationStatus,
        request: DonationRequest,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = guard.get_mut(&request.id).ok_or(RepositoryError::NotFound)?;
        if stored.donation_status != expected {
            return Err(RepositoryError::Stale {
                found: stored.donation_status,
            });
        }
        *stored = request;
        Ok(())
    }

    fn fetch(&self, id: &DonationRequestId) -> Result<Option<DonationRequest>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn by_requester(&self, email: &str) -> Result<Vec<DonationRequest>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut requests: Vec<DonationRequest> = guard
            .values()
            .filter(|request| request.requester_email.eq_ignore_ascii_case(email))
            .cloned()
            .collect();
        requests.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(requests)
    }

    fn all(&self) -> Result<Vec<DonationRequest>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

/// Donor directory held in memory, seeded from an export or the demo roster.
#[derive(Default, Clone)]
pub(crate) struct SeededDonorDirectory {
    donors: Arc<RwLock<Vec<DonorRecord>>>,
}

impl SeededDonorDirectory {
    pub(crate) fn new(donors: Vec<DonorRecord>) -> Self {
        Self {
            donors: Arc::new(RwLock::new(donors)),
        }
    }

    pub(crate) fn donor_count(&self) -> usize {
        self.donors
            .read()
            .expect("directory lock poisoned")
            .iter()
            .filter(|donor| donor.role == UserRole::Donor)
            .count()
    }
}

impl DonorDirectory for SeededDonorDirectory {
    fn donors(&self) -> Result<Vec<DonorRecord>, DirectoryError> {
        let guard = self.donors.read().expect("directory lock poisoned");
        Ok(guard.clone())
    }
}

/// Region files when both paths are configured, otherwise the built-in subset.
pub(crate) fn load_regions(data: &DataConfig) -> Result<RegionDirectory, RegionError> {
    match (&data.districts_path, &data.upazilas_path) {
        (Some(districts), Some(upazilas)) => RegionDirectory::from_paths(districts, upazilas),
        _ => Ok(RegionDirectory::standard()),
    }
}

pub(crate) fn parse_blood_group(raw: &str) -> Result<BloodGroup, String> {
    raw.parse::<BloodGroup>().map_err(|err| err.to_string())
}

pub(crate) fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(raw).ok_or_else(|| {
        format!("failed to parse '{raw}' as an RFC 3339 timestamp or YYYY-MM-DD date")
    })
}
