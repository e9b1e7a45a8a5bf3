use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde_json::Value;

use crate::regions::RegionDirectory;
use crate::session::{Session, SessionUser};
use crate::workflows::donors::{
    AccountStatus, AvailabilityStatus, BloodGroup, DonorMatcher, DonorRecord, UserRole,
};
use crate::workflows::requests::domain::{
    DonationRequest, DonationRequestForm, DonationRequestId, DonationStatus, UrgencyLevel,
};
use crate::workflows::requests::repository::{
    DirectoryError, DonationRequestRepository, DonorDirectory, RepositoryError,
};
use crate::workflows::requests::{donation_router, DonationRequestService};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
}

pub(super) fn days_ago(days: i64) -> Option<String> {
    Some((now() - Duration::days(days)).to_rfc3339())
}

pub(super) fn donor(email: &str, group: BloodGroup, district: &str, upazila: &str) -> DonorRecord {
    DonorRecord {
        email: email.to_string(),
        name: email.split('@').next().unwrap_or_default().to_string(),
        blood_group: Some(group),
        district: district.to_string(),
        upazila: upazila.to_string(),
        availability_status: AvailabilityStatus::Available,
        status: AccountStatus::Active,
        role: UserRole::Donor,
        last_donation_date: None,
    }
}

pub(super) fn donors() -> Vec<DonorRecord> {
    let mut recovered = donor("arif@bb.org", BloodGroup::OPositive, "Dhaka", "Savar");
    recovered.last_donation_date = days_ago(120);
    let mut resting = donor("bina@bb.org", BloodGroup::OPositive, "Dhaka", "Savar");
    resting.availability_status = AvailabilityStatus::Resting;
    let mut blocked = donor("chandan@bb.org", BloodGroup::OPositive, "Dhaka", "Savar");
    blocked.status = AccountStatus::Blocked;

    vec![
        resting,
        blocked,
        donor("dipa@bb.org", BloodGroup::ANegative, "Sylhet", "Golapganj"),
        recovered,
        donor("emon@bb.org", BloodGroup::OPositive, "Dhaka", "Dhamrai"),
    ]
}

pub(super) fn form() -> DonationRequestForm {
    DonationRequestForm {
        requester_name: "Sadia Rahman".to_string(),
        requester_email: String::new(),
        recipient_name: "Karim Rahman".to_string(),
        recipient_district: "1".to_string(),
        recipient_upazila: "Savar".to_string(),
        hospital_name: "Enam Medical College".to_string(),
        full_address: "Thana Road, Savar".to_string(),
        blood_group: Some(BloodGroup::OPositive),
        donation_date: NaiveDate::from_ymd_opt(2025, 6, 3).expect("valid date"),
        donation_time: NaiveTime::from_hms_opt(10, 30, 0).expect("valid time"),
        request_message: "Scheduled bypass surgery".to_string(),
        urgency_level: UrgencyLevel::Urgent,
        units_needed: 2,
        patient_condition: Some("Cardiac surgery".to_string()),
        hospital_phone: None,
        needs_ambulance: false,
    }
}

pub(super) fn requester_session() -> Session {
    Session::signed_in(
        SessionUser {
            email: "sadia@bb.org".to_string(),
            display_name: "Sadia Rahman".to_string(),
            status: AccountStatus::Active,
        },
        UserRole::Receiver,
    )
}

pub(super) fn donor_session(email: &str) -> Session {
    Session::signed_in(
        SessionUser {
            email: email.to_string(),
            display_name: "Arif Hossain".to_string(),
            status: AccountStatus::Active,
        },
        UserRole::Donor,
    )
}

pub(super) fn staff_session(email: &str, role: UserRole) -> Session {
    Session::signed_in(
        SessionUser {
            email: email.to_string(),
            display_name: "Platform Staff".to_string(),
            status: AccountStatus::Active,
        },
        role,
    )
}

pub(super) type TestService = DonationRequestService<StaticDirectory, MemoryRepository>;

pub(super) fn build_service() -> (TestService, Arc<MemoryRepository>) {
    build_service_with(StaticDirectory::new(donors()))
}

pub(super) fn build_service_with(directory: StaticDirectory) -> (TestService, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = DonationRequestService::new(
        Arc::new(directory),
        repository.clone(),
        Arc::new(RegionDirectory::standard()),
        DonorMatcher::default(),
    );
    (service, repository)
}

pub(super) fn router(service: TestService) -> axum::Router {
    donation_router(Arc::new(service))
}

pub(super) struct StaticDirectory {
    donors: Result<Vec<DonorRecord>, String>,
}

impl StaticDirectory {
    pub(super) fn new(donors: Vec<DonorRecord>) -> Self {
        Self { donors: Ok(donors) }
    }

    pub(super) fn offline() -> Self {
        Self {
            donors: Err("connection refused".to_string()),
        }
    }
}

impl DonorDirectory for StaticDirectory {
    fn donors(&self) -> Result<Vec<DonorRecord>, DirectoryError> {
        self.donors.clone().map_err(DirectoryError::Unavailable)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<DonationRequestId, DonationRequest>>>,
}

impl DonationRequestRepository for MemoryRepository {
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
        Ok(guard
            .values()
            .filter(|request| request.requester_email == email)
            .cloned()
            .collect())
    }

    fn all(&self) -> Result<Vec<DonationRequest>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

pub(super) struct UnavailableRepository;

impl DonationRequestRepository for UnavailableRepository {
    fn insert(&self, _request: DonationRequest) -> Result<DonationRequest, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_if(
        &self,
        _expected: DonationStatus,
        _request: DonationRequest,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &DonationRequestId) -> Result<Option<DonationRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn by_requester(&self, _email: &str) -> Result<Vec<DonationRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn all(&self) -> Result<Vec<DonationRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
