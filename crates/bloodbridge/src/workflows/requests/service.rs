use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::regions::RegionDirectory;
use crate::session::{Session, SessionError};
use crate::workflows::donors::{
    DonorMatcher, DonorRecord, DonorSearchQuery, RequestCriteria, ScoredDonor, UserRole,
};

use super::domain::{
    DonationRequest, DonationRequestForm, DonationRequestId, DonationStatus, DonorAssignment,
};
use super::repository::{DirectoryError, DonationRequestRepository, DonorDirectory, RepositoryError};
use super::validation::{validate_form, RequestValidationError};

/// Service composing the donor directory, region data, matcher and request store.
pub struct DonationRequestService<D, R> {
    directory: Arc<D>,
    repository: Arc<R>,
    regions: Arc<RegionDirectory>,
    matcher: DonorMatcher,
}

static REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> DonationRequestId {
    let id = REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    DonationRequestId(format!("req-{id:06}"))
}

impl<D, R> DonationRequestService<D, R>
where
    D: DonorDirectory + 'static,
    R: DonationRequestRepository + 'static,
{
    pub fn new(
        directory: Arc<D>,
        repository: Arc<R>,
        regions: Arc<RegionDirectory>,
        matcher: DonorMatcher,
    ) -> Self {
        Self {
            directory,
            repository,
            regions,
            matcher,
        }
    }

    pub fn regions(&self) -> &RegionDirectory {
        &self.regions
    }

    /// Criteria for the in-progress form; unknown district ids resolve to a blank name.
    pub fn criteria_for(&self, form: &DonationRequestForm) -> RequestCriteria {
        RequestCriteria {
            blood_group: form.blood_group,
            district: self
                .regions
                .resolve_district_name(form.recipient_district.trim())
                .unwrap_or_default()
                .to_string(),
            upazila: form.recipient_upazila.clone(),
        }
    }

    /// Ranked donor suggestions. Directory failures read as "no suggestions".
    pub fn suggest(&self, criteria: &RequestCriteria, now: DateTime<Utc>) -> Vec<ScoredDonor> {
        if criteria.blood_group.is_none() {
            return Vec::new();
        }

        match self.directory.donors() {
            Ok(donors) => {
                let suggestions = self.matcher.rank(&donors, criteria, now);
                debug!(
                    candidates = donors.len(),
                    suggested = suggestions.len(),
                    "ranked donor suggestions"
                );
                suggestions
            }
            Err(error) => {
                warn!(%error, "donor directory unavailable; returning no suggestions");
                Vec::new()
            }
        }
    }

    pub fn search(
        &self,
        query: &DonorSearchQuery,
    ) -> Result<Vec<DonorRecord>, DonationRequestServiceError> {
        let donors = self.directory.donors()?;
        Ok(donors
            .into_iter()
            .filter(|donor| query.matches(donor))
            .collect())
    }

    /// Validate and store a new request with a snapshot of the current suggestions.
    pub fn submit(
        &self,
        session: &Session,
        mut form: DonationRequestForm,
        now: DateTime<Utc>,
    ) -> Result<DonationRequest, DonationRequestServiceError> {
        let requester = session.requester()?;

        form.requester_email = requester.email.clone();
        if form.requester_name.trim().is_empty() {
            form.requester_name = requester.display_name.clone();
        }

        let validated = validate_form(form, &self.regions)?;
        let criteria = RequestCriteria {
            blood_group: Some(validated.blood_group),
            district: validated.district.name.clone(),
            upazila: validated.form.recipient_upazila.clone(),
        };
        let ai_recommendations = self.suggest(&criteria, now);
        let location_geo = validated.district.geo();
        let form = validated.form;

        let request = DonationRequest {
            id: next_request_id(),
            requester_name: form.requester_name,
            requester_email: form.requester_email,
            recipient_name: form.recipient_name,
            recipient_district: criteria.district,
            recipient_upazila: form.recipient_upazila,
            hospital_name: form.hospital_name,
            full_address: form.full_address,
            blood_group: validated.blood_group,
            donation_date: form.donation_date,
            donation_time: form.donation_time,
            request_message: form.request_message,
            urgency_level: form.urgency_level,
            units_needed: form.units_needed,
            patient_condition: form.patient_condition,
            hospital_phone: form.hospital_phone,
            needs_ambulance: form.needs_ambulance,
            donation_status: DonationStatus::Pending,
            location_geo,
            ai_recommendations,
            created_at: now,
            donor: None,
        };

        let stored = self.repository.insert(request)?;
        info!(
            request_id = %stored.id.0,
            blood_group = %stored.blood_group,
            urgency = stored.urgency_level.label(),
            recommendations = stored.ai_recommendations.len(),
            "donation request submitted"
        );
        Ok(stored)
    }

    pub fn get(&self, id: &DonationRequestId) -> Result<DonationRequest, DonationRequestServiceError> {
        let request = self.repository.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(request)
    }

    pub fn list_for_requester(
        &self,
        email: &str,
    ) -> Result<Vec<DonationRequest>, DonationRequestServiceError> {
        let mut requests = self.repository.by_requester(email)?;
        newest_first(&mut requests);
        Ok(requests)
    }

    /// The signed-in user's own requests, optionally narrowed to one status.
    pub fn my_requests(
        &self,
        session: &Session,
        status: Option<DonationStatus>,
    ) -> Result<Vec<DonationRequest>, DonationRequestServiceError> {
        let requester = session.requester()?;
        let mut requests = self.list_for_requester(&requester.email)?;
        retain_status(&mut requests, status);
        Ok(requests)
    }

    /// Open requests any visitor may browse.
    pub fn pending_requests(&self) -> Result<Vec<DonationRequest>, DonationRequestServiceError> {
        let mut requests = self.repository.all()?;
        retain_status(&mut requests, Some(DonationStatus::Pending));
        newest_first(&mut requests);
        Ok(requests)
    }

    /// Every stored request, for admins and assistants.
    pub fn list_all(
        &self,
        session: &Session,
        status: Option<DonationStatus>,
    ) -> Result<Vec<DonationRequest>, DonationRequestServiceError> {
        session.requester()?;
        if !is_staff(session.role()) {
            return Err(DonationRequestServiceError::NotPermitted);
        }

        let mut requests = self.repository.all()?;
        retain_status(&mut requests, status);
        newest_first(&mut requests);
        Ok(requests)
    }

    /// Replace the details of a pending request. The recommendation snapshot,
    /// requester identity and creation time are kept.
    pub fn edit(
        &self,
        id: &DonationRequestId,
        session: &Session,
        mut form: DonationRequestForm,
    ) -> Result<DonationRequest, DonationRequestServiceError> {
        let user = session.requester()?;
        let existing = self.get(id)?;
        let is_owner = existing.requester_email.eq_ignore_ascii_case(&user.email);
        if !is_owner && session.role() != UserRole::Admin {
            return Err(DonationRequestServiceError::NotPermitted);
        }
        if existing.donation_status != DonationStatus::Pending {
            return Err(DonationRequestServiceError::NotEditable {
                current: existing.donation_status,
            });
        }

        form.requester_name = existing.requester_name.clone();
        form.requester_email = existing.requester_email.clone();
        let validated = validate_form(form, &self.regions)?;
        let location_geo = validated.district.geo();
        let form = validated.form;

        let updated = DonationRequest {
            recipient_name: form.recipient_name,
            recipient_district: validated.district.name.clone(),
            recipient_upazila: form.recipient_upazila,
            hospital_name: form.hospital_name,
            full_address: form.full_address,
            blood_group: validated.blood_group,
            donation_date: form.donation_date,
            donation_time: form.donation_time,
            request_message: form.request_message,
            urgency_level: form.urgency_level,
            units_needed: form.units_needed,
            patient_condition: form.patient_condition,
            hospital_phone: form.hospital_phone,
            needs_ambulance: form.needs_ambulance,
            location_geo,
            ..existing
        };

        self.repository.update_if(DonationStatus::Pending, updated.clone())?;
        info!(request_id = %id.0, editor = %user.email, "donation request edited");
        Ok(updated)
    }

    /// Move a request along its lifecycle. Only the requester, the assigned
    /// donor, or an admin or assistant may do so.
    pub fn update_status(
        &self,
        id: &DonationRequestId,
        next: DonationStatus,
        session: &Session,
    ) -> Result<DonationRequest, DonationRequestServiceError> {
        let user = session.requester()?;
        let mut request = self.get(id)?;

        let is_owner = request.requester_email.eq_ignore_ascii_case(&user.email);
        let is_assigned_donor = request
            .donor
            .as_ref()
            .is_some_and(|donor| donor.donor_email.eq_ignore_ascii_case(&user.email));
        if !is_owner && !is_assigned_donor && !is_staff(session.role()) {
            return Err(DonationRequestServiceError::NotPermitted);
        }

        let current = request.donation_status;
        if !current.can_transition_to(next) {
            return Err(DonationRequestServiceError::InvalidTransition {
                current,
                requested: next,
            });
        }

        request.donation_status = next;
        self.repository.update_if(current, request.clone())?;
        info!(
            request_id = %id.0,
            from = current.label(),
            to = next.label(),
            actor = %user.email,
            "donation status updated"
        );
        Ok(request)
    }

    /// A signed-in donor takes a pending request, moving it to `inprogress`.
    pub fn accept(
        &self,
        id: &DonationRequestId,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<DonationRequest, DonationRequestServiceError> {
        let donor = session.requester()?;
        if session.role() != UserRole::Donor {
            return Err(DonationRequestServiceError::NotADonor);
        }

        let mut request = self.get(id)?;
        if request.requester_email.eq_ignore_ascii_case(&donor.email) {
            return Err(DonationRequestServiceError::OwnRequest);
        }

        let current = request.donation_status;
        if !current.can_transition_to(DonationStatus::InProgress) {
            return Err(DonationRequestServiceError::InvalidTransition {
                current,
                requested: DonationStatus::InProgress,
            });
        }

        request.donation_status = DonationStatus::InProgress;
        request.donor = Some(DonorAssignment {
            donor_name: donor.display_name.clone(),
            donor_email: donor.email.clone(),
            assigned_at: now,
        });
        self.repository.update_if(current, request.clone())?;
        info!(request_id = %id.0, donor = %donor.email, "donation request accepted");
        Ok(request)
    }
}

fn is_staff(role: UserRole) -> bool {
    matches!(role, UserRole::Admin | UserRole::Assistant)
}

fn retain_status(requests: &mut Vec<DonationRequest>, status: Option<DonationStatus>) {
    if let Some(status) = status {
        requests.retain(|request| request.donation_status == status);
    }
}

fn newest_first(requests: &mut [DonationRequest]) {
    requests.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.0.cmp(&a.id.0))
    });
}

/// Error raised by the donation request service.
#[derive(Debug, thiserror::Error)]
pub enum DonationRequestServiceError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Validation(#[from] RequestValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(
        "cannot move donation request from {} to {}",
        .current.label(),
        .requested.label()
    )]
    InvalidTransition {
        current: DonationStatus,
        requested: DonationStatus,
    },
    #[error("only donors can accept donation requests")]
    NotADonor,
    #[error("requesters cannot accept their own donation request")]
    OwnRequest,
    #[error("not permitted to change this donation request")]
    NotPermitted,
    #[error("only pending donation requests can be edited; this one is {}", .current.label())]
    NotEditable { current: DonationStatus },
}
