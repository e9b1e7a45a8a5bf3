use crate::workflows::donors::DonorRecord;

use super::domain::{DonationRequest, DonationRequestId, DonationStatus};

/// Storage abstraction so the service module can be exercised in isolation.
pub trait DonationRequestRepository: Send + Sync {
    fn insert(&self, request: DonationRequest) -> Result<DonationRequest, RepositoryError>;
    /// Replace the stored request only while its status still equals `expected`.
    /// The check and the write must happen under one lock or transaction.
    fn update_if(
        &self,
        expected: DonationStatus,
        request: DonationRequest,
    ) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &DonationRequestId) -> Result<Option<DonationRequest>, RepositoryError>;
    fn by_requester(&self, email: &str) -> Result<Vec<DonationRequest>, RepositoryError>;
    fn all(&self) -> Result<Vec<DonationRequest>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record is now {} and was changed by another update", .found.label())]
    Stale { found: DonationStatus },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Source of registered donors (all users with role `donor`).
pub trait DonorDirectory: Send + Sync {
    fn donors(&self) -> Result<Vec<DonorRecord>, DirectoryError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    #[error("donor directory unavailable: {0}")]
    Unavailable(String),
}
