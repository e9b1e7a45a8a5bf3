//! Donation request intake, validation, lifecycle and HTTP surface.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub(crate) mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    DonationRequest, DonationRequestForm, DonationRequestId, DonationStatus, DonorAssignment,
    UrgencyLevel,
};
pub use repository::{DirectoryError, DonationRequestRepository, DonorDirectory, RepositoryError};
pub use router::donation_router;
pub use service::{DonationRequestService, DonationRequestServiceError};
pub use validation::RequestValidationError;
