//! Donor directory records, suggestion scoring, search and snapshot import.

pub mod domain;
pub mod import;
pub mod matching;
pub mod search;

pub use domain::{
    parse_timestamp, AccountStatus, AvailabilityStatus, BloodGroup, DonorRecord,
    RequestCriteria, ScoredDonor, UserRole,
};
pub use import::{DonorImportError, DonorImporter};
pub use matching::{
    score_donors, DonorMatcher, DonorScoreBreakdown, MatchFactor, ScoreComponent,
    DEFAULT_SUGGESTION_LIMIT,
};
pub use search::DonorSearchQuery;
