use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::regions::GeoPoint;
use crate::workflows::donors::domain::deserialize_lenient_blood_group;
use crate::workflows::donors::{BloodGroup, ScoredDonor};

/// Identifier wrapper for stored donation requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DonationRequestId(pub String);

/// Requester-set classification shown in dashboards; not used for scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    #[default]
    Critical,
    Urgent,
    Flexible,
}

impl UrgencyLevel {
    pub const fn label(self) -> &'static str {
        match self {
            UrgencyLevel::Critical => "critical",
            UrgencyLevel::Urgent => "urgent",
            UrgencyLevel::Flexible => "flexible",
        }
    }
}

/// Lifecycle of a donation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    Pending,
    InProgress,
    Done,
    Canceled,
}

impl DonationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            DonationStatus::Pending => "pending",
            DonationStatus::InProgress => "inprogress",
            DonationStatus::Done => "done",
            DonationStatus::Canceled => "canceled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, DonationStatus::Done | DonationStatus::Canceled)
    }

    pub const fn can_transition_to(self, next: DonationStatus) -> bool {
        matches!(
            (self, next),
            (DonationStatus::Pending, DonationStatus::InProgress)
                | (DonationStatus::Pending, DonationStatus::Canceled)
                | (DonationStatus::InProgress, DonationStatus::Done)
                | (DonationStatus::InProgress, DonationStatus::Canceled)
        )
    }
}

fn default_units() -> u8 {
    1
}

fn default_needs_ambulance() -> bool {
    true
}

/// Form fields captured while a requester drafts a donation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRequestForm {
    #[serde(default)]
    pub requester_name: String,
    #[serde(default)]
    pub requester_email: String,
    pub recipient_name: String,
    /// District id from the region directory.
    pub recipient_district: String,
    pub recipient_upazila: String,
    pub hospital_name: String,
    pub full_address: String,
    #[serde(default, deserialize_with = "deserialize_lenient_blood_group")]
    pub blood_group: Option<BloodGroup>,
    pub donation_date: NaiveDate,
    #[serde(
        serialize_with = "serialize_time",
        deserialize_with = "deserialize_time"
    )]
    pub donation_time: NaiveTime,
    pub request_message: String,
    #[serde(default)]
    pub urgency_level: UrgencyLevel,
    #[serde(default = "default_units")]
    pub units_needed: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_phone: Option<String>,
    #[serde(default = "default_needs_ambulance")]
    pub needs_ambulance: bool,
}

fn serialize_time<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&time.format("%H:%M").to_string())
}

fn deserialize_time<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|err| serde::de::Error::custom(format!("invalid donation time '{raw}': {err}")))
}

/// Donor who accepted a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorAssignment {
    pub donor_name: String,
    pub donor_email: String,
    pub assigned_at: DateTime<Utc>,
}

/// Stored donation request. `ai_recommendations` is a snapshot taken at submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRequest {
    pub id: DonationRequestId,
    pub requester_name: String,
    pub requester_email: String,
    pub recipient_name: String,
    /// Resolved district display name.
    pub recipient_district: String,
    pub recipient_upazila: String,
    pub hospital_name: String,
    pub full_address: String,
    pub blood_group: BloodGroup,
    pub donation_date: NaiveDate,
    #[serde(
        serialize_with = "serialize_time",
        deserialize_with = "deserialize_time"
    )]
    pub donation_time: NaiveTime,
    pub request_message: String,
    pub urgency_level: UrgencyLevel,
    pub units_needed: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_phone: Option<String>,
    pub needs_ambulance: bool,
    pub donation_status: DonationStatus,
    pub location_geo: Option<GeoPoint>,
    pub ai_recommendations: Vec<ScoredDonor>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donor: Option<DonorAssignment>,
}
