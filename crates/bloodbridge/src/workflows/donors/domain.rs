use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Canonical ABO/Rh blood groups accepted by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodGroup {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::APositive,
            Self::ANegative,
            Self::BPositive,
            Self::BNegative,
            Self::AbPositive,
            Self::AbNegative,
            Self::OPositive,
            Self::ONegative,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::APositive => "A+",
            Self::ANegative => "A-",
            Self::BPositive => "B+",
            Self::BNegative => "B-",
            Self::AbPositive => "AB+",
            Self::AbNegative => "AB-",
            Self::OPositive => "O+",
            Self::ONegative => "O-",
        }
    }

    /// Lenient parse used for externally supplied data; blanks and unknown groups yield `None`.
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized blood group '{0}'")]
pub struct UnknownBloodGroup(pub String);

impl FromStr for BloodGroup {
    type Err = UnknownBloodGroup;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_uppercase();
        Self::ordered()
            .into_iter()
            .find(|group| group.label() == normalized)
            .ok_or_else(|| UnknownBloodGroup(raw.to_string()))
    }
}

impl<'de> Deserialize<'de> for BloodGroup {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Deserialize an optional blood group, mapping blanks and unknown values to `None`.
pub fn deserialize_lenient_blood_group<'de, D>(
    deserializer: D,
) -> Result<Option<BloodGroup>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(BloodGroup::parse_lenient))
}

/// Directory exports write `null` for unset profile fields.
fn deserialize_nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Self-reported readiness of a donor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", rename_all = "kebab-case")]
pub enum AvailabilityStatus {
    Available,
    Resting,
    MedicalReview,
    #[default]
    Unknown,
}

impl AvailabilityStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Resting => "resting",
            Self::MedicalReview => "medical-review",
            Self::Unknown => "unknown",
        }
    }
}

impl From<String> for AvailabilityStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "available" => Self::Available,
            "resting" => Self::Resting,
            "medical-review" | "medical_review" => Self::MedicalReview,
            _ => Self::Unknown,
        }
    }
}

impl From<Option<String>> for AvailabilityStatus {
    fn from(value: Option<String>) -> Self {
        value.map(Self::from).unwrap_or_default()
    }
}

/// Account standing maintained by administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Blocked,
    #[default]
    Unknown,
}

impl AccountStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Blocked => "blocked",
            Self::Unknown => "unknown",
        }
    }
}

impl From<String> for AccountStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Self::Active,
            "blocked" => Self::Blocked,
            _ => Self::Unknown,
        }
    }
}

impl From<Option<String>> for AccountStatus {
    fn from(value: Option<String>) -> Self {
        value.map(Self::from).unwrap_or_default()
    }
}

/// Platform roles. `recipient` is accepted as an alias for `receiver`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", rename_all = "snake_case")]
pub enum UserRole {
    Donor,
    Receiver,
    Admin,
    Assistant,
    User,
    #[default]
    Unknown,
}

impl UserRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Donor => "donor",
            Self::Receiver => "receiver",
            Self::Admin => "admin",
            Self::Assistant => "assistant",
            Self::User => "user",
            Self::Unknown => "unknown",
        }
    }
}

impl From<String> for UserRole {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "donor" => Self::Donor,
            "receiver" | "recipient" => Self::Receiver,
            "admin" => Self::Admin,
            "assistant" => Self::Assistant,
            "user" => Self::User,
            _ => Self::Unknown,
        }
    }
}

impl From<Option<String>> for UserRole {
    fn from(value: Option<String>) -> Self {
        value.map(Self::from).unwrap_or_default()
    }
}

/// Registered donor as returned by the donor directory.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorRecord {
    pub email: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_lenient_blood_group")]
    pub blood_group: Option<BloodGroup>,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub district: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub upazila: String,
    #[serde(default)]
    pub availability_status: AvailabilityStatus,
    #[serde(default)]
    pub status: AccountStatus,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_donation_date: Option<String>,
}

impl DonorRecord {
    pub fn is_eligible(&self) -> bool {
        self.role == UserRole::Donor && self.status == AccountStatus::Active
    }

    /// Parsed `last_donation_date`; malformed values read as absent.
    pub fn last_donation_at(&self) -> Option<DateTime<Utc>> {
        self.last_donation_date.as_deref().and_then(parse_timestamp)
    }
}

/// Accepts RFC 3339, naive `YYYY-MM-DDTHH:MM:SS[.f]` (read as UTC), and plain dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Location and blood-group needs of an in-progress request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCriteria {
    #[serde(default, deserialize_with = "deserialize_lenient_blood_group")]
    pub blood_group: Option<BloodGroup>,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub upazila: String,
}

/// Display summary of a ranked donor, also persisted as `aiRecommendations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredDonor {
    pub name: String,
    pub email: String,
    pub district: String,
    pub upazila: String,
    pub availability_status: AvailabilityStatus,
    pub score: i16,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn blood_group_parse_is_case_and_whitespace_tolerant() {
        assert_eq!(" ab+ ".parse::<BloodGroup>(), Ok(BloodGroup::AbPositive));
        assert_eq!(BloodGroup::parse_lenient("O-"), Some(BloodGroup::ONegative));
        assert_eq!(BloodGroup::parse_lenient(""), None);
        assert_eq!(BloodGroup::parse_lenient("C+"), None);
    }

    #[test]
    fn donor_record_tolerates_unknown_and_missing_fields() {
        let donor: DonorRecord = serde_json::from_str(
            r#"{"email":"x@bb.org","bloodGroup":"Z+","availabilityStatus":"on-leave","role":"recipient"}"#,
        )
        .expect("lenient donor parses");

        assert_eq!(donor.blood_group, None);
        assert_eq!(donor.availability_status, AvailabilityStatus::Unknown);
        assert_eq!(donor.status, AccountStatus::Unknown);
        assert_eq!(donor.role, UserRole::Receiver);
        assert!(!donor.is_eligible());
    }

    #[test]
    fn scored_donor_serializes_with_camel_case_keys() {
        let scored = ScoredDonor {
            name: "Rafi".to_string(),
            email: "rafi@bb.org".to_string(),
            district: "Dhaka".to_string(),
            upazila: "Savar".to_string(),
            availability_status: AvailabilityStatus::MedicalReview,
            score: 9,
        };
        let value = serde_json::to_value(&scored).expect("serializes");
        assert_eq!(value["availabilityStatus"], "medical-review");
        assert_eq!(value["score"], 9);
    }

    #[test]
    fn parse_timestamp_supports_rfc3339_naive_and_plain_dates() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 14, 6, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2025-03-14T12:30:00+06:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-14T06:30:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2025-03-14"),
            Some(Utc.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("last spring"), None);
    }
}
