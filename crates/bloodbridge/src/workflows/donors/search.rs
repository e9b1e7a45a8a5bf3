use serde::{Deserialize, Deserializer, Serialize};

use super::domain::{AvailabilityStatus, BloodGroup, DonorRecord, UserRole};

/// Optional filters used by the public donor search. Absent fields match everything.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorSearchQuery {
    #[serde(default, deserialize_with = "deserialize_blood_group_filter")]
    pub blood_group: Option<BloodGroup>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub upazila: Option<String>,
    #[serde(default)]
    pub availability: Option<AvailabilityStatus>,
}

impl DonorSearchQuery {
    pub fn matches(&self, donor: &DonorRecord) -> bool {
        if donor.role != UserRole::Donor {
            return false;
        }

        if let Some(group) = self.blood_group {
            if donor.blood_group != Some(group) {
                return false;
            }
        }

        if !filter_matches(self.district.as_deref(), &donor.district) {
            return false;
        }

        if !filter_matches(self.upazila.as_deref(), &donor.upazila) {
            return false;
        }

        self.availability
            .map(|wanted| donor.availability_status == wanted)
            .unwrap_or(true)
    }

    /// Donors passing every filter, in directory order.
    pub fn apply<'a>(&self, donors: &'a [DonorRecord]) -> Vec<&'a DonorRecord> {
        donors.iter().filter(|donor| self.matches(donor)).collect()
    }
}

/// Blank means "any group"; anything else must name a real group. An unencoded
/// `+` in a query string decodes to a space, so `A+` arrives as `A ` and is rejected.
fn deserialize_blood_group_filter<'de, D>(deserializer: D) -> Result<Option<BloodGroup>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some).map_err(serde::de::Error::custom)
}

fn filter_matches(wanted: Option<&str>, actual: &str) -> bool {
    match wanted.map(str::trim) {
        Some(value) if !value.is_empty() => value == actual,
        _ => true,
    }
}
