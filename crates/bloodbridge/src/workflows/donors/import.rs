use std::io::Read;
use std::path::Path;

use tracing::debug;

use super::domain::DonorRecord;

#[derive(Debug, thiserror::Error)]
pub enum DonorImportError {
    #[error("failed to read donor export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid donor JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid donor CSV data: {0}")]
    Csv(#[from] csv::Error),
}

/// Loads donor directory snapshots exported from the registration backend.
pub struct DonorImporter;

impl DonorImporter {
    /// `.csv` files are read as CSV; anything else as a JSON array.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<DonorRecord>, DonorImportError> {
        let path = path.as_ref();
        let is_csv = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(|extension| extension.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);

        let file = std::fs::File::open(path)?;
        let donors = if is_csv {
            Self::from_csv_reader(file)?
        } else {
            Self::from_json_reader(file)?
        };

        debug!(path = %path.display(), count = donors.len(), "loaded donor snapshot");
        Ok(donors)
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Vec<DonorRecord>, DonorImportError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Headers use the JSON field names (`bloodGroup`, `lastDonationDate`, ...).
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Vec<DonorRecord>, DonorImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        csv_reader
            .deserialize::<DonorRecord>()
            .map(|row| row.map_err(DonorImportError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::donors::domain::{AccountStatus, AvailabilityStatus, BloodGroup, UserRole};
    use std::io::Cursor;

    #[test]
    fn csv_rows_map_to_donor_records() {
        let csv = "email,name,bloodGroup,district,upazila,availabilityStatus,status,role,lastDonationDate\n\
nadia@bb.org,Nadia,A+,Dhaka,Savar,available,active,donor,2025-01-10\n\
imran@bb.org,Imran,,Khulna,Dumuria,medical-review,blocked,donor,\n";

        let donors = DonorImporter::from_csv_reader(Cursor::new(csv)).expect("csv parses");

        assert_eq!(donors.len(), 2);
        assert_eq!(donors[0].blood_group, Some(BloodGroup::APositive));
        assert_eq!(donors[0].last_donation_date.as_deref(), Some("2025-01-10"));
        assert!(donors[0].is_eligible());
        assert_eq!(donors[1].blood_group, None);
        assert_eq!(
            donors[1].availability_status,
            AvailabilityStatus::MedicalReview
        );
        assert_eq!(donors[1].status, AccountStatus::Blocked);
        assert_eq!(donors[1].last_donation_date, None);
    }

    #[test]
    fn json_array_defaults_missing_fields() {
        let json = r#"[{"email":"only@bb.org","role":"donor"}]"#;
        let donors = DonorImporter::from_json_reader(Cursor::new(json)).expect("json parses");
        assert_eq!(donors[0].role, UserRole::Donor);
        assert_eq!(donors[0].status, AccountStatus::Unknown);
        assert!(donors[0].name.is_empty());
    }

    #[test]
    fn json_null_fields_read_as_unset() {
        let json = r#"[{
            "email": "rafi@bb.org",
            "name": null,
            "bloodGroup": null,
            "district": null,
            "upazila": "Savar",
            "availabilityStatus": null,
            "status": "active",
            "role": "donor",
            "lastDonationDate": null
        }]"#;

        let donors = DonorImporter::from_json_reader(Cursor::new(json)).expect("json parses");

        assert_eq!(donors.len(), 1);
        let donor = &donors[0];
        assert!(donor.name.is_empty());
        assert!(donor.district.is_empty());
        assert_eq!(donor.upazila, "Savar");
        assert_eq!(donor.blood_group, None);
        assert_eq!(donor.availability_status, AvailabilityStatus::Unknown);
        assert_eq!(donor.last_donation_date, None);
        assert!(donor.is_eligible());
    }

    #[test]
    fn json_null_role_and_status_make_donor_ineligible() {
        let json = r#"[{"email":"x@bb.org","status":null,"role":null}]"#;

        let donors = DonorImporter::from_json_reader(Cursor::new(json)).expect("json parses");

        assert_eq!(donors[0].status, AccountStatus::Unknown);
        assert_eq!(donors[0].role, UserRole::Unknown);
        assert!(!donors[0].is_eligible());
    }

    #[test]
    fn json_without_email_is_rejected() {
        let error = DonorImporter::from_json_reader(Cursor::new(r#"[{"name":"x"}]"#))
            .expect_err("email is required");
        assert!(matches!(error, DonorImportError::Json(_)));
    }

    #[test]
    fn from_path_propagates_io_errors() {
        let error = DonorImporter::from_path("./no-such-donors.json").expect_err("missing file");
        assert!(matches!(error, DonorImportError::Io(_)));
    }
}
