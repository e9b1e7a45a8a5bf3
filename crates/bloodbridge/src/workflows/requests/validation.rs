use crate::regions::{District, RegionDirectory};
use crate::workflows::donors::BloodGroup;

use super::domain::DonationRequestForm;

/// Validation errors raised before a request is stored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("blood group is required")]
    MissingBloodGroup,
    #[error("unknown district id '{0}'")]
    UnknownDistrict(String),
    #[error("upazila '{upazila}' is not part of district {district}")]
    UpazilaOutsideDistrict { district: String, upazila: String },
    #[error("units needed must be between 1 and {max} (found {found})")]
    UnitsOutOfRange { max: u8, found: u8 },
}

pub(crate) const MAX_UNITS_PER_REQUEST: u8 = 10;

/// Form after validation, with the district resolved against the region directory.
#[derive(Debug, Clone)]
pub(crate) struct ValidatedForm<'r> {
    pub form: DonationRequestForm,
    pub district: &'r District,
    pub blood_group: BloodGroup,
}

pub(crate) fn validate_form<'r>(
    mut form: DonationRequestForm,
    regions: &'r RegionDirectory,
) -> Result<ValidatedForm<'r>, RequestValidationError> {
    let required = [
        ("requesterName", &form.requester_name),
        ("recipientName", &form.recipient_name),
        ("recipientDistrict", &form.recipient_district),
        ("recipientUpazila", &form.recipient_upazila),
        ("hospitalName", &form.hospital_name),
        ("fullAddress", &form.full_address),
        ("requestMessage", &form.request_message),
    ];
    if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(RequestValidationError::MissingField(*field));
    }

    let blood_group = form
        .blood_group
        .ok_or(RequestValidationError::MissingBloodGroup)?;

    let district = regions
        .district(form.recipient_district.trim())
        .ok_or_else(|| RequestValidationError::UnknownDistrict(form.recipient_district.clone()))?;

    if !regions.has_upazila(&district.id, &form.recipient_upazila) {
        return Err(RequestValidationError::UpazilaOutsideDistrict {
            district: district.name.clone(),
            upazila: form.recipient_upazila.clone(),
        });
    }

    if form.units_needed == 0 {
        form.units_needed = 1;
    }
    if form.units_needed > MAX_UNITS_PER_REQUEST {
        return Err(RequestValidationError::UnitsOutOfRange {
            max: MAX_UNITS_PER_REQUEST,
            found: form.units_needed,
        });
    }

    Ok(ValidatedForm {
        form,
        district,
        blood_group,
    })
}
