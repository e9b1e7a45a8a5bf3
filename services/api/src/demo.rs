use crate::infra::{
    parse_blood_group, parse_instant, InMemoryDonationRequestRepository, SeededDonorDirectory,
};
use bloodbridge::error::AppError;
use bloodbridge::fetch::DonorPool;
use bloodbridge::regions::RegionDirectory;
use bloodbridge::session::{Session, SessionUser};
use bloodbridge::workflows::donors::{
    AccountStatus, AvailabilityStatus, BloodGroup, DonorImporter, DonorMatcher, DonorRecord,
    RequestCriteria, ScoredDonor, UserRole, DEFAULT_SUGGESTION_LIMIT,
};
use bloodbridge::workflows::requests::{
    DonationRequestForm, DonationRequestService, UrgencyLevel,
};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct SuggestArgs {
    /// Donor directory export (.json array or .csv with JSON field names)
    #[arg(long)]
    pub(crate) donors: PathBuf,
    /// Requested blood group, e.g. O+ or AB-
    #[arg(long, value_parser = parse_blood_group)]
    pub(crate) blood_group: BloodGroup,
    /// District display name of the recipient
    #[arg(long, default_value = "")]
    pub(crate) district: String,
    /// Upazila name of the recipient
    #[arg(long, default_value = "")]
    pub(crate) upazila: String,
    /// Reference instant for recency scoring (defaults to now)
    #[arg(long, value_parser = parse_instant)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Number of suggestions to print
    #[arg(long, default_value_t = DEFAULT_SUGGESTION_LIMIT)]
    pub(crate) limit: usize,
    /// Print the per-factor score breakdown for each suggestion
    #[arg(long)]
    pub(crate) explain: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reference instant for the demo (defaults to now)
    #[arg(long, value_parser = parse_instant)]
    pub(crate) now: Option<DateTime<Utc>>,
}

pub(crate) fn run_suggest(args: SuggestArgs) -> Result<(), AppError> {
    let SuggestArgs {
        donors,
        blood_group,
        district,
        upazila,
        now,
        limit,
        explain,
    } = args;

    let records = DonorImporter::from_path(&donors)?;
    let criteria = RequestCriteria {
        blood_group: Some(blood_group),
        district,
        upazila,
    };
    let now = now.unwrap_or_else(Utc::now);
    let matcher = DonorMatcher::with_limit(limit.max(1));
    let ranked = matcher.rank(&records, &criteria, now);

    println!(
        "Donor suggestions for {} near {} / {} ({} records scanned)",
        blood_group,
        display_or_any(&criteria.district),
        display_or_any(&criteria.upazila),
        records.len()
    );
    render_suggestions(&ranked);

    if explain {
        for suggestion in &ranked {
            let Some(record) = records.iter().find(|donor| donor.email == suggestion.email) else {
                continue;
            };
            let breakdown = matcher.breakdown(record, &criteria, now);
            println!("\n{} = {}", breakdown.email, breakdown.total_score);
            for component in &breakdown.components {
                println!("  {:+} {}", component.score, component.notes);
            }
        }
    }

    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let now = args.now.unwrap_or_else(Utc::now);
    let directory = Arc::new(SeededDonorDirectory::new(demo_donors(now)));
    let regions = Arc::new(RegionDirectory::standard());
    let matcher = DonorMatcher::default();

    println!("BloodBridge donor matching demo");
    println!(
        "- {} registered donors across {} districts",
        directory.donor_count(),
        regions.districts_sorted().len()
    );

    let form = demo_form();
    let pool = DonorPool::load(directory.clone(), matcher).await;
    let service = DonationRequestService::new(
        directory,
        Arc::new(InMemoryDonationRequestRepository::default()),
        regions,
        matcher,
    );

    let criteria = service.criteria_for(&form);
    println!(
        "\nLive suggestions while drafting ({} in {} / {})",
        form.blood_group.map(BloodGroup::label).unwrap_or("?"),
        criteria.district,
        criteria.upazila
    );
    render_suggestions(&pool.suggestions(&criteria, now));

    let requester = Session::signed_in(
        SessionUser {
            email: "sadia.rahman@bloodbridge.org".to_string(),
            display_name: "Sadia Rahman".to_string(),
            status: AccountStatus::Active,
        },
        UserRole::Receiver,
    );
    let request = service.submit(&requester, form, now)?;
    println!(
        "\nSubmitted {} ({}, {} unit(s), status {})",
        request.id.0,
        request.urgency_level.label(),
        request.units_needed,
        request.donation_status.label()
    );
    println!(
        "- {} recommendations stored with the request",
        request.ai_recommendations.len()
    );

    if let Some(top) = request.ai_recommendations.first() {
        let donor = Session::signed_in(
            SessionUser {
                email: top.email.clone(),
                display_name: top.name.clone(),
                status: AccountStatus::Active,
            },
            UserRole::Donor,
        );
        let accepted = service.accept(&request.id, &donor, now)?;
        println!(
            "- accepted by {} <{}>; status {}",
            top.name,
            top.email,
            accepted.donation_status.label()
        );
    }

    Ok(())
}

fn render_suggestions(suggestions: &[ScoredDonor]) {
    if suggestions.is_empty() {
        println!("  (no matching donors)");
        return;
    }

    for (rank, donor) in suggestions.iter().enumerate() {
        println!(
            "  {}. {} <{}> | {} / {} | {} | score {}",
            rank + 1,
            donor.name,
            donor.email,
            donor.district,
            donor.upazila,
            donor.availability_status.label(),
            donor.score
        );
    }
}

fn display_or_any(value: &str) -> &str {
    if value.trim().is_empty() {
        "any"
    } else {
        value
    }
}

fn demo_form() -> DonationRequestForm {
    DonationRequestForm {
        requester_name: String::new(),
        requester_email: String::new(),
        recipient_name: "Abdul Karim".to_string(),
        recipient_district: "1".to_string(),
        recipient_upazila: "Savar".to_string(),
        hospital_name: "Enam Medical College Hospital".to_string(),
        full_address: "Thana Road, Savar, Dhaka".to_string(),
        blood_group: Some(BloodGroup::OPositive),
        donation_date: Utc::now().date_naive() + Duration::days(2),
        donation_time: NaiveTime::from_hms_opt(10, 30, 0).unwrap_or_default(),
        request_message: "Scheduled surgery, two bags needed".to_string(),
        urgency_level: UrgencyLevel::Urgent,
        units_needed: 2,
        patient_condition: Some("Post-accident surgery".to_string()),
        hospital_phone: None,
        needs_ambulance: false,
    }
}

/// Seed roster used by `demo` and by `serve` when no donor export is configured.
pub(crate) fn demo_donors(now: DateTime<Utc>) -> Vec<DonorRecord> {
    let days_ago = |days: i64| Some((now - Duration::days(days)).to_rfc3339());
    let donor = |name: &str,
                 email: &str,
                 group: BloodGroup,
                 district: &str,
                 upazila: &str,
                 availability: AvailabilityStatus| DonorRecord {
        email: email.to_string(),
        name: name.to_string(),
        blood_group: Some(group),
        district: district.to_string(),
        upazila: upazila.to_string(),
        availability_status: availability,
        status: AccountStatus::Active,
        role: UserRole::Donor,
        last_donation_date: None,
    };

    let mut nusrat = donor(
        "Nusrat Jahan",
        "nusrat@bloodbridge.org",
        BloodGroup::OPositive,
        "Dhaka",
        "Savar",
        AvailabilityStatus::Available,
    );
    nusrat.last_donation_date = days_ago(150);

    let mut kamal = donor(
        "Kamal Hossain",
        "kamal@bloodbridge.org",
        BloodGroup::OPositive,
        "Dhaka",
        "Savar",
        AvailabilityStatus::Available,
    );
    kamal.last_donation_date = days_ago(30);

    let mut jahid = donor(
        "Jahid Alam",
        "jahid@bloodbridge.org",
        BloodGroup::OPositive,
        "Dhaka",
        "Savar",
        AvailabilityStatus::Available,
    );
    jahid.status = AccountStatus::Blocked;

    let mut moushumi = donor(
        "Moushumi Akter",
        "moushumi@bloodbridge.org",
        BloodGroup::BNegative,
        "Sylhet",
        "Golapganj",
        AvailabilityStatus::Available,
    );
    moushumi.last_donation_date = days_ago(200);

    let mut admin = donor(
        "Platform Admin",
        "admin@bloodbridge.org",
        BloodGroup::OPositive,
        "Dhaka",
        "Savar",
        AvailabilityStatus::Available,
    );
    admin.role = UserRole::Admin;

    vec![
        kamal,
        donor(
            "Sabbir Ahmed",
            "sabbir@bloodbridge.org",
            BloodGroup::OPositive,
            "Dhaka",
            "Savar",
            AvailabilityStatus::Resting,
        ),
        nusrat,
        donor(
            "Rumana Parvin",
            "rumana@bloodbridge.org",
            BloodGroup::OPositive,
            "Dhaka",
            "Dhamrai",
            AvailabilityStatus::Available,
        ),
        donor(
            "Lima Chowdhury",
            "lima@bloodbridge.org",
            BloodGroup::APositive,
            "Dhaka",
            "Savar",
            AvailabilityStatus::Available,
        ),
        jahid,
        moushumi,
        donor(
            "Farid Uddin",
            "farid@bloodbridge.org",
            BloodGroup::AbPositive,
            "Chattogram",
            "Patiya",
            AvailabilityStatus::MedicalReview,
        ),
        admin,
    ]
}
