use crate::cli::ServeArgs;
use crate::demo::demo_donors;
use crate::infra::{load_regions, AppState, InMemoryDonationRequestRepository, SeededDonorDirectory};
use crate::routes::with_platform_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use bloodbridge::config::AppConfig;
use bloodbridge::error::AppError;
use bloodbridge::telemetry;
use bloodbridge::workflows::donors::{DonorImporter, DonorMatcher};
use bloodbridge::workflows::requests::DonationRequestService;
use chrono::Utc;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let donors = match &config.data.donors_path {
        Some(path) => DonorImporter::from_path(path)?,
        None => {
            warn!("APP_DONORS_PATH not set; serving the demo donor roster");
            demo_donors(Utc::now())
        }
    };
    let directory = Arc::new(SeededDonorDirectory::new(donors));
    let regions = Arc::new(load_regions(&config.data)?);
    info!(
        donors = directory.donor_count(),
        districts = regions.districts_sorted().len(),
        suggestion_limit = config.matching.suggestion_limit,
        "donor directory loaded"
    );

    let service = Arc::new(DonationRequestService::new(
        directory,
        Arc::new(InMemoryDonationRequestRepository::default()),
        regions,
        DonorMatcher::with_limit(config.matching.suggestion_limit),
    ));

    let app = with_platform_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "bloodbridge donor matching service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
