use crate::cli::ServeArgs;
use crate::infra::{
    load_catalog, AppState, InMemoryApplicationRepository, InMemoryDocumentRepository,
    InMemoryNoticePublisher,
};
use crate::routes::with_application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use scholarship_portal::config::AppConfig;
use scholarship_portal::error::AppError;
use scholarship_portal::telemetry;
use scholarship_portal::workflows::applications::ScholarshipApplicationService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(path) = args.document_catalog.take() {
        config.portal.document_catalog = Some(path);
    }

    telemetry::init(&config.telemetry)?;

    let catalog = load_catalog(config.portal.document_catalog.as_deref())?;
    let required = catalog.required().count();

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let application_service = Arc::new(ScholarshipApplicationService::new(
        Arc::new(InMemoryApplicationRepository::default()),
        Arc::new(InMemoryDocumentRepository::new(catalog)),
        Arc::new(InMemoryNoticePublisher::default()),
        &config.portal,
    ));

    let app = with_application_routes(application_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        required_documents = required,
        max_upload_bytes = config.portal.max_upload_bytes,
        "scholarship portal ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
