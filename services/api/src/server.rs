use crate::cli::ServeArgs;
use crate::infra::{build_registrar, seed_from_snapshot, AppState};
use crate::routes::with_registration_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use course_registrar::config::AppConfig;
use course_registrar::error::AppError;
use course_registrar::telemetry;
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
    if let Some(path) = args.snapshot.take() {
        config.registration.snapshot_path = Some(path);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let registrar = build_registrar(&config.registration);
    if let Some(path) = &config.registration.snapshot_path {
        let summary = seed_from_snapshot(&registrar, path)?;
        info!(
            path = %path.display(),
            courses = summary.courses,
            students = summary.students,
            pending_requests = summary.pending_requests,
            "registrar seeded from snapshot"
        );
    }

    let app = with_registration_routes(registrar)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "course registrar ready");

    axum::serve(listener, app).await?;
    Ok(())
}
