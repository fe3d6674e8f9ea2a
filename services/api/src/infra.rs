use course_registrar::config::RegistrationConfig;
use course_registrar::error::AppError;
use course_registrar::registration::{
    InMemoryCourseCatalog, InMemoryUserDirectory, RegistrarSnapshot, RegistrationService,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type Registrar = RegistrationService<InMemoryCourseCatalog, InMemoryUserDirectory>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Record counts reported for a loaded snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct SnapshotSummary {
    pub(crate) courses: usize,
    pub(crate) students: usize,
    pub(crate) advisors: usize,
    pub(crate) administrators: usize,
    pub(crate) requests: usize,
    pub(crate) pending_requests: usize,
}

impl SnapshotSummary {
    pub(crate) fn from_snapshot(snapshot: &RegistrarSnapshot) -> Self {
        Self {
            courses: snapshot.courses.len(),
            students: snapshot.students.len(),
            advisors: snapshot.advisors.len(),
            administrators: snapshot.administrators.len(),
            requests: snapshot.requests.len(),
            pending_requests: snapshot
                .requests
                .iter()
                .filter(|request| request.is_pending())
                .count(),
        }
    }
}

pub(crate) fn build_registrar(config: &RegistrationConfig) -> Arc<Registrar> {
    Arc::new(RegistrationService::new(
        Arc::new(InMemoryCourseCatalog::default()),
        Arc::new(InMemoryUserDirectory::default()),
        config.request_id_format(),
    ))
}

pub(crate) fn seed_from_snapshot(
    registrar: &Registrar,
    path: &Path,
) -> Result<SnapshotSummary, AppError> {
    let snapshot = RegistrarSnapshot::from_path(path)?;
    let summary = SnapshotSummary::from_snapshot(&snapshot);
    registrar.restore(snapshot)?;
    Ok(summary)
}
