//! Report service orchestration.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::report::{self, ReportContext, ReportFilters, ReportType};
use crate::source::DataSources;

/// Progress events for a background report build.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportProgress {
    Started(ReportType),
    Progress { percent: f32, message: String },
    Completed { report: Box<ReportContext>, timestamp: DateTime<Utc> },
    Error(String),
}

/// Report service: owns the configuration and data sources and allows at
/// most one build in flight.
pub struct ReportService {
    config: AppConfig,
    sources: DataSources,
    generating: AtomicBool,
}

/// Clears the generating flag when a build ends, however it ends.
struct GeneratingGuard<'a>(&'a AtomicBool);

impl Drop for GeneratingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ReportService {
    /// Create a new report service.
    pub fn new(config: AppConfig, sources: DataSources) -> Self {
        Self {
            config,
            sources,
            generating: AtomicBool::new(false),
        }
    }

    /// Whether a build is currently running.
    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::Acquire)
    }

    /// Build a report.
    ///
    /// Fails with [`AppError::ReportInProgress`] while another build is running.
    pub async fn generate(&self, report_type: ReportType, filters: &ReportFilters) -> Result<ReportContext> {
        self.generate_with_progress(report_type, filters, |_, _| {}).await
    }

    /// Build a report with progress callback.
    pub async fn generate_with_progress<F>(
        &self,
        report_type: ReportType,
        filters: &ReportFilters,
        on_progress: F,
    ) -> Result<ReportContext>
    where
        F: FnMut(f32, &str),
    {
        if self
            .generating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Rejected {report_type} report: another build is running");
            return Err(AppError::ReportInProgress);
        }
        let _guard = GeneratingGuard(&self.generating);

        let start = std::time::Instant::now();
        let context =
            report::build_report_with_progress(&self.sources, &self.config.report, report_type, filters, on_progress)
                .await?;

        info!(
            "{report_type} report generated in {:.1}s",
            start.elapsed().as_secs_f64()
        );
        Ok(context)
    }
}

/// Run a report build in background and report progress via channel.
pub async fn run_report_background(
    service: Arc<ReportService>,
    report_type: ReportType,
    filters: ReportFilters,
    tx: mpsc::UnboundedSender<ReportProgress>,
) {
    let _ = tx.send(ReportProgress::Started(report_type));

    let result = service
        .generate_with_progress(report_type, &filters, |progress, message| {
            let _ = tx.send(ReportProgress::Progress {
                percent: progress,
                message: message.to_string(),
            });
        })
        .await;

    match result {
        Ok(report) => {
            let _ = tx.send(ReportProgress::Completed {
                report: Box::new(report),
                timestamp: Utc::now(),
            });
        }
        Err(e) => {
            let _ = tx.send(ReportProgress::Error(e.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::memory::{Dataset, MemorySource};
    use chrono::NaiveDate;

    fn filters() -> ReportFilters {
        ReportFilters {
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            department_id: None,
        }
    }

    fn service() -> ReportService {
        let sources = DataSources::from_single(Arc::new(MemorySource::new(Dataset::default())));
        ReportService::new(AppConfig::default(), sources)
    }

    #[tokio::test]
    async fn test_generate_resets_flag() {
        let service = service();
        let report = service.generate(ReportType::Overview, &filters()).await.unwrap();
        assert_eq!(report.report_type, ReportType::Overview);
        assert!(!service.is_generating());
    }

    #[tokio::test]
    async fn test_rejects_concurrent_build() {
        let service = service();
        service.generating.store(true, Ordering::Release);

        let err = service.generate(ReportType::Leave, &filters()).await.unwrap_err();
        assert!(matches!(err, AppError::ReportInProgress));
    }

    #[tokio::test]
    async fn test_flag_cleared_after_failure() {
        let service = service();
        let reversed = ReportFilters {
            start_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            department_id: None,
        };

        assert!(service.generate(ReportType::Leave, &reversed).await.is_err());
        assert!(!service.is_generating());
    }

    #[tokio::test]
    async fn test_background_progress_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        run_report_background(Arc::new(service()), ReportType::Schedule, filters(), tx).await;

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }

        assert_eq!(events.first(), Some(&ReportProgress::Started(ReportType::Schedule)));
        assert!(events.iter().any(|e| matches!(e, ReportProgress::Progress { .. })));
        assert!(matches!(events.last(), Some(ReportProgress::Completed { .. })));
    }
}
