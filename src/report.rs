use crate::notice::{Notice, NoticeSink};
use crate::record::{Coordinate, Sighting, SightingCreate};
use crate::traits::SightingsApi;
use log::{debug, info, warn};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    /// Stored by the backend, AI analysis included.
    Created(Sighting),
    /// Failed a local check; nothing was posted.
    Rejected,
    Failed,
}

/// Submits new sighting reports.
pub struct SightingReporter {
    api: Arc<dyn SightingsApi>,
    notices: Arc<dyn NoticeSink>,
}

impl SightingReporter {
    pub fn new(api: Arc<dyn SightingsApi>, notices: Arc<dyn NoticeSink>) -> Self {
        Self { api, notices }
    }

    pub async fn submit(&self, report: &SightingCreate) -> ReportOutcome {
        if let Some(notice) = check_form(report) {
            self.notices.notify(notice);
            return ReportOutcome::Rejected;
        }
        if !self.category_known(&report.category).await {
            self.notices
                .notify(Notice::failure(format!("Unknown category `{}`", report.category)));
            return ReportOutcome::Rejected;
        }

        debug!("Reporting '{}' ({})", report.title, report.category);
        match self.api.create_sighting(report).await {
            Ok(created) => {
                info!("Created sighting {}", created.id);
                self.notices.notify(Notice::success("Sighting reported!"));
                ReportOutcome::Created(created)
            }
            Err(e) => {
                warn!("Reporting sighting failed: {}", e);
                self.notices.notify(Notice::failure("Failed to submit sighting"));
                ReportOutcome::Failed
            }
        }
    }

    /// An unreachable category list leaves the check to the server
    async fn category_known(&self, category: &str) -> bool {
        match self.api.categories().await {
            Ok(known) => known.categories.iter().any(|c| c == category),
            Err(e) => {
                warn!("Could not load categories: {}", e);
                true
            }
        }
    }
}

fn check_form(report: &SightingCreate) -> Option<Notice> {
    if report.title.trim().is_empty() || report.description.trim().is_empty() {
        return Some(Notice::info("Please fill in the title and description"));
    }
    Coordinate::new(report.location.latitude, report.location.longitude)
        .err()
        .map(|e| Notice::failure(format!("Invalid location: {}", e)))
}
