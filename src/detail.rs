use crate::notice::{Notice, NoticeSink};
use crate::record::Sighting;
use crate::token::RequestTokens;
use crate::traits::SightingsApi;
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One sighting's detail view: the record plus its AI analysis.
pub struct SightingDetail {
    item_id: String,
    api: Arc<dyn SightingsApi>,
    notices: Arc<dyn NoticeSink>,
    tokens: RequestTokens,
    sighting: Mutex<Option<Sighting>>,
}

impl SightingDetail {
    pub fn new(
        item_id: impl Into<String>,
        api: Arc<dyn SightingsApi>,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            api,
            notices,
            tokens: RequestTokens::default(),
            sighting: Mutex::new(None),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<Sighting>> {
        self.sighting.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn sighting(&self) -> Option<Sighting> {
        self.slot().clone()
    }

    pub async fn load(&self) -> bool {
        let token = self.tokens.issue();
        let fetched = self.api.get_sighting(&self.item_id).await;

        {
            let mut slot = self.slot();
            if !self.tokens.is_current(token) {
                return false;
            }
            if let Ok(sighting) = &fetched {
                *slot = Some(sighting.clone());
            }
        }

        match fetched {
            Ok(_) => {
                debug!("Loaded sighting {}", self.item_id);
                true
            }
            Err(e) => {
                warn!("Could not load sighting {}: {}", self.item_id, e);
                self.notices.notify(Notice::failure("Failed to load sighting"));
                false
            }
        }
    }

    /// Ask the backend to re-run its analysis, then reload the whole record
    pub async fn reanalyze(&self) -> bool {
        if let Err(e) = self.api.analyze(&self.item_id).await {
            warn!("Re-analysis of {} failed: {}", self.item_id, e);
            if self.tokens.is_mounted() {
                self.notices.notify(Notice::failure("Failed to re-run AI analysis"));
            }
            return false;
        }
        if !self.tokens.is_mounted() {
            return false;
        }

        info!("Analysis of {} accepted by the server", self.item_id);
        let reloaded = self.load().await;
        if reloaded {
            self.notices.notify(Notice::success("AI analysis updated!"));
        } else if self.tokens.is_mounted() {
            self.notices.notify(Notice::info(
                "AI analysis ran, but the updated sighting could not be shown",
            ));
        }
        reloaded
    }

    pub fn teardown(&self) {
        self.tokens.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockApi, RecordingNotices, sample_sighting};
    use crate::notice::NoticeLevel;

    fn detail(api: &Arc<MockApi>, id: &str) -> (SightingDetail, Arc<RecordingNotices>) {
        let notices = Arc::new(RecordingNotices::default());
        (SightingDetail::new(id, api.clone(), notices.clone()), notices)
    }

    #[tokio::test]
    async fn test_load_and_missing() {
        let api = Arc::new(MockApi::with_sighting(sample_sighting("s1")));
        let (found, _) = detail(&api, "s1");
        assert!(found.load().await);
        assert_eq!(found.sighting().unwrap().title, "Sighting s1");

        let (missing, notices) = detail(&api, "nope");
        assert!(!missing.load().await);
        assert!(missing.sighting().is_none());
        assert_eq!(notices.all(), vec![Notice::failure("Failed to load sighting")]);
    }

    #[tokio::test]
    async fn test_reanalyze_refetches_record() {
        let api = Arc::new(MockApi::with_sighting(sample_sighting("s1")));
        let (view, notices) = detail(&api, "s1");
        view.load().await;
        assert!(view.sighting().unwrap().ai_analysis.is_none());

        assert!(view.reanalyze().await);

        let analysis = view.sighting().unwrap().ai_analysis.unwrap();
        assert_eq!(analysis.credibility_score, 72);
        // load, analyze, re-fetch
        assert_eq!(api.call_count(), 3);
        assert_eq!(notices.all(), vec![Notice::success("AI analysis updated!")]);
    }

    #[tokio::test]
    async fn test_failed_reanalysis_keeps_record() {
        let api = Arc::new(MockApi::with_sighting(sample_sighting("s1")));
        api.fail_analyze(true);
        let (view, notices) = detail(&api, "s1");
        view.load().await;

        assert!(!view.reanalyze().await);

        assert_eq!(view.sighting().unwrap().id, "s1");
        assert_eq!(
            notices.all(),
            vec![Notice::failure("Failed to re-run AI analysis")]
        );
    }

    #[tokio::test]
    async fn test_analysis_accepted_but_reload_failed() {
        let api = Arc::new(MockApi::with_sighting(sample_sighting("s1")));
        let (view, notices) = detail(&api, "s1");
        view.load().await;

        api.fail_get(true);
        assert!(!view.reanalyze().await);

        // the record shown is the one from before the analysis
        assert!(view.sighting().unwrap().ai_analysis.is_none());
        let all = notices.all();
        assert_eq!(all[0], Notice::failure("Failed to load sighting"));
        assert_eq!(all[1].level, NoticeLevel::Info);
        assert!(all[1].message.starts_with("AI analysis ran"));
    }
}
