// src/extractor.rs

use futures::stream::{self, StreamExt, TryStreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::classifier::{Classifier, RuleContext, StreamLink};
use crate::error::ExtractError;
use crate::fetcher::Fetcher;
use crate::navigator::{candidate_links, locate_redirect};

/// Default number of candidates classified at once.
pub const DEFAULT_PROBE_CONCURRENCY: usize = 4;

/// Resolves a hubcloud share page into playable stream links.
pub struct Extractor {
    fetcher: Fetcher,
    classifier: Classifier,
    probe_concurrency: usize,
}

impl Extractor {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            classifier: Classifier::default(),
            probe_concurrency: DEFAULT_PROBE_CONCURRENCY,
        }
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_probe_concurrency(mut self, probe_concurrency: usize) -> Self {
        self.probe_concurrency = probe_concurrency.max(1);
        self
    }

    /// Best-effort extraction. Any failure, including cancellation, yields
    /// an empty list.
    pub async fn extract(&self, link: &str, cancel: &CancellationToken) -> Vec<StreamLink> {
        match self.try_extract(link, cancel).await {
            Ok(links) if cancel.is_cancelled() => {
                debug!(link, found = links.len(), "extraction cancelled after classification");
                Vec::new()
            }
            Ok(links) => {
                info!(link, found = links.len(), "extraction finished");
                links
            }
            Err(ExtractError::Cancelled) => {
                debug!(link, "extraction cancelled");
                Vec::new()
            }
            Err(error) => {
                warn!(link, error = %error, "hubcloud extraction failed");
                Vec::new()
            }
        }
    }

    /// The two-stage pipeline with errors surfaced.
    pub async fn try_extract(
        &self,
        link: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<StreamLink>, ExtractError> {
        // Stage 1: landing page -> next hop
        let landing = self
            .fetcher
            .get(link, cancel)
            .await
            .map_err(ExtractError::stage(1))?;
        let target = locate_redirect(&landing.body, link);
        debug!(link, next = %target, "stage 1 resolved");

        // Stage 2: download page -> candidate buttons
        let page = self
            .fetcher
            .get(&target, cancel)
            .await
            .map_err(ExtractError::stage(2))?;
        let candidates = candidate_links(&page.body);
        debug!(page = %target, candidates = candidates.len(), "stage 2 scraped");

        let ctx = RuleContext {
            fetcher: &self.fetcher,
            cancel,
        };

        let per_candidate: Vec<Vec<StreamLink>> = stream::iter(candidates)
            .map(|candidate| {
                let ctx = &ctx;
                async move { self.classifier.classify(&candidate, ctx).await }
            })
            .buffered(self.probe_concurrency)
            .try_collect()
            .await
            .map_err(ExtractError::stage(2))?;

        Ok(per_candidate.into_iter().flatten().collect())
    }
}
