//! Provider classification for stage-2 download buttons.
//!
//! Each provider is a [`LinkRule`]. Rules run in table order against a
//! working href; a rule may rewrite that href before emitting (Pixeldrain
//! does), and later rules see the rewritten value. Rules are not exclusive:
//! one candidate may produce several links.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::FetchError;
use crate::fetcher::Fetcher;
use crate::utils::{after_marker, last_segment, strip_last_segments};

/// Provider label carried on every [`StreamLink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Server {
    #[serde(rename = "Cf Worker")]
    CfWorker,
    Pixeldrain,
    #[serde(rename = "hubcloud")]
    Hubcloud,
    CfStorage,
    FastDl,
    HubCdn,
}

/// Media type reported for a link. No sniffing happens; it is always mkv.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LinkType {
    #[default]
    #[serde(rename = "mkv")]
    Mkv,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamLink {
    pub server: Server,
    pub link: String,
    #[serde(rename = "type")]
    pub kind: LinkType,
}

impl StreamLink {
    pub fn new(server: Server, link: impl Into<String>) -> Self {
        Self {
            server,
            link: link.into(),
            kind: LinkType::Mkv,
        }
    }
}

/// What a rule has access to while resolving.
pub struct RuleContext<'a> {
    pub fetcher: &'a Fetcher,
    pub cancel: &'a CancellationToken,
}

#[async_trait]
pub trait LinkRule: Send + Sync {
    fn server(&self) -> Server;

    fn matches(&self, href: &str) -> bool;

    /// Rewrite the working href before emitting. Identity by default.
    fn normalize(&self, href: &str) -> String {
        href.to_string()
    }

    /// Final link to emit, or `None` to drop the candidate for this rule.
    ///
    /// Only cancellation should be returned as an error; other failures are
    /// the rule's to absorb.
    async fn resolve(&self, href: &str, _ctx: &RuleContext<'_>) -> Result<Option<String>, FetchError> {
        Ok(Some(href.to_string()))
    }
}

/// Direct Cloudflare worker link.
pub struct CfWorkerRule;

impl LinkRule for CfWorkerRule {
    fn server(&self) -> Server {
        Server::CfWorker
    }

    // `/?id=` links are re-hosted and belong to the hubcloud rule.
    fn matches(&self, href: &str) -> bool {
        href.contains(".dev") && !href.contains("/?id=")
    }
}

pub struct PixeldrainRule;

impl LinkRule for PixeldrainRule {
    fn server(&self) -> Server {
        Server::Pixeldrain
    }

    fn matches(&self, href: &str) -> bool {
        href.contains("pixeld")
    }

    // `https://pixeldrain.net/u/<id>` -> `https://pixeldrain.net/api/file/<id>?download`
    fn normalize(&self, href: &str) -> String {
        if href.contains("api") {
            return href.to_string();
        }
        let token = last_segment(href);
        let base = strip_last_segments(href, 2);
        format!("{base}/api/file/{token}?download")
    }
}

/// Re-hosted link whose real target sits behind a redirect.
pub struct HubcloudRule;

#[async_trait]
impl LinkRule for HubcloudRule {
    fn server(&self) -> Server {
        Server::Hubcloud
    }

    fn matches(&self, href: &str) -> bool {
        href.contains("hubcloud") || href.contains("/?id=")
    }

    async fn resolve(&self, href: &str, ctx: &RuleContext<'_>) -> Result<Option<String>, FetchError> {
        match ctx.fetcher.probe(href, ctx.cancel).await {
            Ok(response) => {
                let link = match response.location() {
                    Some(location) => after_marker(location, "link=").unwrap_or(location),
                    None => href,
                };
                Ok(Some(link.to_string()))
            }
            Err(FetchError::Cancelled) => Err(FetchError::Cancelled),
            Err(error) => {
                debug!(href, error = %error, "hubcloud probe failed; dropping candidate");
                Ok(None)
            }
        }
    }
}

/// Rule that emits the href unchanged when it contains `needle`.
pub struct SubstringRule {
    pub needle: &'static str,
    pub server: Server,
}

impl LinkRule for SubstringRule {
    fn server(&self) -> Server {
        self.server
    }

    fn matches(&self, href: &str) -> bool {
        href.contains(self.needle)
    }
}

/// Ordered rule table.
pub struct Classifier {
    rules: Vec<Box<dyn LinkRule>>,
}

impl Default for Classifier {
    fn default() -> Self {
        let mut classifier = Self::empty();
        classifier.register(Box::new(CfWorkerRule));
        classifier.register(Box::new(PixeldrainRule));
        classifier.register(Box::new(HubcloudRule));
        classifier.register(Box::new(SubstringRule {
            needle: "cloudflarestorage",
            server: Server::CfStorage,
        }));
        classifier.register(Box::new(SubstringRule {
            needle: "fastdl",
            server: Server::FastDl,
        }));
        classifier.register(Box::new(SubstringRule {
            needle: "hubcdn",
            server: Server::HubCdn,
        }));
        classifier
    }
}

impl Classifier {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule; it runs after every rule already registered.
    pub fn register(&mut self, rule: Box<dyn LinkRule>) {
        self.rules.push(rule);
    }

    /// Run every rule over one candidate href.
    pub async fn classify(&self, candidate: &str, ctx: &RuleContext<'_>) -> Result<Vec<StreamLink>, FetchError> {
        let mut links = Vec::new();
        if candidate.is_empty() {
            return Ok(links);
        }

        let mut href = candidate.to_string();
        for rule in &self.rules {
            if !rule.matches(&href) {
                continue;
            }
            href = rule.normalize(&href);
            if let Some(link) = rule.resolve(&href, ctx).await? {
                links.push(StreamLink::new(rule.server(), link));
            }
        }
        Ok(links)
    }
}
