//! Resolves hubcloud share pages into direct, playable stream links.
//!
//! The pipeline fetches the landing page, follows the redirect it hides,
//! scrapes the download buttons from the second page and classifies each
//! button by hosting provider. See [`extractor::Extractor`].

pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod navigator;
pub mod utils;

pub use classifier::{Classifier, LinkRule, LinkType, Server, StreamLink};
pub use config::Config;
pub use error::{ApiError, ExtractError, FetchError};
pub use extractor::Extractor;
pub use fetcher::{FetchTimeouts, Fetcher};
