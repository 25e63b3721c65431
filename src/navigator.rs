//! Markup navigation for the two pages of a hubcloud share.
//!
//! Stage 1 hides the next hop either in an inline `var url = '...';` script
//! (sometimes wrapping the real target base64-encoded in an `r=` parameter)
//! or behind a download icon. Stage 2 lists the provider links as styled
//! buttons.
//!
//! Nothing here holds a parsed [`Html`] beyond a single call, so callers can
//! keep their futures `Send`.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::utils::{after_marker, decode_binary, site_root};

static SCRIPT_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"var\s+url\s*=\s*'([^']+)';").expect("static redirect pattern")
});

static DOWNLOAD_ICON: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".fa-file-download.fa-lg").expect("static icon selector")
});

static DOWNLOAD_BUTTONS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".btn-success.btn-lg.h6, .btn-danger, .btn-secondary")
        .expect("static button selector")
});

/// One way of locating the stage-2 URL inside the stage-1 page.
pub type RedirectLocator = fn(html: &str) -> Option<String>;

/// Locators in priority order; the first non-empty answer wins.
pub const REDIRECT_LOCATORS: [(&str, RedirectLocator); 3] = [
    ("script-r-param", script_encoded_target),
    ("script-var", script_target),
    ("download-icon", icon_anchor_href),
];

/// Raw value of the inline `var url = '...';` assignment.
pub fn script_target(html: &str) -> Option<String> {
    SCRIPT_URL
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|value| !value.is_empty())
}

/// The script value's `r=` payload, base64-decoded.
pub fn script_encoded_target(html: &str) -> Option<String> {
    let value = script_target(html)?;
    let payload = after_marker(&value, "r=")?;
    let decoded = decode_binary(payload);
    (!decoded.is_empty()).then_some(decoded)
}

/// `href` of the element wrapping the first download icon.
pub fn icon_anchor_href(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let icon = document.select(&DOWNLOAD_ICON).next()?;
    let parent = icon.parent().and_then(ElementRef::wrap)?;
    parent
        .value()
        .attr("href")
        .filter(|href| !href.is_empty())
        .map(str::to_string)
}

/// Work out where stage 2 lives.
///
/// Falls back to `source_url` itself when no locator matches, and resolves a
/// leading `/` against the site root of `source_url`.
pub fn locate_redirect(html: &str, source_url: &str) -> String {
    let found = REDIRECT_LOCATORS.iter().find_map(|(name, locate)| {
        locate(html).inspect(|found| debug!(locator = name, redirect = %found, "redirect located"))
    });

    let target = found.unwrap_or_else(|| {
        debug!(source_url, "no redirect found; reusing source url");
        source_url.to_string()
    });

    if target.starts_with('/') {
        format!("{}{}", site_root(source_url), target)
    } else {
        target
    }
}

/// `href` of every download button on the stage-2 page, in document order.
/// Buttons without an `href` give an empty string.
pub fn candidate_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&DOWNLOAD_BUTTONS)
        .map(|el| el.value().attr("href").unwrap_or_default().to_string())
        .collect()
}
