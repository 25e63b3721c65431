use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use url::Url;

// Forgiving decoder: padding optional, stray trailing bits ignored.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

// `scheme://authority` of a link, used to resolve site-relative paths.
//
// Unparseable input falls back to the first three `/`-separated pieces,
// which is what a plain string split of `https://host/...` gives.
pub fn site_root(link: &str) -> String {
    if let Ok(url) = Url::parse(link) {
        if url.has_host() {
            let origin = url.origin().ascii_serialization();
            if origin != "null" {
                return origin;
            }
        }
    }
    link.split('/').take(3).collect::<Vec<_>>().join("/")
}

// Text between the first and second occurrence of `marker`, or None when the
// marker is absent.
pub fn after_marker<'a>(value: &'a str, marker: &str) -> Option<&'a str> {
    value.split(marker).nth(1)
}

// Decode base64 into a "binary" string: one char per byte (Latin-1).
//
// Accepts both the standard and URL-safe alphabets, skips characters outside
// them, stops at the first `=`. Returns an empty string when nothing decodes.
pub fn decode_binary(value: &str) -> String {
    let mut cleaned: String = value
        .chars()
        .take_while(|c| *c != '=')
        .filter_map(|c| match c {
            '-' => Some('+'),
            '_' => Some('/'),
            c if c.is_ascii_alphanumeric() || c == '+' || c == '/' => Some(c),
            _ => None,
        })
        .collect();

    // A lone trailing sextet carries no full byte.
    if cleaned.len() % 4 == 1 {
        cleaned.pop();
    }

    match LENIENT.decode(cleaned.as_bytes()) {
        Ok(bytes) => bytes.into_iter().map(char::from).collect(),
        Err(_) => String::new(),
    }
}

// Last `/`-separated segment of a link.
pub fn last_segment(link: &str) -> &str {
    link.rsplit('/').next().unwrap_or(link)
}

// Link with its last two `/`-separated segments removed.
pub fn strip_last_segments(link: &str, count: usize) -> String {
    let parts: Vec<&str> = link.split('/').collect();
    let keep = parts.len().saturating_sub(count);
    parts[..keep].join("/")
}
