#![allow(dead_code)]

use std::time::Duration;

use hubcloud_extractor::{Extractor, FetchTimeouts, Fetcher};

pub fn extractor() -> Extractor {
    let fetcher = Fetcher::new(FetchTimeouts {
        connect: Duration::from_secs(2),
        request: Duration::from_secs(10),
    })
    .expect("fetcher");
    Extractor::new(fetcher)
}

pub fn landing_with_script(target: &str) -> String {
    format!(
        "<html><head><script>\n  var url = '{target}';\n  window.location = url;\n</script></head><body></body></html>"
    )
}

pub fn landing_with_icon(href: &str) -> String {
    format!(
        r#"<html><body><div class="card"><a class="btn btn-primary" href="{href}"><i class="fas fa-file-download fa-lg"></i> Generate</a></div></body></html>"#
    )
}

/// Stage-2 page with one button per href, alternating the recognised styles.
pub fn download_page(hrefs: &[&str]) -> String {
    let styles = ["btn btn-success btn-lg h6", "btn btn-danger", "btn btn-secondary"];
    let buttons: String = hrefs
        .iter()
        .enumerate()
        .map(|(i, href)| {
            format!(
                "<a class=\"{}\" href=\"{}\">Download [{}]</a>\n",
                styles[i % styles.len()],
                href,
                i
            )
        })
        .collect();
    format!(
        "<html><body><h2>file.mkv</h2>{buttons}<a class=\"btn btn-primary\" href=\"https://ignored.example/telegram\">Telegram</a></body></html>"
    )
}

pub fn html(body: String) -> wiremock::ResponseTemplate {
    wiremock::ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body)
}
