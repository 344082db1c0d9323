use crate::error::Result;
use crate::results::{DiscoveryMethod, PdfLinkCandidate};
use crate::session::BrowserSession;
use crate::urls;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Literal marker looked for in link and element text. Case-sensitive, matching
/// the convention of sites that label download links "PDF".
const PDF_MARKER: &str = "PDF";

/// Collects PDF-link candidates from the session's rendered page.
///
/// Takes a DOM snapshot via the session and runs the three discovery passes
/// over it. Candidates are deduplicated by resolved absolute URL; the first
/// pass to capture a URL wins.
pub async fn discover(session: &BrowserSession) -> Result<Vec<PdfLinkCandidate>> {
    let html = session.source().await?;
    let base = session.current_url().await?;
    Ok(discover_in_html(&html, &base))
}

/// Fallback used when the main passes return nothing: takes a fresh snapshot
/// and re-runs the extension and text passes only. This survives a session
/// whose earlier snapshot predated script-driven DOM mutations.
pub async fn discover_direct(session: &BrowserSession) -> Result<Vec<PdfLinkCandidate>> {
    let html = session.source().await?;
    let base = session.current_url().await?;
    Ok(discover_in_html_direct(&html, &base))
}

/// Runs all three discovery passes over an HTML document
pub fn discover_in_html(html: &str, base: &Url) -> Vec<PdfLinkCandidate> {
    let doc = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    text_match_pass(&doc, base, &mut seen, &mut candidates);
    extension_match_pass(&doc, base, &mut seen, &mut candidates);
    element_text_pass(&doc, base, &mut seen, &mut candidates);

    ::log::info!("discovery found {} PDF link candidates", candidates.len());
    candidates
}

/// The direct variant: extension pass first, then text pass, no element pass
pub fn discover_in_html_direct(html: &str, base: &Url) -> Vec<PdfLinkCandidate> {
    let doc = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    extension_match_pass(&doc, base, &mut seen, &mut candidates);
    text_match_pass(&doc, base, &mut seen, &mut candidates);

    ::log::info!(
        "direct discovery found {} PDF link candidates",
        candidates.len()
    );
    candidates
}

/// Pass 1: anchors whose visible text contains "PDF"
fn text_match_pass(
    doc: &Html,
    base: &Url,
    seen: &mut HashSet<String>,
    candidates: &mut Vec<PdfLinkCandidate>,
) {
    let selector = Selector::parse("a").expect("static selector");

    for element in doc.select(&selector) {
        let text = element.text().collect::<String>();
        if !text.contains(PDF_MARKER) {
            continue;
        }
        let Some(href) = element.value().attr("href") else {
            ::log::debug!("anchor with PDF text has no href, skipping");
            continue;
        };
        push_candidate(
            base,
            href,
            text.trim(),
            DiscoveryMethod::HrefTextMatch,
            seen,
            candidates,
        );
    }
}

/// Pass 2: anchors whose href attribute contains ".pdf"
fn extension_match_pass(
    doc: &Html,
    base: &Url,
    seen: &mut HashSet<String>,
    candidates: &mut Vec<PdfLinkCandidate>,
) {
    let selector = Selector::parse(r#"a[href*=".pdf"]"#).expect("static selector");

    for element in doc.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let text = element.text().collect::<String>();
        push_candidate(
            base,
            href,
            text.trim(),
            DiscoveryMethod::HrefExtensionMatch,
            seen,
            candidates,
        );
    }
}

/// Pass 3: button/div/span elements containing "PDF" with a descendant anchor.
/// Breadth fallback for pages where the clickable area wraps the real link.
fn element_text_pass(
    doc: &Html,
    base: &Url,
    seen: &mut HashSet<String>,
    candidates: &mut Vec<PdfLinkCandidate>,
) {
    let selector = Selector::parse("button, div, span").expect("static selector");
    let anchor_selector = Selector::parse("a").expect("static selector");

    for element in doc.select(&selector) {
        let text = element.text().collect::<String>();
        if !text.contains(PDF_MARKER) {
            continue;
        }
        let Some(anchor) = element.select(&anchor_selector).next() else {
            continue;
        };
        let Some(href) = anchor.value().attr("href") else {
            ::log::debug!("descendant anchor has no href, skipping");
            continue;
        };
        push_candidate(
            base,
            href,
            text.trim(),
            DiscoveryMethod::ElementTextMatch,
            seen,
            candidates,
        );
    }
}

/// Resolves an href against the page base, filters to http/https, and appends
/// the candidate unless its URL was already captured by an earlier pass
fn push_candidate(
    base: &Url,
    href: &str,
    text: &str,
    method: DiscoveryMethod,
    seen: &mut HashSet<String>,
    candidates: &mut Vec<PdfLinkCandidate>,
) {
    let Ok(resolved) = base.join(href) else {
        ::log::debug!("could not resolve href {:?} against {}", href, base);
        return;
    };
    if !matches!(resolved.scheme(), "http" | "https") {
        ::log::debug!("skipping non-http link: {}", resolved);
        return;
    }

    let url = resolved.to_string();
    if !seen.insert(url.clone()) {
        return;
    }

    let filename = urls::extract_filename(&url, text);
    candidates.push(PdfLinkCandidate {
        url,
        text: text.to_string(),
        filename,
        method,
    });
}
