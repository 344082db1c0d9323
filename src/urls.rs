use percent_encoding::percent_decode_str;
use regex::Regex;
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};
use url::Url;

/// Characters that are unsafe in filenames on Windows or Unix
static ILLEGAL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"|?*\\/]"#).expect("static pattern"));

static SEPARATOR_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_]+").expect("static pattern"));

static DOT_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{2,}").expect("static pattern"));

static SLASH_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/{2,}").expect("static pattern"));

/// Maximum length of a sanitized filename, in characters
const MAX_FILENAME_LEN: usize = 200;

/// Maximum accepted URL length
const MAX_URL_LEN: usize = 2048;

/// Query parameters that mark a URL as PDF-typed
const PDF_QUERY_MARKERS: [&str; 3] = ["type=pdf", "format=pdf", "file=pdf"];

/// Query parameters that may carry a filename
const FILENAME_QUERY_KEYS: [&str; 3] = ["file", "filename", "name"];

/// Normalizes a URL: trims whitespace, resolves relative references against
/// `base`, fills a missing scheme with `http` when the input looks like a bare
/// host, and collapses duplicate path separators. Scheme and host lowercasing
/// and empty-path defaulting come from the `url` crate.
///
/// Never fails; on any parse failure the trimmed input is returned unchanged.
pub fn normalize(url: &str, base: Option<&str>) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let parsed = match Url::parse(trimmed) {
        Ok(parsed) => Some(parsed),
        Err(url::ParseError::RelativeUrlWithoutBase) => match base {
            Some(base) => Url::parse(base).ok().and_then(|b| b.join(trimmed).ok()),
            None if looks_like_host(trimmed) => Url::parse(&format!("http://{trimmed}")).ok(),
            None => None,
        },
        Err(_) => None,
    };

    let Some(mut parsed) = parsed else {
        ::log::debug!("URL normalization left input unchanged: {}", trimmed);
        return trimmed.to_string();
    };

    if parsed.path().contains("//") {
        let collapsed = SLASH_RUNS.replace_all(parsed.path(), "/").into_owned();
        parsed.set_path(&collapsed);
    }

    parsed.to_string()
}

/// A schemeless string like "example.com/a/b" can be promoted to a URL when
/// its first segment looks like a hostname
fn looks_like_host(s: &str) -> bool {
    s.split('/').next().is_some_and(|seg| seg.contains('.') && !seg.is_empty())
}

/// Returns true if the URL points at a PDF: path ends in `.pdf`
/// (case-insensitive), the query carries a recognized PDF-typed parameter, or
/// the path contains a `/pdf/` or `/document/` segment.
pub fn is_pdf_url(url: &str) -> bool {
    let (path, query) = match Url::parse(url) {
        Ok(parsed) => (
            parsed.path().to_lowercase(),
            parsed.query().unwrap_or("").to_lowercase(),
        ),
        // Unparseable input still gets the string-level heuristics
        Err(_) => {
            let lower = url.to_lowercase();
            match lower.split_once('?') {
                Some((path, query)) => (path.to_string(), query.to_string()),
                None => (lower, String::new()),
            }
        }
    };

    if path.ends_with(".pdf") {
        return true;
    }
    if PDF_QUERY_MARKERS.iter().any(|marker| query.contains(marker)) {
        return true;
    }
    path.contains("/pdf/") || path.contains("/document/")
}

/// Checks that a URL is absolute, uses http/https, has a host, and is not
/// unreasonably long
pub fn validate_url(url: &str) -> bool {
    if url.is_empty() || url.len() > MAX_URL_LEN {
        return false;
    }
    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some(),
        Err(_) => false,
    }
}

/// `validate_url` plus the PDF heuristics of `is_pdf_url`
pub fn validate_pdf_url(url: &str) -> bool {
    validate_url(url) && is_pdf_url(url)
}

/// Derives a local filename for a PDF URL.
///
/// Preference order: last path segment containing a dot (percent-decoded),
/// then a `file`/`filename`/`name` query parameter, then the sanitized link
/// text with a guaranteed `.pdf` suffix, and finally a generated
/// `document_<timestamp>.pdf`. Every branch routes through the sanitizer.
pub fn extract_filename(url: &str, fallback_text: &str) -> String {
    if let Ok(parsed) = Url::parse(url) {
        if let Some(last) = parsed.path_segments().and_then(|mut s| s.next_back()) {
            if last.contains('.') {
                let decoded = percent_decode_str(last).decode_utf8_lossy();
                let cleaned = sanitize_filename(&decoded);
                if !cleaned.is_empty() {
                    return cleaned;
                }
            }
        }

        for (key, value) in parsed.query_pairs() {
            if FILENAME_QUERY_KEYS.contains(&key.as_ref()) && value.contains('.') {
                let cleaned = sanitize_filename(&value);
                if !cleaned.is_empty() {
                    return cleaned;
                }
            }
        }
    }

    let fallback = fallback_text.trim();
    if !fallback.is_empty() {
        let cleaned = sanitize_filename(fallback);
        if !cleaned.is_empty() {
            return if cleaned.to_lowercase().ends_with(".pdf") {
                cleaned
            } else {
                format!("{cleaned}.pdf")
            };
        }
    }

    generated_name()
}

fn generated_name() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("document_{secs}.pdf")
}

/// Makes a filename filesystem-safe: replaces `< > : " | ? * \ /` with `_`,
/// collapses whitespace/underscore runs into one `_`, trims leading and
/// trailing underscores, collapses runs of dots, and truncates to 200
/// characters.
pub fn sanitize_filename(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }

    let cleaned = ILLEGAL_CHARS.replace_all(name, "_");
    let cleaned = SEPARATOR_RUNS.replace_all(&cleaned, "_");
    let cleaned = cleaned.trim_matches('_');
    let cleaned = DOT_RUNS.replace_all(cleaned, ".");

    cleaned.chars().take(MAX_FILENAME_LEN).collect()
}
