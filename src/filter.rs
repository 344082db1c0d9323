use crate::results::PdfLinkCandidate;
use serde::{Deserialize, Serialize};

/// Selection policy applied to candidates before download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Keep everything
    All,
    /// Keep names starting with a figure/table marker
    PrefixMatch,
    /// Keep names containing one of the caller-supplied keywords
    KeywordMatch,
}

/// Prefixes recognized by `FilterMode::PrefixMatch`. The CJK markers are the
/// conventional figure/table prefixes on Taiwanese government sites.
const CHART_PREFIXES: [&str; 4] = ["圖", "表", "figure", "table"];

/// Applies the selection policy to a candidate list. Input order is preserved
/// and no re-sorting happens. `KeywordMatch` with an empty keyword list drops
/// every candidate.
pub fn filter_candidates(
    candidates: Vec<PdfLinkCandidate>,
    mode: FilterMode,
    keywords: &[String],
) -> Vec<PdfLinkCandidate> {
    if mode == FilterMode::All {
        return candidates;
    }

    if mode == FilterMode::KeywordMatch && keywords.is_empty() {
        ::log::warn!("keyword filter selected with no keywords, dropping all candidates");
        return Vec::new();
    }

    let total = candidates.len();
    let kept: Vec<PdfLinkCandidate> = candidates
        .into_iter()
        .filter(|candidate| {
            let keep = matches(mode, keywords, &candidate.filename)
                || matches(mode, keywords, &candidate.text);
            if keep {
                ::log::debug!("keeping candidate: {}", candidate.filename);
            } else {
                ::log::debug!("filtering out candidate: {}", candidate.filename);
            }
            keep
        })
        .collect();

    ::log::info!("filter kept {} of {} candidates", kept.len(), total);
    kept
}

/// Filename-only variant used when merging local directories, where there is
/// no link text to consult
pub fn matches_filename(filename: &str, mode: FilterMode, keywords: &[String]) -> bool {
    match mode {
        FilterMode::All => true,
        FilterMode::KeywordMatch if keywords.is_empty() => false,
        _ => matches(mode, keywords, filename),
    }
}

fn matches(mode: FilterMode, keywords: &[String], value: &str) -> bool {
    let lower = value.to_lowercase();
    match mode {
        FilterMode::All => true,
        FilterMode::PrefixMatch => CHART_PREFIXES.iter().any(|prefix| lower.starts_with(prefix)),
        FilterMode::KeywordMatch => keywords
            .iter()
            .any(|keyword| lower.contains(&keyword.to_lowercase())),
    }
}
