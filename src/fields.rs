//! Title/body extraction from raw page fragments.
//!
//! Dumps vary in how strictly they nest markup, so two strategies are
//! supported behind one contract: a strict structural parse of the fragment
//! as a single XML record, and a lightweight marker scan that only looks for
//! the title and text delimiter pairs. Callers pick one mode per run; both
//! produce the same `PageFields` shape, and both report broken fragments as
//! `ExtractError::MalformedFragment` instead of aborting the run.

use crate::error::ExtractError;
use crate::models::{PageFields, RawPageFragment};
use serde::Deserialize;

const TITLE_OPEN: &str = "<title>";
const TITLE_CLOSE: &str = "</title>";
const BODY_OPEN: &str = "<text";
const BODY_CLOSE: &str = "</text>";

/// Field extraction strategy, chosen once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    /// Strict structural parse of the whole fragment.
    Structured,
    /// Lightweight text search for the marker pairs.
    MarkerScan,
}

#[derive(Deserialize)]
struct PageDe {
    #[serde(default)]
    title: Vec<String>,
    #[serde(default)]
    revision: Vec<RevisionDe>,
}

#[derive(Deserialize)]
struct RevisionDe {
    text: Option<TextDe>,
}

#[derive(Deserialize)]
struct TextDe {
    #[serde(rename = "$text")]
    content: Option<String>,
}

/// Extracts `(title, body)` from one fragment, or fails with
/// `MalformedFragment`. The fragment is consumed by the caller either way.
pub fn extract_fields(
    fragment: &RawPageFragment,
    mode: ExtractMode,
) -> Result<PageFields, ExtractError> {
    let fields = match mode {
        ExtractMode::Structured => structured(&fragment.text)?,
        ExtractMode::MarkerScan => marker_scan(&fragment.text)?,
    };

    if fields.title.is_empty() {
        return Err(ExtractError::MalformedFragment("empty title"));
    }

    Ok(fields)
}

fn structured(text: &str) -> Result<PageFields, ExtractError> {
    let page: PageDe = quick_xml::de::from_str(text)
        .map_err(|_| ExtractError::MalformedFragment("structural parse failed"))?;

    let title = page
        .title
        .into_iter()
        .next()
        .ok_or(ExtractError::MalformedFragment("no title element"))?;

    let body = page
        .revision
        .into_iter()
        .find_map(|rev| rev.text)
        .and_then(|t| t.content)
        .unwrap_or_default();

    Ok(PageFields {
        title: title.trim().to_string(),
        body: body.trim().to_string(),
    })
}

fn marker_scan(text: &str) -> Result<PageFields, ExtractError> {
    let t_open = text
        .find(TITLE_OPEN)
        .ok_or(ExtractError::MalformedFragment("no title-open marker"))?;
    let t_start = t_open + TITLE_OPEN.len();
    let t_len = text[t_start..]
        .find(TITLE_CLOSE)
        .ok_or(ExtractError::MalformedFragment("no title-close marker"))?;
    let title = text[t_start..t_start + t_len].trim();

    let b_open = text
        .find(BODY_OPEN)
        .ok_or(ExtractError::MalformedFragment("no body-open marker"))?;
    // The open tag carries attributes; the body starts after its closing '>'.
    let tag_len = text[b_open..]
        .find('>')
        .ok_or(ExtractError::MalformedFragment("unterminated body-open tag"))?;
    let b_start = b_open + tag_len + 1;
    let b_len = text[b_start..]
        .find(BODY_CLOSE)
        .ok_or(ExtractError::MalformedFragment("no body-close marker"))?;
    let body = text[b_start..b_start + b_len].trim();

    Ok(PageFields {
        title: title.to_string(),
        body: body.to_string(),
    })
}
