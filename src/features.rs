//! Pure wikitext feature derivations: the lead-section excerpt and the
//! embedded image references of an article body.

use once_cell::sync::Lazy;
use regex::Regex;

static SECTION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(={2,})\s*(.+?)\s*={2,}\s*$").unwrap());

static IMAGE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[\[(?:File|Image):([^|\]]+?)(?:\|[^\]]*)*\]\]").unwrap());

pub(crate) static DISAMBIG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\{\{(?:disambig(?:uation)?|dab|hndis|geodis|disamb|surname|given name)\b")
        .unwrap()
});

/// Returns the lead section (before the first `==` heading) with templates
/// stripped, truncated to `cap` characters.
pub fn extract_intro(body: &str, cap: usize) -> String {
    // Strip templates first so headings inside {{Infobox ...}} don't truncate the lead.
    let stripped = strip_templates(body);

    let end_pos = SECTION_REGEX
        .find(&stripped)
        .map(|m| m.start())
        .unwrap_or(stripped.len());

    let lead = stripped[..end_pos]
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    truncate_chars(&lead, cap)
}

/// Image filenames embedded in the body, in order of first appearance.
///
/// Duplicates are kept; only the total count is capped. Entries that already
/// carry a URI scheme are external references, not dump filenames, and are
/// dropped.
pub fn extract_image_refs(body: &str, cap: usize) -> Vec<String> {
    IMAGE_REGEX
        .captures_iter(body)
        .map(|c| sanitize_field(c[1].trim()))
        .filter(|name| !name.is_empty() && !has_uri_scheme(name))
        .take(cap)
        .collect()
}

fn has_uri_scheme(name: &str) -> bool {
    match name.split_once("://") {
        Some((scheme, _)) => {
            !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
        }
        None => false,
    }
}

fn truncate_chars(s: &str, cap: usize) -> String {
    match s.char_indices().nth(cap) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Collapses newlines into spaces so filenames stay on a single line.
fn sanitize_field(s: &str) -> String {
    if s.contains('\n') || s.contains('\r') {
        s.replace(['\n', '\r'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        s.to_string()
    }
}

fn strip_templates(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut i = 0;
    let mut run_start = 0;

    while i < bytes.len() {
        if i + 1 < bytes.len() && bytes[i] == b'{' && bytes[i + 1] == b'{' {
            if run_start < i {
                result.push_str(&text[run_start..i]);
            }
            let mut depth: i32 = 0;
            while i + 1 < bytes.len() {
                if bytes[i] == b'{' && bytes[i + 1] == b'{' {
                    depth += 1;
                    i += 2;
                } else if bytes[i] == b'}' && bytes[i + 1] == b'}' {
                    depth -= 1;
                    if depth == 0 {
                        i += 2;
                        break;
                    }
                    i += 2;
                } else {
                    i += 1;
                }
            }
            run_start = i;
        } else {
            i += 1;
        }
    }

    if run_start < bytes.len() {
        result.push_str(&text[run_start..]);
    }

    result
}
