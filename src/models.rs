use serde::{Deserialize, Serialize};

/// Raw text of one page, as delimited by the boundary scanner.
///
/// Not yet known to be well-formed; owned by the scanner until handed to the
/// field extractor and dropped right after, success or failure.
#[derive(Debug, Clone)]
pub struct RawPageFragment {
    pub text: String,
}

impl RawPageFragment {
    pub fn new(text: String) -> Self {
        Self { text }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Title and body pulled out of a fragment, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct PageFields {
    pub title: String,
    pub body: String,
}

/// A classified, feature-extracted article ready for downstream generation.
///
/// Immutable once built: the intro is capped, the image list is capped and
/// ordered by first appearance, and `raw_body_length` met the configured
/// minimum at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateArticle {
    pub title: String,
    pub intro_excerpt: String,
    pub raw_body_length: usize,
    pub image_refs: Vec<String>,
}
