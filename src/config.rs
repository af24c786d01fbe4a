//! Constants and the read-only per-run extraction budget.

/// Default number of candidates to emit before a session stops.
pub const DEFAULT_MAX_CANDIDATES: u64 = 200;

/// Bodies shorter than this (in bytes) are stubs and never become candidates.
pub const DEFAULT_MIN_BODY_LENGTH: usize = 500;

/// Intro excerpts are truncated to this many characters.
pub const DEFAULT_INTRO_CAP: usize = 800;

/// Truncated intros shorter than this are not useful summarization input.
pub const DEFAULT_MIN_INTRO_LENGTH: usize = 100;

/// At most this many image references are kept per candidate.
pub const DEFAULT_IMAGE_CAP: usize = 3;

/// Progress update interval (tick every N pages)
pub const PROGRESS_INTERVAL: u64 = 1000;

/// Titles containing any of these substrings are excluded (case-sensitive).
pub const DEFAULT_TITLE_EXCLUSIONS: &[&str] =
    &["List of", "Category:", "Template:", "File:", "disambiguation"];

/// Read-only configuration for one extraction session.
#[derive(Debug, Clone)]
pub struct ExtractionBudget {
    pub max_candidates: u64,
    pub min_body_length: usize,
    pub title_exclusion_patterns: Vec<String>,
    pub intro_excerpt_cap: usize,
    pub min_intro_length: usize,
    pub image_cap: usize,
}

impl Default for ExtractionBudget {
    fn default() -> Self {
        Self {
            max_candidates: DEFAULT_MAX_CANDIDATES,
            min_body_length: DEFAULT_MIN_BODY_LENGTH,
            title_exclusion_patterns: DEFAULT_TITLE_EXCLUSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            intro_excerpt_cap: DEFAULT_INTRO_CAP,
            min_intro_length: DEFAULT_MIN_INTRO_LENGTH,
            image_cap: DEFAULT_IMAGE_CAP,
        }
    }
}
