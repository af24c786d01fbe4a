//! Inclusion rules deciding whether an extracted page becomes a candidate.

use crate::config::ExtractionBudget;
use crate::features::DISAMBIG_REGEX;

/// Pure, total predicate over `(title, body)`; no side effects, never fails.
#[derive(Debug, Clone)]
pub struct ArticleFilter {
    min_body_length: usize,
    title_exclusion_patterns: Vec<String>,
}

impl ArticleFilter {
    pub fn new(min_body_length: usize, title_exclusion_patterns: Vec<String>) -> Self {
        Self {
            min_body_length,
            title_exclusion_patterns,
        }
    }

    pub fn from_budget(budget: &ExtractionBudget) -> Self {
        Self::new(
            budget.min_body_length,
            budget.title_exclusion_patterns.clone(),
        )
    }

    /// Applies the exclusion rules in order; the first match short-circuits.
    pub fn is_included(&self, title: &str, body: &str) -> bool {
        if body.len() < self.min_body_length {
            return false;
        }
        if is_redirect(body) {
            return false;
        }
        if self
            .title_exclusion_patterns
            .iter()
            .any(|pat| title.contains(pat.as_str()))
        {
            return false;
        }
        if DISAMBIG_REGEX.is_match(body) {
            return false;
        }
        true
    }
}

/// Redirect stubs open with `#REDIRECT` (any case, possibly after whitespace).
fn is_redirect(body: &str) -> bool {
    body.trim_start()
        .as_bytes()
        .get(..9)
        .is_some_and(|head| head.eq_ignore_ascii_case(b"#redirect"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_filter() -> ArticleFilter {
        ArticleFilter::from_budget(&ExtractionBudget::default())
    }

    fn long_body(prefix: &str) -> String {
        format!("{}{}", prefix, "x".repeat(600))
    }

    #[test]
    fn short_body_excluded() {
        let f = ArticleFilter::new(500, vec![]);
        assert!(!f.is_included("Octopus", &"x".repeat(50)));
    }

    #[test]
    fn long_body_included() {
        let f = default_filter();
        assert!(f.is_included("Octopus", &long_body("The octopus is ")));
    }

    #[test]
    fn list_page_excluded_regardless_of_length() {
        let f = default_filter();
        assert!(!f.is_included("List of Mammals", &long_body("Mammals are ")));
    }

    #[test]
    fn title_match_is_case_sensitive() {
        let f = default_filter();
        assert!(f.is_included("list of things nobody capitalized", &long_body("Body ")));
        assert!(!f.is_included("Category:Things", &long_body("Body ")));
    }

    #[test]
    fn default_patterns_cover_special_pages() {
        let f = default_filter();
        for title in [
            "List of rivers",
            "Category:Rivers",
            "Template:River",
            "File:River.jpg",
            "Nile (disambiguation)",
        ] {
            assert!(!f.is_included(title, &long_body("Body ")), "{title}");
        }
    }

    #[test]
    fn redirect_body_excluded() {
        let f = default_filter();
        let body = format!("#REDIRECT [[Somewhere else]]{}", " ".repeat(600));
        assert!(!f.is_included("Alias", &body));
        let lower = format!("#redirect [[Somewhere else]]{}", " ".repeat(600));
        assert!(!f.is_included("Alias", &lower));
    }

    #[test]
    fn disambiguation_template_excluded() {
        let f = default_filter();
        let body = long_body("{{disambiguation}}\nSeveral things called Nile. ");
        assert!(!f.is_included("Nile", &body));
    }

    #[test]
    fn predicate_is_pure() {
        let f = default_filter();
        let body = long_body("The octopus is ");
        let first = f.is_included("Octopus", &body);
        let second = f.is_included("Octopus", &body);
        assert_eq!(first, second);
    }

    #[test]
    fn length_rule_applies_before_title_rule() {
        // A blacklisted title with a short body is excluded either way;
        // rule order only matters for observability, not outcome.
        let f = default_filter();
        assert!(!f.is_included("List of Mammals", "tiny"));
    }
}
