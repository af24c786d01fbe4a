//! Single-pass session driving scanner, field extraction, classification and
//! feature derivation into an ordered candidate stream.

use crate::config::ExtractionBudget;
use crate::error::ExtractError;
use crate::features::{extract_image_refs, extract_intro};
use crate::fields::{extract_fields, ExtractMode};
use crate::filter::ArticleFilter;
use crate::models::CandidateArticle;
use crate::scanner::PageScanner;
use std::io::BufRead;
use tracing::{debug, trace};

/// Lazy iterator over the candidates of one pass over one stream.
///
/// Malformed fragments and excluded pages are counted as skipped and never
/// surface to the caller; a stream I/O failure is yielded once and ends the
/// iteration. Deduplication is deliberately not done here: rejecting
/// duplicate titles is the sink's concern and has no effect on this state.
pub struct ExtractionSession<R: BufRead> {
    scanner: PageScanner<R>,
    budget: ExtractionBudget,
    filter: ArticleFilter,
    mode: ExtractMode,
    emitted: u64,
    skipped: u64,
    done: bool,
}

impl<R: BufRead> ExtractionSession<R> {
    pub fn new(reader: R, budget: ExtractionBudget, mode: ExtractMode) -> Self {
        let filter = ArticleFilter::from_budget(&budget);
        Self {
            scanner: PageScanner::new(reader),
            budget,
            filter,
            mode,
            emitted: 0,
            skipped: 0,
            done: false,
        }
    }

    /// Candidates emitted so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Fragments dropped so far (malformed, excluded, or intro too short).
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl<R: BufRead> Iterator for ExtractionSession<R> {
    type Item = Result<CandidateArticle, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.emitted >= self.budget.max_candidates {
            return None;
        }

        loop {
            let fragment = match self.scanner.next()? {
                Ok(fragment) => fragment,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };

            let fields = match extract_fields(&fragment, self.mode) {
                Ok(fields) => fields,
                Err(e) => {
                    debug!(error = %e, "Skipping malformed fragment");
                    self.skipped += 1;
                    continue;
                }
            };
            drop(fragment);

            if !self.filter.is_included(&fields.title, &fields.body) {
                trace!(title = %fields.title, "Excluded by classifier");
                self.skipped += 1;
                continue;
            }

            let intro_excerpt = extract_intro(&fields.body, self.budget.intro_excerpt_cap);
            if intro_excerpt.chars().count() < self.budget.min_intro_length {
                trace!(title = %fields.title, "Intro too short to be useful");
                self.skipped += 1;
                continue;
            }

            let image_refs = extract_image_refs(&fields.body, self.budget.image_cap);

            self.emitted += 1;
            return Some(Ok(CandidateArticle {
                title: fields.title,
                intro_excerpt,
                raw_body_length: fields.body.len(),
                image_refs,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, BufReader, Cursor, Read};

    fn page(title: &str, body: &str) -> String {
        format!(
            "<page>\n<title>{}</title>\n<ns>0</ns>\n<revision>\n<text>{}</text>\n</revision>\n</page>\n",
            title, body
        )
    }

    fn body_of_len(len: usize) -> String {
        let sentence = "The quick brown fox jumps over the lazy dog. ";
        sentence.repeat(len / sentence.len() + 1)[..len].to_string()
    }

    fn session_over(input: String) -> ExtractionSession<Cursor<String>> {
        ExtractionSession::new(
            Cursor::new(input),
            ExtractionBudget::default(),
            ExtractMode::MarkerScan,
        )
    }

    #[test]
    fn short_body_is_skipped_not_emitted() {
        let input = format!(
            "{}{}{}",
            page("Octopus", &body_of_len(600)),
            page("Stub", &body_of_len(50)),
            page("Squid", &body_of_len(600)),
        );
        let mut session = session_over(input);
        let titles: Vec<String> = session.by_ref().map(|r| r.unwrap().title).collect();
        assert_eq!(titles, vec!["Octopus", "Squid"]);
        assert_eq!(session.emitted(), 2);
        assert_eq!(session.skipped(), 1);
    }

    #[test]
    fn malformed_fragment_does_not_affect_emitted_count() {
        let input = format!(
            "{}<page>\nno markers at all\n</page>\n{}",
            page("Octopus", &body_of_len(600)),
            page("Squid", &body_of_len(600)),
        );
        let mut session = session_over(input);
        let count = session.by_ref().filter(|r| r.is_ok()).count();
        assert_eq!(count, 2);
        assert_eq!(session.emitted(), 2);
        assert_eq!(session.skipped(), 1);
    }

    #[test]
    fn budget_stops_iteration_early() {
        let input: String = (0..10)
            .map(|i| page(&format!("Article {}", i), &body_of_len(600)))
            .collect();
        let budget = ExtractionBudget {
            max_candidates: 3,
            ..ExtractionBudget::default()
        };
        let mut session =
            ExtractionSession::new(Cursor::new(input), budget, ExtractMode::MarkerScan);
        let count = session.by_ref().count();
        assert_eq!(count, 3);
        assert_eq!(session.emitted(), 3);
    }

    #[test]
    fn title_exclusion_applies_regardless_of_body_length() {
        let input = page("List of Mammals", &body_of_len(5_000));
        let mut session = session_over(input);
        assert!(session.next().is_none());
        assert_eq!(session.skipped(), 1);
    }

    #[test]
    fn intro_below_threshold_is_exclusion_not_error() {
        // Body is long enough, but everything except a few words sits under
        // a heading, so the derived intro is too short.
        let body = format!("Tiny lead.\n== Rest ==\n{}", body_of_len(600));
        let mut session = session_over(page("Terse", &body));
        assert!(session.next().is_none());
        assert_eq!(session.skipped(), 1);
    }

    #[test]
    fn candidate_respects_caps() {
        let body = format!(
            "{} [[File:a.jpg]] [[File:b.jpg]] [[File:c.jpg]] [[File:d.jpg]]",
            body_of_len(2_000)
        );
        let budget = ExtractionBudget::default();
        let cap = budget.intro_excerpt_cap;
        let image_cap = budget.image_cap;
        let mut session =
            ExtractionSession::new(Cursor::new(page("Caps", &body)), budget, ExtractMode::MarkerScan);
        let candidate = session.next().unwrap().unwrap();
        assert!(candidate.intro_excerpt.chars().count() <= cap);
        assert!(candidate.image_refs.len() <= image_cap);
        assert!(candidate.raw_body_length >= 500);
    }

    #[test]
    fn rerun_over_identical_input_is_identical() {
        let input = format!(
            "{}{}{}",
            page("Octopus", &body_of_len(700)),
            page("Stub", &body_of_len(40)),
            page("Squid", &format!("{} [[File:s.jpg]]", body_of_len(700))),
        );
        let first: Vec<CandidateArticle> = session_over(input.clone())
            .map(|r| r.unwrap())
            .collect();
        let second: Vec<CandidateArticle> = session_over(input).map(|r| r.unwrap()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn structured_mode_emits_the_same_candidates() {
        let input = format!(
            "{}{}",
            page("Octopus", &body_of_len(700)),
            page("Squid", &body_of_len(700)),
        );
        let marker: Vec<CandidateArticle> = session_over(input.clone())
            .map(|r| r.unwrap())
            .collect();
        let structured: Vec<CandidateArticle> = ExtractionSession::new(
            Cursor::new(input),
            ExtractionBudget::default(),
            ExtractMode::Structured,
        )
        .map(|r| r.unwrap())
        .collect();
        assert_eq!(marker, structured);
    }

    /// Yields a prefix of good data, then fails every subsequent read.
    struct FailingStream {
        data: Cursor<String>,
    }

    impl Read for FailingStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.read(buf)? {
                0 => Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "dump stream reset",
                )),
                n => Ok(n),
            }
        }
    }

    #[test]
    fn stream_failure_is_yielded_once_then_iteration_ends() {
        let prefix = format!(
            "{}<page>\n<title>Cut</title>\n",
            page("Whole", &body_of_len(700))
        );
        let reader = BufReader::new(FailingStream {
            data: Cursor::new(prefix),
        });
        let mut session =
            ExtractionSession::new(reader, ExtractionBudget::default(), ExtractMode::MarkerScan);

        let first = session.next().unwrap().unwrap();
        assert_eq!(first.title, "Whole");

        let err = session.next().unwrap().unwrap_err();
        assert!(matches!(err, ExtractError::Stream(_)));
        assert!(!err.is_recoverable());

        assert!(session.next().is_none());
        assert!(session.next().is_none());
        assert_eq!(session.emitted(), 1);
    }

    #[test]
    fn truncated_stream_drops_dangling_page() {
        let input = format!(
            "{}<page>\n<title>Cut</title>\n<text>{}",
            page("Whole", &body_of_len(700)),
            body_of_len(700)
        );
        let mut session = session_over(input);
        let titles: Vec<String> = session.by_ref().map(|r| r.unwrap().title).collect();
        assert_eq!(titles, vec!["Whole"]);
        assert_eq!(session.skipped(), 0);
    }
}
