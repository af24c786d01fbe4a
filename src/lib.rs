//! Wikifeed: Wikipedia dump mining and short-form post generation
//!
//! This crate turns a multi-gigabyte compressed Wikipedia export into a
//! stream of candidate articles and, through a hosted completion API, into
//! short-form posts:
//!
//! 1. **Extraction** -- Stream the dump line by line, detect page
//!    boundaries, pull out title and body, classify, and derive the lead
//!    excerpt and image references; emit candidates as JSONL
//! 2. **Import** -- Load candidates into a SQLite store, rejecting
//!    duplicate titles
//! 3. **Generation** -- Feed unprocessed articles to an OpenAI-compatible
//!    chat-completions endpoint and save the structured posts
//!
//! # Architecture
//!
//! The extraction core is designed for bounded memory on unbounded input:
//!
//! - **Line-oriented boundary scanning** -- No full XML parse; fixed page
//!   markers delimit fragments, and at most one page is buffered at a time
//! - **Skip-and-continue resilience** -- Malformed, truncated, or
//!   non-article pages are counted and dropped, never aborting the run
//! - **Single pass, forward only** -- The scanner never rewinds; dumps are
//!   too large to hold or re-read
//! - **Lazy candidate stream** -- The session is an iterator; the caller
//!   can stop pulling at any fragment boundary with no side effects
//!
//! # Key Modules
//!
//! - [`scanner`] -- Dump opening (bz2 multistream) and page boundary detection
//! - [`fields`] -- Title/body extraction, structured or marker-scan mode
//! - [`filter`] -- Inclusion rules (length, title patterns, redirects)
//! - [`features`] -- Lead-excerpt and image-reference derivation
//! - [`session`] -- Budgeted orchestration of the pipeline
//! - [`generate`] -- Completion-API client
//! - [`store`] -- SQLite persistence for articles and posts
//! - [`models`] -- Core data types (RawPageFragment, CandidateArticle)
//! - [`config`] -- Extraction budget and defaults
//! - [`error`] -- Recoverable vs fatal extraction failures
//!
//! # Example Usage
//!
//! ```bash
//! # Extract 200 candidates from a dump
//! wikifeed extract -i enwiki-latest-pages-articles.xml.bz2 -o candidates.jsonl
//!
//! # Load them into the article database
//! wikifeed import -i candidates.jsonl --db wikifeed.db
//!
//! # Turn five of them into posts
//! DEEPSEEK_API_KEY=... wikifeed generate --db wikifeed.db --count 5
//! ```

pub mod config;
pub mod error;
pub mod features;
pub mod fields;
pub mod filter;
pub mod generate;
pub mod models;
pub mod scanner;
pub mod session;
pub mod store;
