//! Page boundary detection over a decompressed line stream.
//!
//! The scanner never parses markup: it watches each line for the fixed
//! page-open/page-close markers and hands back everything in between as one
//! raw fragment. Lines outside an open fragment are discarded immediately,
//! so peak memory is one page's worth of text no matter how large the dump
//! is. The stream is forward-only; the scanner never rewinds.

use crate::error::ExtractError;
use crate::models::RawPageFragment;
use anyhow::{Context, Result};
use bzip2::read::MultiBzDecoder;
use memchr::memmem;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::debug;

pub const PAGE_OPEN: &str = "<page>";
pub const PAGE_CLOSE: &str = "</page>";

/// Opens a dump file as a buffered line stream, decompressing bz2
/// multistream archives when the extension says so.
pub fn open_dump(path: &str) -> Result<Box<dyn BufRead + Send>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open wiki dump at: {}", path))?;

    if Path::new(path).extension().is_some_and(|ext| ext == "bz2") {
        let decoder: Box<dyn Read + Send> = Box::new(MultiBzDecoder::new(file));
        Ok(Box::new(BufReader::new(decoder)))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Lazy, finite, non-restartable sequence of raw page fragments.
pub struct PageScanner<R: BufRead> {
    reader: R,
    line: String,
    fragment: String,
    in_page: bool,
    done: bool,
}

impl<R: BufRead> PageScanner<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            fragment: String::new(),
            in_page: false,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for PageScanner<R> {
    type Item = Result<RawPageFragment, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => {
                    self.done = true;
                    if self.in_page {
                        // Stream ended mid-fragment: discard, no error.
                        debug!(
                            buffered = self.fragment.len(),
                            "Dump ended inside an open page, dropping dangling fragment"
                        );
                        self.fragment.clear();
                    }
                    return None;
                }
                Ok(_) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(ExtractError::Stream(e)));
                }
            }

            // Offset past which a close marker would end the fragment. When a
            // line opens a page, only the part after the open marker counts.
            let close_from = if self.in_page {
                // A nested page-open marker is ignored and the open fragment
                // keeps accumulating. Marker-looking text does occur inside
                // escaped content; this is a tolerance policy, not a
                // correctness guarantee, and it can merge two genuine pages
                // if a real marker slips through unescaped.
                self.fragment.push_str(&self.line);
                0
            } else {
                match memmem::find(self.line.as_bytes(), PAGE_OPEN.as_bytes()) {
                    Some(open) => {
                        self.in_page = true;
                        self.fragment.clear();
                        self.fragment.push_str(&self.line);
                        open + PAGE_OPEN.len()
                    }
                    // Anything between pages is discarded unbuffered.
                    None => continue,
                }
            };

            if memmem::find(&self.line.as_bytes()[close_from..], PAGE_CLOSE.as_bytes()).is_some() {
                self.in_page = false;
                let fragment = RawPageFragment::new(std::mem::take(&mut self.fragment));
                return Some(Ok(fragment));
            }
        }
    }
}
