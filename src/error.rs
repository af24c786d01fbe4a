use thiserror::Error;

/// Failure modes of the extraction pipeline.
///
/// `MalformedFragment` is local and recoverable: the session drops the
/// offending fragment, bumps its skipped count and keeps going. `Stream` is
/// fatal for the run and propagates to the caller unretried.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("malformed page fragment: {0}")]
    MalformedFragment(&'static str),

    #[error("dump stream read failed")]
    Stream(#[from] std::io::Error),
}

impl ExtractError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ExtractError::MalformedFragment(_))
    }
}
