use outpost_core::OutpostError;
use thiserror::Error;

/// Errors that end a scrape run
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("page never became interactive: {selector} missing")]
    PageNotInteractive { selector: String },

    #[error("browser error: {0}")]
    Browser(#[from] outpost_browser::BrowserError),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

impl From<ScrapeError> for OutpostError {
    fn from(err: ScrapeError) -> Self {
        match err {
            ScrapeError::Browser(e) => Self::Browser(e.to_string()),
            other => Self::Scrape(other.to_string()),
        }
    }
}
