use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unexpected status {status} from {url}")]
    StatusError { url: String, status: u16 },

    #[error("Request to {0} timed out")]
    Timeout(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl ScanError {
    /// Maps a reqwest failure, keeping timeouts distinct from other transport errors.
    pub(crate) fn from_request(url: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ScanError::Timeout(url.to_string())
        } else {
            ScanError::HttpError(error)
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
