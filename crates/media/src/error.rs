//! Errors from staging and remote media operations.

/// Errors from the media layer.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// Local filesystem failure while staging or reading an upload.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP request to the media host failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The media host returned a non-2xx status code.
    #[error("Media host error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The upload stream produced an error before it was fully staged.
    #[error("Upload stream failed: {0}")]
    Stream(String),

    /// The upload exceeded the configured size limit.
    #[error("Upload exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    /// The upload contained no bytes.
    #[error("Upload is empty")]
    Empty,

    /// Missing or invalid media host configuration.
    #[error("Media configuration error: {0}")]
    Config(String),
}
