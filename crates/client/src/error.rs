//! Errors surfaced by [`ApiClient`](crate::ApiClient).

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        /// Machine-readable code from the error body, when present.
        code: Option<String>,
        message: String,
    },

    /// A 2xx body did not match the expected envelope.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The server issued a token that cannot be sent as a header.
    #[error("Access token is not a valid header value")]
    InvalidToken,

    /// The access token could not be refreshed; the session was cleared.
    #[error("Session expired, sign in again")]
    SessionExpired,
}

impl ClientError {
    /// HTTP status of an API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Request(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Build an [`ClientError::Api`] from an error response body.
    ///
    /// Bodies that are not the JSON error envelope are kept verbatim as the
    /// message.
    pub(crate) fn from_body(status: u16, body: &[u8]) -> Self {
        #[derive(Deserialize)]
        struct ErrorBody {
            message: String,
            #[serde(default)]
            code: Option<String>,
        }

        match serde_json::from_slice::<ErrorBody>(body) {
            Ok(parsed) => Self::Api {
                status,
                code: parsed.code,
                message: parsed.message,
            },
            Err(_) => Self::Api {
                status,
                code: None,
                message: String::from_utf8_lossy(body).into_owned(),
            },
        }
    }
}
