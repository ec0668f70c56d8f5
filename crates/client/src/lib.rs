//! Typed HTTP client for the vidshare API.
//!
//! [`ApiClient`] attaches the session's access token to outgoing requests
//! and, when the server answers 401, refreshes the token through the
//! refresh cookie held in its cookie store and resubmits the request once.
//! Concurrent 401s share a single refresh call.

pub mod client;
pub mod error;
pub mod session;
pub mod types;

pub use client::ApiClient;
pub use error::ClientError;
pub use session::Session;
pub use types::*;
