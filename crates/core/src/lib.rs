//! Domain types, error kinds, and pure rules shared by the database layer,
//! the HTTP API and the client library.

pub mod error;
pub mod listing;
pub mod types;
pub mod validation;
