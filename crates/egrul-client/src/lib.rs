//! # egrul-client
//!
//! Client for the public search of the Unified State Register of Legal
//! Entities (EGRUL) at `https://egrul.nalog.ru`.
//!
//! A search is two requests: a form `POST` that returns a search token, then
//! a `GET` of the result page for that token. [`EgrulClient::find_director`]
//! runs both and extracts the full name of the organisation's head.

pub mod client;
pub mod config;
pub mod error;
pub mod model;

pub use client::{parse_director, DirectorLookup, EgrulClient};
pub use config::{EgrulConfig, DEFAULT_BASE_URL};
pub use error::{EgrulError, EgrulResult};
pub use model::{SearchResult, SearchRow, SearchToken};
