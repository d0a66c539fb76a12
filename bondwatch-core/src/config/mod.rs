//! Runtime configuration objects shared across components.
//!
//! Static settings are loaded by the server crate; this module holds the
//! pieces that change while the process runs.

mod keyword_store;

pub use keyword_store::{KeywordConfig, KeywordStore};
