//! Request and response bodies for the external APIs.

pub mod chain;
pub mod telegram;
pub mod transaction;
