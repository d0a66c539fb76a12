#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

//! Wire types and API clients for the bonding address watcher.
//!
//! * [`address`] – 32-byte account addresses and their bech32 (`erd1…`) form.
//! * [`codec`] – smart contract return-data decoding and call-data encoding.
//! * [`wallet`] – PEM wallet loading and Ed25519 transaction signing.
//! * [`objects`] – request/response bodies of the MultiversX and Telegram APIs.
//! * [`client`] – typed HTTP clients (behind the `client` feature).

pub mod address;
#[cfg(feature = "client")]
pub mod client;
pub mod codec;
pub mod objects;
pub mod wallet;
