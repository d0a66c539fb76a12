//! On-chain collaborators.
//!
//! Each collaborator is a small `async_trait` seam with a MultiversX
//! implementation backed by [`bondwatch_sdk::client::MultiversxClient`].

pub mod purchase;
pub mod registry;
pub mod swap_probe;

pub use purchase::{MultiversxPurchaser, PurchaseError, PurchaseExecutor, PurchaseSettings};
pub use registry::{MultiversxRegistry, RegistrySource};
pub use swap_probe::{INITIAL_SWAP_FUNCTION, MultiversxSwapProbe, SwapProbe};
