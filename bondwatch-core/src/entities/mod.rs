//! Domain records and their local persistence.

pub mod address_snapshot;
pub mod bonding_address;

pub use address_snapshot::AddressSnapshotStore;
pub use bonding_address::BondingAddress;
