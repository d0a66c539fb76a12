use bondwatch_sdk::codec::BondingRecord;
use serde::{Deserialize, Serialize};

/// A bonding pair created by the registry contract.
///
/// Identity is `address` (bech32), compared byte for byte. The serialized
/// form is the on-disk format of the address snapshot file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondingAddress {
    pub first_token_id: String,
    pub second_token_id: String,
    pub address: String,
}

impl BondingAddress {
    pub fn same_address(&self, other: &BondingAddress) -> bool {
        self.address == other.address
    }
}

impl From<BondingRecord> for BondingAddress {
    fn from(record: BondingRecord) -> Self {
        Self {
            first_token_id: record.first_token_id,
            second_token_id: record.second_token_id,
            address: record.address.to_bech32(),
        }
    }
}
