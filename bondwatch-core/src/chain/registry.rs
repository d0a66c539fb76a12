//! Registry of bonding pairs.

use crate::entities::BondingAddress;
use async_trait::async_trait;
use bondwatch_sdk::client::{ClientError, MultiversxClient};

/// Source of the registry's bonding entries, in contract (creation) order.
#[async_trait]
pub trait RegistrySource: Send + Sync {
    async fn fetch_entries(&self) -> Result<Vec<BondingAddress>, ClientError>;
}

/// Reads the registry through a contract view on the MultiversX API.
#[derive(Debug, Clone)]
pub struct MultiversxRegistry {
    client: MultiversxClient,
    contract: String,
    function: String,
}

impl MultiversxRegistry {
    pub const DEFAULT_FUNCTION: &str = "getAllBondingMetadata";

    pub fn new(
        client: MultiversxClient,
        contract: impl Into<String>,
        function: impl Into<String>,
    ) -> Self {
        Self {
            client,
            contract: contract.into(),
            function: function.into(),
        }
    }
}

#[async_trait]
impl RegistrySource for MultiversxRegistry {
    #[tracing::instrument(skip_all, err, name = "Chain:FetchRegistry")]
    async fn fetch_entries(&self) -> Result<Vec<BondingAddress>, ClientError> {
        let records = self
            .client
            .bonding_records(&self.contract, &self.function)
            .await?;
        Ok(records.into_iter().map(BondingAddress::from).collect())
    }
}
