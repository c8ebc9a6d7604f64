use std::hash::{Hash, Hasher};

use crate::error::{Error, Result};
use crate::scval;
use crate::xdr::{
    ContractDataDurability, LedgerKey, LedgerKeyContractData, Limits, ScAddress, ScVal, WriteXdr,
};

/// Bounds applied when decoding XDR received from the network.
pub const READ_LIMITS: Limits = Limits {
    depth: 128,
    len: 1 << 20,
};

/// A contract-data ledger key.
///
/// Equality and hashing go through a normalised encoding, so keys whose
/// maps hold the same entries in a different order are the same key.
#[derive(Debug, Clone)]
pub struct StorageKey {
    contract: ScAddress,
    key: ScVal,
    durability: ContractDataDurability,
    identity: Vec<u8>,
}

impl StorageKey {
    pub fn new(
        contract: ScAddress,
        key: ScVal,
        durability: ContractDataDurability,
    ) -> Result<Self> {
        let identity = LedgerKey::ContractData(LedgerKeyContractData {
            contract: contract.clone(),
            key: scval::normalized(&key)?,
            durability,
        })
        .to_xdr(Limits::none())
        .map_err(Error::encode)?;
        Ok(Self {
            contract,
            key,
            durability,
            identity,
        })
    }

    pub fn persistent(contract: ScAddress, key: ScVal) -> Result<Self> {
        Self::new(contract, key, ContractDataDurability::Persistent)
    }

    /// Accepts only contract-data keys.
    pub fn from_ledger_key(key: LedgerKey) -> Result<Self> {
        match key {
            LedgerKey::ContractData(data) => Self::new(data.contract, data.key, data.durability),
            other => Err(Error::decode(
                "key",
                format!("expected contract data key, found {}", other.name()),
            )),
        }
    }

    pub fn contract(&self) -> &ScAddress {
        &self.contract
    }

    pub fn key(&self) -> &ScVal {
        &self.key
    }

    pub fn durability(&self) -> ContractDataDurability {
        self.durability
    }

    pub fn ledger_key(&self) -> LedgerKey {
        LedgerKey::ContractData(LedgerKeyContractData {
            contract: self.contract.clone(),
            key: self.key.clone(),
            durability: self.durability,
        })
    }

    /// The key as sent in a `getLedgerEntries` request.
    pub fn to_xdr_base64(&self) -> Result<String> {
        self.ledger_key().to_xdr_base64(Limits::none()).map_err(Error::encode)
    }
}

impl PartialEq for StorageKey {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Eq for StorageKey {}

impl Hash for StorageKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
    }
}

/// A resolved entry: the requested key, its value and ledger metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub key: StorageKey,
    pub val: ScVal,
    pub last_modified_ledger: u32,
    pub live_until_ledger: Option<u32>,
}
