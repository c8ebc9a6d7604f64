//! Strkey address strings (`G...`, `C...`) and the ledger addresses they name.

use stellar_strkey::{Contract, Strkey, ed25519};

use crate::error::{Error, Result};
use crate::xdr::{AccountId, Hash, PublicKey, ScAddress, Uint256};

fn invalid(address: &str, kind: &str) -> Error {
    Error::AddressDecode(format!("{:?} is not a valid {} address", address, kind))
}

fn account_address(key: [u8; 32]) -> ScAddress {
    ScAddress::Account(AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(key))))
}

/// Parses a `C...` contract id.
pub fn contract(address: &str) -> Result<ScAddress> {
    let contract = Contract::from_string(address).map_err(|_| invalid(address, "contract"))?;
    Ok(ScAddress::Contract(Hash(contract.0)))
}

/// Parses a `G...` account id.
pub fn account(address: &str) -> Result<ScAddress> {
    let key = ed25519::PublicKey::from_string(address).map_err(|_| invalid(address, "account"))?;
    Ok(account_address(key.0))
}

/// Parses either an account or a contract id.
pub fn parse(address: &str) -> Result<ScAddress> {
    match Strkey::from_string(address) {
        Ok(Strkey::PublicKeyEd25519(key)) => Ok(account_address(key.0)),
        Ok(Strkey::Contract(contract)) => Ok(ScAddress::Contract(Hash(contract.0))),
        _ => Err(invalid(address, "account or contract")),
    }
}

pub fn to_strkey(address: &ScAddress) -> String {
    match address {
        ScAddress::Account(AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(key)))) => {
            ed25519::PublicKey(*key).to_string()
        }
        ScAddress::Contract(Hash(hash)) => Contract(*hash).to_string(),
    }
}
