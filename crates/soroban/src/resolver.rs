use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::ledger::{LedgerEntry, READ_LIMITS, StorageKey};
use crate::rpc::LedgerReader;
use crate::xdr::{ContractDataEntry, LedgerEntryData, LedgerKey, ReadXdr};

/// Fetches `keys` in one batched read.
///
/// Returned entries are matched to the requested keys by structural key
/// identity, not by position. Keys with no ledger entry are absent from the
/// result.
pub async fn resolve_entries<R: LedgerReader + ?Sized>(
    reader: &R,
    keys: &[StorageKey],
) -> Result<HashMap<StorageKey, LedgerEntry>> {
    let mut resolved = HashMap::with_capacity(keys.len());
    if keys.is_empty() {
        return Ok(resolved);
    }

    let requested: HashSet<&StorageKey> = keys.iter().collect();
    let encoded = keys
        .iter()
        .map(StorageKey::to_xdr_base64)
        .collect::<Result<Vec<_>>>()?;
    debug!("Requesting {} ledger entries", encoded.len());
    let raw_entries = reader.get_ledger_entries(&encoded).await?;

    for (index, raw) in raw_entries.iter().enumerate() {
        let returned_key = LedgerKey::from_xdr_base64(&raw.key, READ_LIMITS)
            .map_err(|e| Error::wire(index, "key", e))
            .and_then(|key| StorageKey::from_ledger_key(key).map_err(|e| e.at_index(index)))?;

        let Some(&key) = requested.get(&returned_key) else {
            warn!("Skipping unrequested ledger entry at response index {}", index);
            continue;
        };

        let data = LedgerEntryData::from_xdr_base64(&raw.xdr, READ_LIMITS)
            .map_err(|e| Error::wire(index, "xdr", e))?;
        let (data_key, val) = match data {
            LedgerEntryData::ContractData(ContractDataEntry {
                contract,
                key,
                durability,
                val,
                ..
            }) => (StorageKey::new(contract, key, durability)?, val),
            other => {
                return Err(entry_error(
                    index,
                    format!("expected contract data entry, found {}", other.name()),
                ));
            }
        };
        if data_key != returned_key {
            return Err(entry_error(index, "entry data does not belong to its key"));
        }

        resolved.insert(
            key.clone(),
            LedgerEntry {
                key: key.clone(),
                val,
                last_modified_ledger: raw.last_modified_ledger,
                live_until_ledger: raw.live_until_ledger,
            },
        );
    }

    debug!("Resolved {} of {} ledger entries", resolved.len(), keys.len());
    Ok(resolved)
}

fn entry_error(index: usize, reason: impl Into<String>) -> Error {
    Error::EntryDecode {
        index: Some(index),
        path: "xdr".to_string(),
        reason: reason.into(),
    }
}
