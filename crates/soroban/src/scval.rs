//! Builders for the `ScVal` keys we send, and the normalised form used for
//! key identity.

use crate::error::{Error, Result};
use crate::fixed;
use crate::xdr::{
    Limits, ScContractInstance, ScMap, ScMapEntry, ScSymbol, ScVal, ScVec, StringM, VecM,
    WriteXdr,
};

const SYMBOL_MAX_LEN: usize = 32;

/// A contract symbol: up to 32 characters from `[A-Za-z0-9_]`.
pub fn symbol(s: &str) -> Result<ScVal> {
    let valid =
        s.len() <= SYMBOL_MAX_LEN && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
    if !valid {
        return Err(Error::KeyEncode(format!("invalid symbol {:?}", s)));
    }
    let bytes = StringM::try_from(s.as_bytes().to_vec()).map_err(Error::encode)?;
    Ok(ScVal::Symbol(ScSymbol(bytes)))
}

pub fn vec(items: Vec<ScVal>) -> Result<ScVal> {
    let items = VecM::try_from(items).map_err(Error::encode)?;
    Ok(ScVal::Vec(Some(ScVec(items))))
}

pub fn map(entries: Vec<(ScVal, ScVal)>) -> Result<ScVal> {
    let entries: Vec<ScMapEntry> = entries
        .into_iter()
        .map(|(key, val)| ScMapEntry { key, val })
        .collect();
    let entries = VecM::try_from(entries).map_err(Error::encode)?;
    Ok(ScVal::Map(Some(ScMap(entries))))
}

/// Builds a symbol-keyed map with entries in the host's canonical
/// (ascending symbol) order.
pub fn symbol_map(mut entries: Vec<(&str, ScVal)>) -> Result<ScVal> {
    entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
    if entries.windows(2).any(|w| w[0].0 == w[1].0) {
        return Err(Error::KeyEncode("duplicate map key".to_string()));
    }
    let entries = entries
        .into_iter()
        .map(|(key, val)| symbol(key).map(|key| (key, val)))
        .collect::<Result<Vec<_>>>()?;
    map(entries)
}

pub fn i128(value: i128) -> ScVal {
    ScVal::I128(fixed::i128_to_parts(value))
}

/// Copy of `val` with every map's entries sorted by encoded key, so values
/// differing only in map order compare equal.
pub fn normalized(val: &ScVal) -> Result<ScVal> {
    Ok(match val {
        ScVal::Vec(Some(items)) => {
            let items = items.0.iter().map(normalized).collect::<Result<Vec<_>>>()?;
            vec(items)?
        }
        ScVal::Map(Some(entries)) => ScVal::Map(Some(normalize_map(entries)?)),
        ScVal::ContractInstance(instance) => ScVal::ContractInstance(ScContractInstance {
            executable: instance.executable.clone(),
            storage: instance.storage.as_ref().map(normalize_map).transpose()?,
        }),
        other => other.clone(),
    })
}

fn normalize_map(entries: &ScMap) -> Result<ScMap> {
    let mut sorted = Vec::with_capacity(entries.0.len());
    for entry in entries.0.iter() {
        let key = normalized(&entry.key)?;
        let encoded = key.to_xdr(Limits::none()).map_err(Error::encode)?;
        let val = normalized(&entry.val)?;
        sorted.push((encoded, ScMapEntry { key, val }));
    }
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    let entries: Vec<ScMapEntry> = sorted.into_iter().map(|(_, entry)| entry).collect();
    Ok(ScMap(VecM::try_from(entries).map_err(Error::encode)?))
}
