//! Typed accessors for walking a value tree under a named schema.
//!
//! Every accessor takes the dotted path of the node it inspects so that a
//! shape mismatch names the offending field.

use crate::address;
use crate::error::{Error, Result};
use crate::fixed::{self, SCALAR_7};
use crate::xdr::{ScAddress, ScMapEntry, ScVal};

fn mismatch(path: &str, expected: &str, found: &ScVal) -> Error {
    Error::decode(path, format!("expected {}, found {}", expected, found.name()))
}

pub fn map<'a>(val: &'a ScVal, path: &str) -> Result<&'a [ScMapEntry]> {
    match val {
        ScVal::Map(Some(entries)) => Ok(entries.0.as_slice()),
        ScVal::Map(None) => Err(Error::decode(path, "map is absent")),
        other => Err(mismatch(path, "Map", other)),
    }
}

pub fn vec<'a>(val: &'a ScVal, path: &str) -> Result<&'a [ScVal]> {
    match val {
        ScVal::Vec(Some(items)) => Ok(items.0.as_slice()),
        ScVal::Vec(None) => Err(Error::decode(path, "vec is absent")),
        other => Err(mismatch(path, "Vec", other)),
    }
}

/// Entries of a symbol-keyed map as `(symbol, value)` pairs in map order.
pub fn symbol_entries<'a>(
    entries: &'a [ScMapEntry],
    path: &str,
) -> Result<Vec<(&'a str, &'a ScVal)>> {
    entries
        .iter()
        .map(|entry| match &entry.key {
            ScVal::Symbol(sym) => std::str::from_utf8(sym.0.as_slice())
                .map(|name| (name, &entry.val))
                .map_err(|_| Error::decode(path, "symbol is not utf-8")),
            other => Err(mismatch(path, "Symbol key", other)),
        })
        .collect()
}

/// Shorthand for [`map`] followed by [`symbol_entries`].
pub fn symbol_map<'a>(val: &'a ScVal, path: &str) -> Result<Vec<(&'a str, &'a ScVal)>> {
    symbol_entries(map(val, path)?, path)
}

pub fn i128(val: &ScVal, path: &str) -> Result<i128> {
    match val {
        ScVal::I128(parts) => Ok(fixed::i128_from_parts(parts)),
        other => Err(mismatch(path, "I128", other)),
    }
}

pub fn u64(val: &ScVal, path: &str) -> Result<u64> {
    match val {
        ScVal::U64(v) => Ok(*v),
        other => Err(mismatch(path, "U64", other)),
    }
}

pub fn address(val: &ScVal, path: &str) -> Result<ScAddress> {
    match val {
        ScVal::Address(address) => Ok(address.clone()),
        other => Err(mismatch(path, "Address", other)),
    }
}

/// An address node re-encoded as its strkey string.
pub fn strkey(val: &ScVal, path: &str) -> Result<String> {
    address(val, path).map(|address| address::to_strkey(&address))
}

/// A 7-decimal scaled amount as a float.
pub fn amount(val: &ScVal, path: &str) -> Result<f64> {
    i128(val, path).map(|raw| fixed::to_f64(raw, SCALAR_7))
}

/// Stores `value` into a not-yet-seen schema field.
pub fn set_once<T>(slot: &mut Option<T>, value: T, path: &str) -> Result<()> {
    if slot.is_some() {
        return Err(Error::decode(path, "duplicate field"));
    }
    *slot = Some(value);
    Ok(())
}

pub fn unexpected_field(path: &str, symbol: &str) -> Error {
    Error::decode(path, format!("unexpected field {:?}", symbol))
}
