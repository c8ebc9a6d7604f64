//! Fixed-point conversion for 128-bit scaled integers.
//!
//! Decimal values are produced as `f64`. Above roughly 10^9 whole units a
//! 7-decimal quantity carries more significant digits than an `f64` holds,
//! so the low decimals round. That loss is accepted for display and ratio
//! purposes; use [`i128_from_parts`] when exact arithmetic is needed.

use crate::error::{Error, Result};
use crate::xdr::Int128Parts;

/// Decimal places used by Stellar asset amounts.
pub const SCALAR_7: u32 = 7;

/// Recombines an `Int128Parts` pair, sign-extending from the high half.
pub fn i128_from_parts(parts: &Int128Parts) -> i128 {
    ((parts.hi as i128) << 64) | parts.lo as i128
}

pub fn i128_to_parts(value: i128) -> Int128Parts {
    Int128Parts {
        hi: (value >> 64) as i64,
        lo: value as u64,
    }
}

/// `raw / 10^decimals` as a float.
pub fn to_f64(raw: i128, decimals: u32) -> f64 {
    raw as f64 / 10f64.powi(decimals as i32)
}

/// Exact projection to `i64`; values outside its range are an error.
pub fn to_i64(raw: i128) -> Result<i64> {
    i64::try_from(raw).map_err(|_| Error::Arithmetic(format!("{} does not fit in i64", raw)))
}
