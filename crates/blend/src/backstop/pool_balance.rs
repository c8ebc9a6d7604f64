use serde::Serialize;
use soroban::{LedgerReader, Result, ScVal, StorageKey, address, decode, resolve_entries, scval};
use tracing::debug;

use super::Missing;

/// Shares, backing tokens and queued withdrawals held by the backstop for
/// one pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackstopPoolBalance {
    pub shares: f64,
    pub tokens: f64,
    pub q4w: f64,
}

#[derive(Debug, Default)]
struct PoolBalanceFields {
    shares: Option<f64>,
    tokens: Option<f64>,
    q4w: Option<f64>,
}

fn decode_pool_balance(val: &ScVal) -> Result<PoolBalanceFields> {
    let mut fields = PoolBalanceFields::default();
    for (symbol, val) in decode::symbol_map(val, "PoolBalance")? {
        let slot = match symbol {
            "shares" => &mut fields.shares,
            "tokens" => &mut fields.tokens,
            "q4w" => &mut fields.q4w,
            other => return Err(decode::unexpected_field("PoolBalance", other)),
        };
        let path = format!("PoolBalance.{}", symbol);
        decode::set_once(slot, decode::amount(val, &path)?, &path)?;
    }
    Ok(fields)
}

pub async fn load_pool_balance<R>(
    reader: &R,
    backstop_id: &str,
    pool_id: &str,
) -> Result<BackstopPoolBalance>
where
    R: LedgerReader + ?Sized,
{
    let backstop = address::contract(backstop_id)?;
    let pool = address::contract(pool_id)?;
    let key = StorageKey::persistent(
        backstop,
        scval::vec(vec![scval::symbol("PoolBalance")?, ScVal::Address(pool)])?,
    )?;

    let entries = resolve_entries(reader, std::slice::from_ref(&key)).await?;

    let fields = entries
        .get(&key)
        .map(|entry| decode_pool_balance(&entry.val))
        .transpose()?;

    let mut missing = Missing::default();
    let Some(fields) = missing.check(fields, "pool balance") else {
        return Err(missing.into_error());
    };
    let shares = missing.check(fields.shares, "pool balance shares");
    let tokens = missing.check(fields.tokens, "pool balance tokens");
    let q4w = missing.check(fields.q4w, "pool balance q4w");
    let (Some(shares), Some(tokens), Some(q4w)) = (shares, tokens, q4w) else {
        return Err(missing.into_error());
    };

    debug!("Loaded backstop balance for pool {}", pool_id);
    Ok(BackstopPoolBalance { shares, tokens, q4w })
}
