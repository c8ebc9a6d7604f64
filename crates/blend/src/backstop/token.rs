use serde::Serialize;
use soroban::fixed::{self, SCALAR_7};
use soroban::{
    Error, LedgerReader, Result, ScAddress, ScVal, StorageKey, address, decode, resolve_entries,
    scval,
};
use tracing::debug;

use super::Missing;

/// Weight of USDC relative to the whole comet pool is fixed at 20%, so the
/// LP token is worth five times its USDC backing.
const USDC_WEIGHT_INVERSE: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackstopToken {
    pub id: String,
    pub blnd: f64,
    pub usdc: f64,
    pub shares: f64,
    pub blnd_per_lp_token: f64,
    pub usdc_per_lp_token: f64,
    pub lp_token_price: f64,
}

/// Raw balances found in the comet pool's record map.
#[derive(Debug, Default)]
struct RecordBalances {
    blnd: Option<i128>,
    usdc: Option<i128>,
}

fn decode_record_balance(val: &ScVal, path: &str) -> Result<Option<i128>> {
    let mut balance = None;
    for (symbol, val) in decode::symbol_map(val, path)? {
        match symbol {
            "balance" => {
                let field = format!("{}.balance", path);
                decode::set_once(&mut balance, decode::i128(val, &field)?, &field)?;
            }
            "bound" | "denorm" | "index" | "scalar" => {}
            other => return Err(decode::unexpected_field(path, other)),
        }
    }
    Ok(balance)
}

fn decode_records(val: &ScVal, blnd: &ScAddress, usdc: &ScAddress) -> Result<RecordBalances> {
    let mut balances = RecordBalances::default();
    for entry in decode::map(val, "AllRecordData")? {
        let token = decode::address(&entry.key, "AllRecordData")?;
        let (slot, path) = if token == *blnd {
            (&mut balances.blnd, "AllRecordData.BLND")
        } else if token == *usdc {
            (&mut balances.usdc, "AllRecordData.USDC")
        } else {
            return Err(Error::decode(
                "AllRecordData",
                format!("unexpected token {}", address::to_strkey(&token)),
            ));
        };
        if let Some(balance) = decode_record_balance(&entry.val, path)? {
            decode::set_once(slot, balance, path)?;
        }
    }
    Ok(balances)
}

/// Loads the comet pool's BLND and USDC holdings and total LP shares, and
/// derives per-share backing and the LP token price in USDC.
pub async fn load_token<R>(
    reader: &R,
    comet_id: &str,
    blnd_id: &str,
    usdc_id: &str,
) -> Result<BackstopToken>
where
    R: LedgerReader + ?Sized,
{
    let comet = address::contract(comet_id)?;
    let blnd_token = address::contract(blnd_id)?;
    let usdc_token = address::contract(usdc_id)?;

    let records_key =
        StorageKey::persistent(comet.clone(), scval::vec(vec![scval::symbol("AllRecordData")?])?)?;
    let shares_key =
        StorageKey::persistent(comet, scval::vec(vec![scval::symbol("TotalShares")?])?)?;

    let keys = [records_key.clone(), shares_key.clone()];
    let entries = resolve_entries(reader, &keys).await?;

    let records = entries
        .get(&records_key)
        .map(|entry| decode_records(&entry.val, &blnd_token, &usdc_token))
        .transpose()?;
    let shares = entries
        .get(&shares_key)
        .map(|entry| decode::i128(&entry.val, "TotalShares"))
        .transpose()?;

    let mut missing = Missing::default();
    let records = missing.check(records, "record data");
    let shares = missing.check(shares, "total shares");
    let (Some(records), Some(shares)) = (records, shares) else {
        return Err(missing.into_error());
    };

    let blnd = missing.check(records.blnd, "blnd balance");
    let usdc = missing.check(records.usdc, "usdc balance");
    let (Some(blnd), Some(usdc)) = (blnd, usdc) else {
        return Err(missing.into_error());
    };

    if shares == 0 {
        return Err(Error::Arithmetic("total shares is zero".to_string()));
    }

    let blnd = fixed::to_f64(blnd, SCALAR_7);
    let usdc = fixed::to_f64(usdc, SCALAR_7);
    let shares = fixed::to_f64(shares, SCALAR_7);
    let token = BackstopToken {
        id: comet_id.to_string(),
        blnd,
        usdc,
        shares,
        blnd_per_lp_token: blnd / shares,
        usdc_per_lp_token: usdc / shares,
        lp_token_price: usdc * USDC_WEIGHT_INVERSE / shares,
    };
    debug!("Loaded backstop token {}: price {}", comet_id, token.lp_token_price);
    Ok(token)
}
