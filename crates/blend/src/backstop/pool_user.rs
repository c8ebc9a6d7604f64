use chrono::{DateTime, Utc};
use serde::Serialize;
use soroban::fixed::{self, SCALAR_7};
use soroban::{
    Error, LedgerReader, Result, ScVal, StorageKey, address, decode, resolve_entries, scval,
};
use tracing::debug;

use super::Missing;

/// A queued withdrawal and the time it unlocks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Q4W {
    pub amount: f64,
    pub expiration: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserBalance {
    pub shares: f64,
    /// Queue order as stored by the contract.
    pub q4w: Vec<Q4W>,
    /// Queued amounts whose expiration is at or before the query time.
    pub unlocked_q4w: f64,
    pub total_q4w: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserEmissions {
    pub index: i64,
    pub accrued: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackstopPoolUser {
    pub balance: UserBalance,
    /// `None` until the user's emissions have first been recorded.
    pub emissions: Option<UserEmissions>,
}

#[derive(Debug, Default)]
struct Q4WFields {
    amount: Option<i128>,
    expiration: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct UserBalanceFields {
    shares: Option<i128>,
    q4w: Option<Vec<Q4WFields>>,
}

#[derive(Debug, Default)]
struct EmissionsFields {
    index: Option<i64>,
    accrued: Option<i128>,
}

fn decode_expiration(val: &ScVal, path: &str) -> Result<DateTime<Utc>> {
    let secs = decode::u64(val, path)?;
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .ok_or_else(|| Error::decode(path, format!("timestamp {} out of range", secs)))
}

fn decode_q4w(val: &ScVal, path: &str) -> Result<Q4WFields> {
    let mut fields = Q4WFields::default();
    for (symbol, val) in decode::symbol_map(val, path)? {
        let field = format!("{}.{}", path, symbol);
        match symbol {
            "amount" => {
                decode::set_once(&mut fields.amount, decode::i128(val, &field)?, &field)?;
            }
            "exp" => {
                let expiration = decode_expiration(val, &field)?;
                decode::set_once(&mut fields.expiration, expiration, &field)?;
            }
            other => return Err(decode::unexpected_field(path, other)),
        }
    }
    Ok(fields)
}

fn decode_user_balance(val: &ScVal) -> Result<UserBalanceFields> {
    let mut fields = UserBalanceFields::default();
    for (symbol, val) in decode::symbol_map(val, "UserBalance")? {
        match symbol {
            "shares" => decode::set_once(
                &mut fields.shares,
                decode::i128(val, "UserBalance.shares")?,
                "UserBalance.shares",
            )?,
            "q4w" => {
                let queue = decode::vec(val, "UserBalance.q4w")?
                    .iter()
                    .enumerate()
                    .map(|(i, item)| decode_q4w(item, &format!("UserBalance.q4w[{}]", i)))
                    .collect::<Result<Vec<_>>>()?;
                decode::set_once(&mut fields.q4w, queue, "UserBalance.q4w")?;
            }
            other => return Err(decode::unexpected_field("UserBalance", other)),
        }
    }
    Ok(fields)
}

fn decode_emissions(val: &ScVal) -> Result<EmissionsFields> {
    let mut fields = EmissionsFields::default();
    for (symbol, val) in decode::symbol_map(val, "UEmisData")? {
        match symbol {
            "index" => {
                let index = fixed::to_i64(decode::i128(val, "UEmisData.index")?)?;
                decode::set_once(&mut fields.index, index, "UEmisData.index")?;
            }
            "accrued" => decode::set_once(
                &mut fields.accrued,
                decode::i128(val, "UEmisData.accrued")?,
                "UEmisData.accrued",
            )?,
            other => return Err(decode::unexpected_field("UEmisData", other)),
        }
    }
    Ok(fields)
}

/// Sums queued amounts as `(unlocked, total)`; an item is unlocked once its
/// expiration is at or before `now`.
fn sum_q4w(queue: &[(i128, DateTime<Utc>)], now: DateTime<Utc>) -> Result<(i128, i128)> {
    let overflow = || Error::Arithmetic("queued withdrawal total overflows i128".to_string());
    let mut unlocked: i128 = 0;
    let mut total: i128 = 0;
    for (amount, expiration) in queue {
        total = total.checked_add(*amount).ok_or_else(overflow)?;
        if *expiration <= now {
            unlocked = unlocked.checked_add(*amount).ok_or_else(overflow)?;
        }
    }
    Ok((unlocked, total))
}

/// Loads a user's backstop position in one pool: shares, the withdrawal
/// queue split at `now`, and accrued emissions when any are recorded.
///
/// `user_id` may be an account (`G...`) or a contract (`C...`).
pub async fn load_pool_user<R>(
    reader: &R,
    backstop_id: &str,
    pool_id: &str,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<BackstopPoolUser>
where
    R: LedgerReader + ?Sized,
{
    let backstop = address::contract(backstop_id)?;
    let pool = address::contract(pool_id)?;
    let user = address::parse(user_id)?;

    let pool_user = scval::symbol_map(vec![
        ("pool", ScVal::Address(pool)),
        ("user", ScVal::Address(user)),
    ])?;
    let balance_key = StorageKey::persistent(
        backstop.clone(),
        scval::vec(vec![scval::symbol("UserBalance")?, pool_user.clone()])?,
    )?;
    let emissions_key = StorageKey::persistent(
        backstop,
        scval::vec(vec![scval::symbol("UEmisData")?, pool_user])?,
    )?;

    let keys = [balance_key.clone(), emissions_key.clone()];
    let entries = resolve_entries(reader, &keys).await?;

    let balance = entries
        .get(&balance_key)
        .map(|entry| decode_user_balance(&entry.val))
        .transpose()?;
    let emissions = entries
        .get(&emissions_key)
        .map(|entry| decode_emissions(&entry.val))
        .transpose()?;

    let mut missing = Missing::default();
    let Some(balance) = missing.check(balance, "user balance") else {
        return Err(missing.into_error());
    };

    let shares = missing.check(balance.shares, "user balance shares");
    let queue = missing.check(balance.q4w, "user balance q4w").unwrap_or_default();
    let emissions = emissions.and_then(|fields| {
        let index = missing.check(fields.index, "user emissions index");
        let accrued = missing.check(fields.accrued, "user emissions accrued");
        index.zip(accrued)
    });

    let mut items = Vec::with_capacity(queue.len());
    for (i, item) in queue.into_iter().enumerate() {
        let amount = missing.check(item.amount, &format!("q4w[{}] amount", i));
        let expiration = missing.check(item.expiration, &format!("q4w[{}] exp", i));
        if let (Some(amount), Some(expiration)) = (amount, expiration) {
            items.push((amount, expiration));
        }
    }

    let Some(shares) = shares else {
        return Err(missing.into_error());
    };
    if !missing.is_empty() {
        return Err(missing.into_error());
    }

    let (unlocked, total) = sum_q4w(&items, now)?;
    let user = BackstopPoolUser {
        balance: UserBalance {
            shares: fixed::to_f64(shares, SCALAR_7),
            q4w: items
                .iter()
                .map(|(amount, expiration)| Q4W {
                    amount: fixed::to_f64(*amount, SCALAR_7),
                    expiration: *expiration,
                })
                .collect(),
            unlocked_q4w: fixed::to_f64(unlocked, SCALAR_7),
            total_q4w: fixed::to_f64(total, SCALAR_7),
        },
        emissions: emissions.map(|(index, accrued)| UserEmissions {
            index,
            accrued: fixed::to_f64(accrued, SCALAR_7),
        }),
    };
    debug!(
        "Loaded backstop user {} in pool {}: {} queued withdrawals",
        user_id,
        pool_id,
        user.balance.q4w.len()
    );
    Ok(user)
}
