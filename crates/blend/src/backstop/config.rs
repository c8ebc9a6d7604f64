use serde::Serialize;
use soroban::xdr::ScMapEntry;
use soroban::{
    Error, LedgerReader, Result, ScVal, StorageKey, address, decode, resolve_entries, scval,
};
use tracing::debug;

use super::Missing;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackstopConfig {
    pub public_emitter: String,
    pub blnd_token: String,
    pub usdc_token: String,
    pub backstop_token: String,
    pub pool_factory: String,
    /// Pools eligible for emissions, in contract order.
    pub reward_zone: Vec<String>,
}

/// Addresses found in the backstop's instance storage.
#[derive(Debug, Default)]
struct InstanceFields {
    blnd_token: Option<String>,
    backstop_token: Option<String>,
    usdc_token: Option<String>,
    pool_factory: Option<String>,
    emitter: Option<String>,
}

fn decode_instance(val: &ScVal) -> Result<InstanceFields> {
    let storage: &[ScMapEntry] = match val {
        ScVal::ContractInstance(instance) => {
            instance.storage.as_ref().map(|map| map.0.as_slice()).unwrap_or_default()
        }
        other => {
            return Err(Error::decode(
                "instance",
                format!("expected ContractInstance, found {}", other.name()),
            ));
        }
    };

    let mut fields = InstanceFields::default();
    for (symbol, val) in decode::symbol_entries(storage, "instance")? {
        let path = format!("instance.{}", symbol);
        let slot = match symbol {
            "BLNDTkn" => &mut fields.blnd_token,
            "BToken" => &mut fields.backstop_token,
            "USDCTkn" => &mut fields.usdc_token,
            "PoolFact" => &mut fields.pool_factory,
            "Emitter" => &mut fields.emitter,
            "IsInit" => continue,
            other => return Err(decode::unexpected_field("instance", other)),
        };
        decode::set_once(slot, decode::strkey(val, &path)?, &path)?;
    }
    Ok(fields)
}

fn decode_reward_zone(val: &ScVal) -> Result<Vec<String>> {
    decode::vec(val, "RZ")?
        .iter()
        .enumerate()
        .map(|(i, pool)| decode::strkey(pool, &format!("RZ[{}]", i)))
        .collect()
}

/// Loads the backstop's token addresses, emitter, pool factory and reward
/// zone.
pub async fn load_config<R>(reader: &R, backstop_id: &str) -> Result<BackstopConfig>
where
    R: LedgerReader + ?Sized,
{
    let backstop = address::contract(backstop_id)?;
    let instance_key = StorageKey::persistent(backstop.clone(), ScVal::LedgerKeyContractInstance)?;
    let reward_zone_key = StorageKey::persistent(backstop, scval::symbol("RZ")?)?;

    let keys = [instance_key.clone(), reward_zone_key.clone()];
    let entries = resolve_entries(reader, &keys).await?;

    let instance = entries
        .get(&instance_key)
        .map(|entry| decode_instance(&entry.val))
        .transpose()?;
    let reward_zone = entries
        .get(&reward_zone_key)
        .map(|entry| decode_reward_zone(&entry.val))
        .transpose()?;

    let mut missing = Missing::default();
    let instance = missing.check(instance, "contract data");
    let reward_zone = missing.check(reward_zone, "reward zone");
    let (Some(instance), Some(reward_zone)) = (instance, reward_zone) else {
        return Err(missing.into_error());
    };

    let emitter = missing.check(instance.emitter, "emitter");
    let blnd_token = missing.check(instance.blnd_token, "blnd token");
    let usdc_token = missing.check(instance.usdc_token, "usdc token");
    let backstop_token = missing.check(instance.backstop_token, "backstop token");
    let pool_factory = missing.check(instance.pool_factory, "pool factory");
    let (
        Some(public_emitter),
        Some(blnd_token),
        Some(usdc_token),
        Some(backstop_token),
        Some(pool_factory),
    ) = (emitter, blnd_token, usdc_token, backstop_token, pool_factory)
    else {
        return Err(missing.into_error());
    };

    let config = BackstopConfig {
        public_emitter,
        blnd_token,
        usdc_token,
        backstop_token,
        pool_factory,
        reward_zone,
    };
    debug!(
        "Loaded backstop config for {}: {} reward zone pools",
        backstop_id,
        config.reward_zone.len()
    );
    Ok(config)
}
