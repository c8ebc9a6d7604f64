use std::collections::HashMap;

use async_trait::async_trait;
use blend::BlendClient;
use chrono::{DateTime, TimeZone, Utc};
use soroban::ledger::READ_LIMITS;
use soroban::xdr::{
    ContractDataEntry, ContractExecutable, ExtensionPoint, Hash, LedgerEntryData, LedgerKey,
    Limits, ReadXdr, ScContractInstance, ScMap, ScMapEntry, VecM, WriteXdr,
};
use soroban::{
    Error, LedgerReader, RawLedgerEntry, ScAddress, ScVal, StorageKey, TransportError, scval,
};

const BACKSTOP: &str = "CAQQR5SWBXKIGZKPBZDH3KM5GQ5GUTPKB7JAFCINLZBC5WXPJKRG3IM7";
const POOL: &str = "CAJJZSGMMM3PD7N33TAPHGBUGTB43OC73HVIK2L2G6BNGGGYOSSYBXBD";
const USER: &str = "GDW72XXDCZ2T2YZ5I5EEA55RYGUW3RF7S4VAMFUKMUHAHC3AOWERGUCT";
const BLND: &str = "CAAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQC526";
const USDC: &str = "CABAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAFNSZ";
const COMET: &str = "CABQGAYDAMBQGAYDAMBQGAYDAMBQGAYDAMBQGAYDAMBQGAYDAMBQGCK3";
const FACTORY: &str = "CACAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAINCW";

/// In-memory ledger answering in reverse request order.
#[derive(Default)]
struct MemoryLedger {
    entries: HashMap<StorageKey, ScVal>,
}

impl MemoryLedger {
    fn insert(&mut self, contract: &str, key: ScVal, val: ScVal) {
        let contract = soroban::address::contract(contract).unwrap();
        self.entries.insert(StorageKey::persistent(contract, key).unwrap(), val);
    }
}

#[async_trait]
impl LedgerReader for MemoryLedger {
    async fn get_ledger_entries(
        &self,
        keys: &[String],
    ) -> Result<Vec<RawLedgerEntry>, TransportError> {
        let mut found = Vec::new();
        for encoded in keys.iter().rev() {
            let key = LedgerKey::from_xdr_base64(encoded, READ_LIMITS)
                .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
            let key = StorageKey::from_ledger_key(key)
                .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
            if let Some((stored, val)) = self.entries.get_key_value(&key) {
                let data = LedgerEntryData::ContractData(ContractDataEntry {
                    ext: ExtensionPoint::V0,
                    contract: stored.contract().clone(),
                    key: stored.key().clone(),
                    durability: stored.durability(),
                    val: val.clone(),
                });
                found.push(RawLedgerEntry {
                    key: stored.to_xdr_base64().unwrap(),
                    xdr: data.to_xdr_base64(Limits::none()).unwrap(),
                    last_modified_ledger: 1,
                    live_until_ledger: None,
                });
            }
        }
        Ok(found)
    }
}

fn address(id: &str) -> ScVal {
    ScVal::Address(soroban::address::parse(id).unwrap())
}

fn amount(raw: i128) -> ScVal {
    scval::i128(raw)
}

fn symbol(s: &str) -> ScVal {
    scval::symbol(s).unwrap()
}

fn vec(items: Vec<ScVal>) -> ScVal {
    scval::vec(items).unwrap()
}

fn map(entries: Vec<(ScVal, ScVal)>) -> ScVal {
    scval::map(entries).unwrap()
}

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn emitter() -> String {
    soroban::address::to_strkey(&ScAddress::Contract(Hash([5; 32])))
}

fn config_ledger(without: &str) -> MemoryLedger {
    let storage: Vec<ScMapEntry> = [
        ("BLNDTkn", address(BLND)),
        ("BToken", address(COMET)),
        ("Emitter", address(&emitter())),
        ("IsInit", ScVal::Bool(true)),
        ("PoolFact", address(FACTORY)),
        ("USDCTkn", address(USDC)),
    ]
    .into_iter()
    .filter(|(name, _)| *name != without)
    .map(|(name, val)| ScMapEntry {
        key: symbol(name),
        val,
    })
    .collect();

    let mut ledger = MemoryLedger::default();
    ledger.insert(
        BACKSTOP,
        ScVal::LedgerKeyContractInstance,
        ScVal::ContractInstance(ScContractInstance {
            executable: ContractExecutable::Wasm(Hash([0xab; 32])),
            storage: Some(ScMap(VecM::try_from(storage).unwrap())),
        }),
    );
    ledger.insert(
        BACKSTOP,
        symbol("RZ"),
        vec(vec![address(POOL), address(FACTORY), address(BLND)]),
    );
    ledger
}

#[tokio::test]
async fn test_config() {
    let client = BlendClient::with_reader(config_ledger(""));

    let config = client.backstop_config(BACKSTOP).await.unwrap();

    assert_eq!(config.public_emitter, emitter());
    assert_eq!(config.blnd_token, BLND);
    assert_eq!(config.usdc_token, USDC);
    assert_eq!(config.backstop_token, COMET);
    assert_eq!(config.pool_factory, FACTORY);
    assert_eq!(config.reward_zone, vec![POOL, FACTORY, BLND]);
}

#[tokio::test]
async fn test_config_without_init_flag_is_unchanged() {
    let with_flag = BlendClient::with_reader(config_ledger(""));
    let without_flag = BlendClient::with_reader(config_ledger("IsInit"));

    assert_eq!(
        with_flag.backstop_config(BACKSTOP).await.unwrap(),
        without_flag.backstop_config(BACKSTOP).await.unwrap()
    );
}

#[tokio::test]
async fn test_config_missing_emitter() {
    let client = BlendClient::with_reader(config_ledger("Emitter"));

    match client.backstop_config(BACKSTOP).await.unwrap_err() {
        Error::MissingData(pieces) => assert_eq!(pieces, vec!["emitter"]),
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_config_missing_reward_zone() {
    let mut ledger = config_ledger("");
    ledger
        .entries
        .retain(|key, _| *key.key() == ScVal::LedgerKeyContractInstance);
    let client = BlendClient::with_reader(ledger);

    match client.backstop_config(BACKSTOP).await.unwrap_err() {
        Error::MissingData(pieces) => assert_eq!(pieces, vec!["reward zone"]),
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_config_rejects_account_backstop() {
    let client = BlendClient::with_reader(config_ledger(""));

    let err = client.backstop_config(USER).await.unwrap_err();

    assert!(matches!(err, Error::AddressDecode(_)));
}

fn comet_record(balance: i128) -> ScVal {
    scval::symbol_map(vec![
        ("balance", amount(balance)),
        ("bound", ScVal::Bool(true)),
        ("denorm", amount(8_000_000)),
        ("index", ScVal::U32(0)),
        ("scalar", amount(10_000_000_000)),
    ])
    .unwrap()
}

fn token_ledger(shares: Option<i128>) -> MemoryLedger {
    let mut ledger = MemoryLedger::default();
    ledger.insert(
        COMET,
        vec(vec![symbol("AllRecordData")]),
        map(vec![
            (address(BLND), comet_record(2_000_000_000)),
            (address(USDC), comet_record(1_000_000_000)),
        ]),
    );
    if let Some(shares) = shares {
        ledger.insert(COMET, vec(vec![symbol("TotalShares")]), amount(shares));
    }
    ledger
}

#[tokio::test]
async fn test_token() {
    let client = BlendClient::with_reader(token_ledger(Some(500_000_000)));

    let token = client.backstop_token(COMET, BLND, USDC).await.unwrap();

    assert_eq!(token.id, COMET);
    assert_eq!(token.blnd, 200.0);
    assert_eq!(token.usdc, 100.0);
    assert_eq!(token.shares, 50.0);
    assert_eq!(token.blnd_per_lp_token, 4.0);
    assert_eq!(token.usdc_per_lp_token, 2.0);
    assert_eq!(token.lp_token_price, 10.0);
}

#[tokio::test]
async fn test_token_zero_shares() {
    let client = BlendClient::with_reader(token_ledger(Some(0)));

    let err = client.backstop_token(COMET, BLND, USDC).await.unwrap_err();

    assert!(matches!(err, Error::Arithmetic(_)));
}

#[tokio::test]
async fn test_token_missing_total_shares() {
    let client = BlendClient::with_reader(token_ledger(None));

    match client.backstop_token(COMET, BLND, USDC).await.unwrap_err() {
        Error::MissingData(pieces) => assert_eq!(pieces, vec!["total shares"]),
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_token_swapped_assets() {
    let client = BlendClient::with_reader(token_ledger(Some(500_000_000)));

    let token = client.backstop_token(COMET, USDC, BLND).await.unwrap();

    assert_eq!(token.blnd, 100.0);
    assert_eq!(token.usdc, 200.0);
}

#[tokio::test]
async fn test_pool_balance() {
    let mut ledger = MemoryLedger::default();
    ledger.insert(
        BACKSTOP,
        vec(vec![symbol("PoolBalance"), address(POOL)]),
        scval::symbol_map(vec![
            ("q4w", amount(25_000_000)),
            ("shares", amount(1_000_000_000)),
            ("tokens", amount(1_500_000_000)),
        ])
        .unwrap(),
    );
    let client = BlendClient::with_reader(ledger);

    let balance = client.backstop_pool_balance(BACKSTOP, POOL).await.unwrap();

    assert_eq!(balance.shares, 100.0);
    assert_eq!(balance.tokens, 150.0);
    assert_eq!(balance.q4w, 2.5);
}

#[tokio::test]
async fn test_pool_balance_missing_entry() {
    let client = BlendClient::with_reader(MemoryLedger::default());

    match client.backstop_pool_balance(BACKSTOP, POOL).await.unwrap_err() {
        Error::MissingData(pieces) => assert_eq!(pieces, vec!["pool balance"]),
        other => panic!("unexpected error {:?}", other),
    }
}

const NOW: i64 = 1_700_000_000;

/// User entries keyed with `{user, pool}` map order, unlike the canonical
/// order a query builds.
fn pool_user_ledger(with_emissions: bool) -> MemoryLedger {
    let pool_user = map(vec![
        (symbol("user"), address(USER)),
        (symbol("pool"), address(POOL)),
    ]);
    let q4w = |raw: i128, exp: i64| {
        scval::symbol_map(vec![("amount", amount(raw)), ("exp", ScVal::U64(exp as u64))]).unwrap()
    };

    let mut ledger = MemoryLedger::default();
    ledger.insert(
        BACKSTOP,
        vec(vec![symbol("UserBalance"), pool_user.clone()]),
        scval::symbol_map(vec![
            (
                "q4w",
                vec(vec![
                    q4w(10_000_000, NOW - 1),
                    q4w(20_000_000, NOW),
                    q4w(40_000_000, NOW + 1),
                ]),
            ),
            ("shares", amount(123_000_000)),
        ])
        .unwrap(),
    );
    if with_emissions {
        ledger.insert(
            BACKSTOP,
            vec(vec![symbol("UEmisData"), pool_user]),
            scval::symbol_map(vec![("accrued", amount(5_000_000)), ("index", amount(987_654))])
                .unwrap(),
        );
    }
    ledger
}

#[tokio::test]
async fn test_pool_user() {
    let client = BlendClient::with_reader(pool_user_ledger(true));

    let user = client
        .backstop_pool_user(BACKSTOP, POOL, USER, at(NOW))
        .await
        .unwrap();

    assert_eq!(user.balance.shares, 12.3);
    let queue: Vec<_> = user
        .balance
        .q4w
        .iter()
        .map(|q| (q.amount, q.expiration))
        .collect();
    assert_eq!(
        queue,
        vec![(1.0, at(NOW - 1)), (2.0, at(NOW)), (4.0, at(NOW + 1))]
    );
    assert_eq!(user.balance.unlocked_q4w, 3.0);
    assert_eq!(user.balance.total_q4w, 7.0);
    let emissions = user.emissions.unwrap();
    assert_eq!(emissions.index, 987_654);
    assert_eq!(emissions.accrued, 0.5);
}

#[tokio::test]
async fn test_pool_user_split_moves_with_now() {
    let client = BlendClient::with_reader(pool_user_ledger(true));

    let early = client
        .backstop_pool_user(BACKSTOP, POOL, USER, at(NOW - 1))
        .await
        .unwrap();
    let late = client
        .backstop_pool_user(BACKSTOP, POOL, USER, at(NOW + 1))
        .await
        .unwrap();

    assert_eq!(early.balance.unlocked_q4w, 1.0);
    assert_eq!(late.balance.unlocked_q4w, 7.0);
    assert_eq!(early.balance.total_q4w, late.balance.total_q4w);
}

#[tokio::test]
async fn test_pool_user_without_emissions_entry() {
    let client = BlendClient::with_reader(pool_user_ledger(false));

    let user = client
        .backstop_pool_user(BACKSTOP, POOL, USER, at(NOW))
        .await
        .unwrap();

    assert_eq!(user.emissions, None);
    assert_eq!(user.balance.shares, 12.3);
    assert_eq!(user.balance.unlocked_q4w, 3.0);
    assert_eq!(user.balance.total_q4w, 7.0);
    let json = serde_json::to_value(&user).unwrap();
    assert!(json["emissions"].is_null());
}

#[tokio::test]
async fn test_pool_user_incomplete_emissions() {
    let mut ledger = pool_user_ledger(false);
    ledger.insert(
        BACKSTOP,
        vec(vec![
            symbol("UEmisData"),
            scval::symbol_map(vec![("pool", address(POOL)), ("user", address(USER))]).unwrap(),
        ]),
        scval::symbol_map(vec![("index", amount(1))]).unwrap(),
    );
    let client = BlendClient::with_reader(ledger);

    match client
        .backstop_pool_user(BACKSTOP, POOL, USER, at(NOW))
        .await
        .unwrap_err()
    {
        Error::MissingData(pieces) => assert_eq!(pieces, vec!["user emissions accrued"]),
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_pool_user_missing_balance() {
    let mut ledger = pool_user_ledger(true);
    ledger.entries.retain(|key, _| match key.key() {
        ScVal::Vec(Some(items)) => items.0[0] != symbol("UserBalance"),
        _ => true,
    });
    let client = BlendClient::with_reader(ledger);

    match client
        .backstop_pool_user(BACKSTOP, POOL, USER, at(NOW))
        .await
        .unwrap_err()
    {
        Error::MissingData(pieces) => assert_eq!(pieces, vec!["user balance"]),
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_pool_user_bad_user_checksum() {
    let client = BlendClient::with_reader(pool_user_ledger(true));
    let mut user = USER.to_string();
    user.pop();
    user.push('A');

    let err = client
        .backstop_pool_user(BACKSTOP, POOL, &user, at(NOW))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::AddressDecode(_)));
}
