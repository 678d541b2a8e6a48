//! Shared fixtures: an ERC-20 style contract, its logs, and an encoded
//! transaction record laid out by the V1 field mapping.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{keccak256, Address, Bytes, Log, B256, U256};
use async_trait::async_trait;
use chainquery_abi::FieldMapping;
use chainquery_builder::{AbiProvider, StaticAbiProvider};
use chainquery_core::{
    EncodingVersion, ProviderError, QueryableField, ReceiptContext, TxContext, TxType,
};

// ─── Contract ─────────────────────────────────────────────────────────────────

pub const TOKEN_ABI: &str = r#"[
  {"type":"event","name":"Transfer","anonymous":false,"inputs":[
    {"name":"from","type":"address","indexed":true},
    {"name":"to","type":"address","indexed":true},
    {"name":"value","type":"uint256","indexed":false}]},
  {"type":"event","name":"Approval","anonymous":false,"inputs":[
    {"name":"owner","type":"address","indexed":true},
    {"name":"spender","type":"address","indexed":true},
    {"name":"value","type":"uint256","indexed":false}]},
  {"type":"event","name":"Memo","anonymous":false,"inputs":[
    {"name":"sender","type":"address","indexed":true},
    {"name":"note","type":"string","indexed":false},
    {"name":"amount","type":"uint256","indexed":false}]},
  {"type":"event","name":"Ping","anonymous":true,"inputs":[
    {"name":"id","type":"uint256","indexed":true},
    {"name":"value","type":"uint256","indexed":false}]},
  {"type":"event","name":"Settled","anonymous":false,"inputs":[
    {"name":"account","type":"address","indexed":true},
    {"name":"terms","type":"tuple","indexed":false,"components":[
      {"name":"price","type":"uint256"},
      {"name":"quantity","type":"uint256"}]}]},
  {"type":"function","name":"transfer","stateMutability":"nonpayable",
    "inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],
    "outputs":[{"name":"","type":"bool"}]},
  {"type":"function","name":"approve","stateMutability":"nonpayable",
    "inputs":[{"name":"spender","type":"address"},{"name":"amount","type":"uint256"}],
    "outputs":[{"name":"","type":"bool"}]},
  {"type":"function","name":"mint","stateMutability":"nonpayable",
    "inputs":[{"name":"to","type":"address"}],
    "outputs":[]},
  {"type":"function","name":"mint","stateMutability":"nonpayable",
    "inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],
    "outputs":[]},
  {"type":"function","name":"airdrop","stateMutability":"nonpayable",
    "inputs":[{"name":"recipients","type":"address[]"},{"name":"amount","type":"uint256"}],
    "outputs":[]}
]"#;

pub fn token() -> Address {
    Address::repeat_byte(0x70)
}

pub fn alice() -> Address {
    Address::repeat_byte(0xa1)
}

pub fn bob() -> Address {
    Address::repeat_byte(0xb0)
}

pub fn carol() -> Address {
    Address::repeat_byte(0xc0)
}

pub fn topic(signature: &str) -> B256 {
    keccak256(signature.as_bytes())
}

pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

pub fn word(value: u64) -> B256 {
    B256::from(U256::from(value).to_be_bytes::<32>())
}

// ─── Logs ─────────────────────────────────────────────────────────────────────

pub fn transfer_log(from: Address, to: Address, value: u64) -> Log {
    Log::new_unchecked(
        token(),
        vec![
            topic("Transfer(address,address,uint256)"),
            from.into_word(),
            to.into_word(),
        ],
        Bytes::copy_from_slice(word(value).as_slice()),
    )
}

pub fn approval_log(owner: Address, spender: Address, value: u64) -> Log {
    Log::new_unchecked(
        token(),
        vec![
            topic("Approval(address,address,uint256)"),
            owner.into_word(),
            spender.into_word(),
        ],
        Bytes::copy_from_slice(word(value).as_slice()),
    )
}

pub fn memo_log(sender: Address, note: &str, amount: u64) -> Log {
    let data = DynSolValue::Tuple(vec![
        DynSolValue::String(note.to_string()),
        DynSolValue::Uint(U256::from(amount), 256),
    ])
    .abi_encode_params();
    Log::new_unchecked(
        token(),
        vec![topic("Memo(address,string,uint256)"), sender.into_word()],
        Bytes::from(data),
    )
}

pub fn ping_log(id: u64, value: u64) -> Log {
    Log::new_unchecked(
        token(),
        vec![word(id)],
        Bytes::copy_from_slice(word(value).as_slice()),
    )
}

pub fn settled_log(account: Address, price: u64, quantity: u64) -> Log {
    let data = DynSolValue::Tuple(vec![DynSolValue::Tuple(vec![
        DynSolValue::Uint(U256::from(price), 256),
        DynSolValue::Uint(U256::from(quantity), 256),
    ])])
    .abi_encode_params();
    Log::new_unchecked(
        token(),
        vec![
            topic("Settled(address,(uint256,uint256))"),
            account.into_word(),
        ],
        Bytes::from(data),
    )
}

pub fn bare_log() -> Log {
    Log::new_unchecked(token(), vec![], Bytes::new())
}

/// Receipt used by most tests:
///
/// | index | log                          |
/// |-------|------------------------------|
/// | 0     | Transfer alice → bob, 100    |
/// | 1     | Approval alice → carol, 5    |
/// | 2     | Transfer bob → carol, 200    |
/// | 3     | Memo alice, "hello memo", 7  |
/// | 4     | Transfer carol → alice, 300  |
/// | 5     | Ping (anonymous) id 9, 11    |
/// | 6     | no topics                    |
pub fn standard_receipt() -> ReceiptContext {
    ReceiptContext::new(vec![
        transfer_log(alice(), bob(), 100),
        approval_log(alice(), carol(), 5),
        transfer_log(bob(), carol(), 200),
        memo_log(alice(), "hello memo", 7),
        transfer_log(carol(), alice(), 300),
        ping_log(9, 11),
        bare_log(),
    ])
}

// ─── Call data ────────────────────────────────────────────────────────────────

pub fn call(signature: &str, args: Vec<DynSolValue>) -> Vec<u8> {
    let mut data = selector(signature).to_vec();
    data.extend(DynSolValue::Tuple(args).abi_encode_params());
    data
}

pub fn transfer_call(to: Address, amount: u64) -> Vec<u8> {
    call(
        "transfer(address,uint256)",
        vec![
            DynSolValue::Address(to),
            DynSolValue::Uint(U256::from(amount), 256),
        ],
    )
}

// ─── Record encoding ──────────────────────────────────────────────────────────

/// ABI-encode `tx` and `receipt` in the V1 record layout. Fields without a
/// counterpart in the contexts get deterministic sample values derived from
/// their position.
pub fn encode_record(tx: &TxContext, receipt: &ReceiptContext) -> Vec<u8> {
    let mapping = FieldMapping::for_transaction(EncodingVersion::V1, tx.tx_type).unwrap();
    let values = mapping
        .entries()
        .iter()
        .enumerate()
        .map(|(position, (field, ty))| field_value(*field, ty, position, tx, receipt))
        .collect();
    DynSolValue::Tuple(values).abi_encode_params()
}

fn field_value(
    field: QueryableField,
    ty: &DynSolType,
    position: usize,
    tx: &TxContext,
    receipt: &ReceiptContext,
) -> DynSolValue {
    match field {
        QueryableField::Type => DynSolValue::Uint(U256::from(tx.tx_type.as_u8()), 8),
        QueryableField::TxTo => DynSolValue::Address(tx.to.unwrap_or_default()),
        QueryableField::TxData => DynSolValue::Bytes(tx.input.to_vec()),
        QueryableField::RxLogs => DynSolValue::Array(receipt.logs.iter().map(log_value).collect()),
        _ => sample_value(ty, position),
    }
}

fn sample_value(ty: &DynSolType, position: usize) -> DynSolValue {
    let tag = position as u8 + 1;
    match ty {
        DynSolType::Uint(bits) => DynSolValue::Uint(U256::from(tag), *bits),
        DynSolType::Address => DynSolValue::Address(Address::repeat_byte(tag)),
        DynSolType::FixedBytes(size) => DynSolValue::FixedBytes(B256::repeat_byte(tag), *size),
        DynSolType::Bytes => DynSolValue::Bytes(vec![tag; 256]),
        DynSolType::Array(_) => DynSolValue::Array(vec![]),
        other => panic!("no sample value for {}", other.sol_type_name()),
    }
}

fn log_value(log: &Log) -> DynSolValue {
    DynSolValue::Tuple(vec![
        DynSolValue::Address(log.address),
        DynSolValue::Array(
            log.topics()
                .iter()
                .map(|t| DynSolValue::FixedBytes(*t, 32))
                .collect(),
        ),
        DynSolValue::Bytes(log.data.data.to_vec()),
    ])
}

/// Legacy transaction calling `input` on the token, with the standard receipt.
pub fn legacy_fixture(input: Vec<u8>) -> (TxContext, ReceiptContext, Vec<u8>) {
    let tx = TxContext::new(TxType::Legacy, Some(token()), input);
    let receipt = standard_receipt();
    let encoded = encode_record(&tx, &receipt);
    (tx, receipt, encoded)
}

// ─── Providers ────────────────────────────────────────────────────────────────

pub fn token_provider() -> StaticAbiProvider {
    StaticAbiProvider::new().with_abi(token(), TOKEN_ABI)
}

/// Counts every fetch reaching the wrapped provider.
pub struct CountingProvider {
    inner: StaticAbiProvider,
    fetches: AtomicUsize,
}

impl CountingProvider {
    pub fn new(inner: StaticAbiProvider) -> Self {
        Self {
            inner,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AbiProvider for CountingProvider {
    async fn get_abi(&self, address: Address) -> Result<String, ProviderError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.get_abi(address).await
    }
}
