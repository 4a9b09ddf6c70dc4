use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// Identifier of a traded pair, e.g. `ETH-KNC`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenPairId(String);

impl TokenPairId {
    pub fn new(base: &str, quote: &str) -> Self {
        Self(format!("{base}-{quote}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TokenPairId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TokenPairId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for TokenPairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeId(String);

impl ExchangeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ExchangeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ExchangeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub quantity: f64,
    pub rate: f64,
}

/// One exchange's order book for a pair, as fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangePrice {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: u64,
    #[serde(default)]
    pub bids: Vec<PriceEntry>,
    #[serde(default)]
    pub asks: Vec<PriceEntry>,
    pub return_time: u64,
}

/// Quotes for one pair across exchanges.
pub type OnePrice = BTreeMap<ExchangeId, ExchangePrice>;

/// On-chain balance of one token; `balance` is a base-unit decimal string so
/// 256-bit amounts survive the round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: u64,
    pub return_time: u64,
    pub balance: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EBalanceEntry {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: u64,
    pub return_time: u64,
    #[serde(default)]
    pub available_balance: BTreeMap<String, f64>,
    #[serde(default)]
    pub locked_balance: BTreeMap<String, f64>,
    #[serde(default)]
    pub deposit_balance: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    pub base_buy: f64,
    pub compact_buy: i8,
    pub base_sell: f64,
    pub compact_sell: i8,
    pub block: u64,
}

/// Rates for every pair as computed at one block.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AllRateEntry {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: u64,
    pub return_time: u64,
    pub block_number: u64,
    #[serde(default)]
    pub data: BTreeMap<TokenPairId, RateEntry>,
}
