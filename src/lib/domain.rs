use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    error::StoreError,
    model::{AllRateEntry, BalanceEntry, EBalanceEntry, ExchangeId, OnePrice, TokenPairId},
};

const BUCKET_PRICES: &str = "prices";
const BUCKET_BALANCES: &str = "balances";
const BUCKET_EXCHANGE_BALANCES: &str = "ebalances";
const BUCKET_RATES: &str = "rates";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Domain {
    Prices,
    Balances,
    ExchangeBalances,
    Rates,
}

impl Domain {
    pub const ALL: [Domain; 4] = [
        Domain::Prices,
        Domain::Balances,
        Domain::ExchangeBalances,
        Domain::Rates,
    ];

    /// Column family holding this domain's snapshots.
    pub fn bucket(self) -> &'static str {
        match self {
            Self::Prices => BUCKET_PRICES,
            Self::Balances => BUCKET_BALANCES,
            Self::ExchangeBalances => BUCKET_EXCHANGE_BALANCES,
            Self::Rates => BUCKET_RATES,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prices => "prices",
            Self::Balances => "balances",
            Self::ExchangeBalances => "exchange-balances",
            Self::Rates => "rates",
        }
    }

    pub fn buckets() -> impl Iterator<Item = &'static str> {
        Self::ALL.into_iter().map(Domain::bucket)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = StoreError;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "prices" | "price" => Ok(Self::Prices),
            "balances" | "balance" => Ok(Self::Balances),
            "exchange-balances" | "exchange_balances" | "ebalances" => {
                Ok(Self::ExchangeBalances)
            }
            "rates" | "rate" => Ok(Self::Rates),
            other => Err(StoreError::Config(format!("unknown domain '{other}'"))),
        }
    }
}

/// Binds a domain to the payload shape stored in its bucket.
pub trait SnapshotDomain {
    const DOMAIN: Domain;
    type Payload: Serialize + DeserializeOwned;
}

/// Domains whose payload is a mapping, so single records can be looked up.
pub trait KeyedDomain: SnapshotDomain {
    type Key: Ord + fmt::Display;
    type Record;

    fn lookup(payload: Self::Payload, key: &Self::Key) -> Option<Self::Record>;
}

#[derive(Debug, Clone, Copy)]
pub struct Prices;

#[derive(Debug, Clone, Copy)]
pub struct Balances;

#[derive(Debug, Clone, Copy)]
pub struct ExchangeBalances;

#[derive(Debug, Clone, Copy)]
pub struct Rates;

impl SnapshotDomain for Prices {
    const DOMAIN: Domain = Domain::Prices;
    type Payload = BTreeMap<TokenPairId, OnePrice>;
}

impl KeyedDomain for Prices {
    type Key = TokenPairId;
    type Record = OnePrice;

    fn lookup(mut payload: Self::Payload, key: &Self::Key) -> Option<Self::Record> {
        payload.remove(key)
    }
}

impl SnapshotDomain for Balances {
    const DOMAIN: Domain = Domain::Balances;
    type Payload = BTreeMap<String, BalanceEntry>;
}

impl KeyedDomain for Balances {
    type Key = String;
    type Record = BalanceEntry;

    fn lookup(mut payload: Self::Payload, key: &Self::Key) -> Option<Self::Record> {
        payload.remove(key)
    }
}

impl SnapshotDomain for ExchangeBalances {
    const DOMAIN: Domain = Domain::ExchangeBalances;
    type Payload = BTreeMap<ExchangeId, EBalanceEntry>;
}

impl SnapshotDomain for Rates {
    const DOMAIN: Domain = Domain::Rates;
    type Payload = AllRateEntry;
}
