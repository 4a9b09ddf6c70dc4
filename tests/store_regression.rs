use std::collections::BTreeMap;
use std::sync::Barrier;

use anyhow::Result;
use reservedb::{
    Balances, Domain, ExchangeBalances, Prices, Rates, SnapshotStore, StoreError, Version,
    model::{
        AllRateEntry, BalanceEntry, EBalanceEntry, ExchangeId, ExchangePrice, OnePrice,
        PriceEntry, RateEntry, TokenPairId,
    },
};
use tempfile::TempDir;

fn open_store() -> Result<(TempDir, SnapshotStore)> {
    let dir = tempfile::tempdir()?;
    let store = SnapshotStore::open(dir.path().join("snapshots"))?;
    Ok((dir, store))
}

fn rates(block: u64) -> AllRateEntry {
    AllRateEntry {
        valid: true,
        error: None,
        timestamp: block * 1_000,
        return_time: block * 1_000 + 5,
        block_number: block,
        data: BTreeMap::new(),
    }
}

fn balance(amount: &str) -> BalanceEntry {
    BalanceEntry {
        valid: true,
        error: None,
        timestamp: 1,
        return_time: 2,
        balance: amount.to_string(),
    }
}

fn prices(rate: f64) -> BTreeMap<TokenPairId, OnePrice> {
    let mut quote: OnePrice = BTreeMap::new();
    quote.insert(
        "huobi".into(),
        ExchangePrice {
            valid: true,
            error: None,
            timestamp: 3,
            bids: vec![PriceEntry {
                quantity: 10.0,
                rate,
            }],
            asks: vec![PriceEntry {
                quantity: 4.0,
                rate: rate * 2.0,
            }],
            return_time: 4,
        },
    );
    let mut payload = BTreeMap::new();
    payload.insert(TokenPairId::new("ETH", "OMG"), quote);
    payload
}

#[test]
fn reverse_seek_over_stored_versions() -> Result<()> {
    let (_dir, store) = open_store()?;
    for version in [10, 20, 30] {
        store.rates().store_snapshot(&rates(version), version)?;
    }

    assert_eq!(store.current_version::<Rates>(25)?.as_u64(), 20);
    assert_eq!(store.current_version::<Rates>(20)?.as_u64(), 20);
    assert_eq!(store.current_version::<Rates>(100)?.as_u64(), 30);
    assert_eq!(store.current_version::<Rates>(10)?.as_u64(), 10);

    let err = store.current_version::<Rates>(5).unwrap_err();
    assert!(matches!(
        err,
        StoreError::NoDataBeforeTimepoint {
            domain: Domain::Rates,
            timepoint: 5
        }
    ));
    Ok(())
}

#[test]
fn empty_domains_have_no_data() -> Result<()> {
    let (_dir, store) = open_store()?;
    for timepoint in [0, 1, 1_517_000_000, u64::MAX] {
        for domain in Domain::ALL {
            let err = store.current_version_of(domain, timepoint).unwrap_err();
            assert!(err.is_absence());
            assert!(matches!(err, StoreError::NoDataBeforeTimepoint { .. }));
        }
    }
    Ok(())
}

#[test]
fn every_domain_round_trips() -> Result<()> {
    let (_dir, store) = open_store()?;

    let price_payload = prices(0.125);
    store.prices().store_snapshot(&price_payload, 1)?;
    assert_eq!(store.get_snapshot::<Prices>(Version::new(1))?, price_payload);

    let mut balance_payload = BTreeMap::new();
    balance_payload.insert(
        "0xabc:KNC".to_string(),
        balance("115792089237316195423570985008687907853269984665640564039457584007913129639935"),
    );
    store.balances().store_snapshot(&balance_payload, 2)?;
    assert_eq!(store.get_snapshot::<Balances>(Version::new(2))?, balance_payload);

    let mut available = BTreeMap::new();
    available.insert("ETH".to_string(), 12.5);
    let mut ebalance_payload = BTreeMap::new();
    ebalance_payload.insert(
        "bittrex".into(),
        EBalanceEntry {
            valid: false,
            error: Some("rate limited".into()),
            timestamp: 9,
            return_time: 10,
            available_balance: available,
            locked_balance: BTreeMap::new(),
            deposit_balance: BTreeMap::new(),
        },
    );
    store.exchange_balances().store_snapshot(&ebalance_payload, 3)?;
    assert_eq!(
        store.get_snapshot::<ExchangeBalances>(Version::new(3))?,
        ebalance_payload
    );

    store.rates().store_snapshot(&rates(4), 4)?;
    assert_eq!(store.get_snapshot::<Rates>(Version::new(4))?, rates(4));
    Ok(())
}

#[test]
fn overwrite_keeps_last_payload() -> Result<()> {
    let (_dir, store) = open_store()?;
    store.rates().store_snapshot(&rates(1), 500)?;
    store.rates().store_snapshot(&rates(2), 500)?;

    assert_eq!(store.counts()?.rates, 1);
    assert_eq!(store.get_snapshot::<Rates>(Version::new(500))?, rates(2));
    Ok(())
}

#[test]
fn non_finite_rates_are_rejected_before_commit() -> Result<()> {
    let (_dir, store) = open_store()?;
    let mut payload = rates(9);
    payload.data.insert(
        TokenPairId::new("ETH", "KNC"),
        RateEntry {
            base_buy: f64::NAN,
            compact_buy: 0,
            base_sell: 1.0,
            compact_sell: 0,
            block: 9,
        },
    );

    let err = store.rates().store_snapshot(&payload, 900).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Encode {
            domain: Domain::Rates,
            ..
        }
    ));
    assert_eq!(store.counts()?.rates, 0);
    assert!(store.current_version::<Rates>(u64::MAX).unwrap_err().is_absence());

    for entry in payload.data.values_mut() {
        entry.base_buy = 0.5;
        entry.base_sell = f64::NEG_INFINITY;
    }
    assert!(store.rates().store_snapshot(&payload, 900).is_err());
    assert_eq!(store.counts()?.rates, 0);
    Ok(())
}

#[test]
fn missing_key_is_not_a_decode_error() -> Result<()> {
    let (_dir, store) = open_store()?;
    store.prices().store_snapshot(&prices(1.0), 40)?;

    let missing = TokenPairId::new("ETH", "ZRX");
    let err = store
        .get_one::<Prices>(&missing, Version::new(40))
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::KeyNotFound {
            domain: Domain::Prices,
            ..
        }
    ));

    let found = store.get_one::<Prices>(&TokenPairId::new("ETH", "OMG"), Version::new(40))?;
    assert!(found.contains_key(&ExchangeId::from("huobi")));
    Ok(())
}

#[test]
fn domains_are_independent() -> Result<()> {
    let (_dir, store) = open_store()?;
    store.prices().store_snapshot(&prices(2.0), 100)?;

    for domain in [Domain::Balances, Domain::ExchangeBalances, Domain::Rates] {
        let err = store.current_version_of(domain, 100).unwrap_err();
        assert!(matches!(err, StoreError::NoDataBeforeTimepoint { .. }));
    }
    let err = store.get_snapshot::<Balances>(Version::new(100)).unwrap_err();
    assert!(matches!(
        err,
        StoreError::VersionNotFound {
            domain: Domain::Balances,
            ..
        }
    ));

    store.balances().store_snapshot(&BTreeMap::new(), 90)?;
    assert_eq!(store.current_version::<Prices>(100)?.as_u64(), 100);
    assert_eq!(store.current_version::<Balances>(100)?.as_u64(), 90);
    Ok(())
}

#[test]
fn read_transaction_ignores_later_commits() -> Result<()> {
    let (_dir, store) = open_store()?;
    store.rates().store_snapshot(&rates(1), 100)?;

    store.view(|reader| {
        assert_eq!(reader.current_version::<Rates>(u64::MAX)?.as_u64(), 100);

        std::thread::scope(|scope| {
            scope
                .spawn(|| store.rates().store_snapshot(&rates(2), 200))
                .join()
                .expect("writer thread panicked")
        })?;

        assert_eq!(reader.current_version::<Rates>(u64::MAX)?.as_u64(), 100);
        let err = reader.get_snapshot::<Rates>(Version::new(200)).unwrap_err();
        assert!(matches!(err, StoreError::VersionNotFound { .. }));
        Ok(())
    })?;

    assert_eq!(store.current_version::<Rates>(u64::MAX)?.as_u64(), 200);
    Ok(())
}

#[test]
fn concurrent_writers_and_readers() -> Result<()> {
    let (_dir, store) = open_store()?;
    const WRITERS: u64 = 4;
    const PER_WRITER: u64 = 25;
    let barrier = Barrier::new(WRITERS as usize + 1);

    std::thread::scope(|scope| {
        for writer in 0..WRITERS {
            let store = &store;
            let barrier = &barrier;
            scope.spawn(move || {
                barrier.wait();
                for step in 0..PER_WRITER {
                    let version = step * WRITERS + writer + 1;
                    store
                        .rates()
                        .store_snapshot(&rates(version), version)
                        .expect("store snapshot");
                }
            });
        }

        let store = &store;
        let barrier = &barrier;
        scope.spawn(move || {
            barrier.wait();
            for _ in 0..50 {
                match store.rates().snapshot_at(u64::MAX) {
                    Ok((version, payload)) => {
                        assert_eq!(payload.block_number, version.as_u64())
                    }
                    Err(StoreError::NoDataBeforeTimepoint { .. }) => {}
                    Err(other) => panic!("unexpected error {other}"),
                }
            }
        });
    });

    assert_eq!(store.counts()?.rates, WRITERS * PER_WRITER);
    assert_eq!(
        store.current_version::<Rates>(u64::MAX)?.as_u64(),
        WRITERS * PER_WRITER
    );
    Ok(())
}

#[test]
fn snapshots_survive_reopen() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("snapshots");
    {
        let store = SnapshotStore::open(&path)?;
        store.rates().store_snapshot(&rates(7), 700)?;
        store.balances().store_snapshot(&BTreeMap::new(), 710)?;
    }

    let store = SnapshotStore::open(&path)?;
    assert_eq!(store.current_version::<Rates>(701)?.as_u64(), 700);
    assert_eq!(store.get_snapshot::<Rates>(Version::new(700))?, rates(7));
    drop(store);

    let reader = SnapshotStore::open_read_only(&path)?;
    assert!(reader.is_read_only());
    assert_eq!(reader.current_version::<Balances>(u64::MAX)?.as_u64(), 710);
    let err = reader.rates().store_snapshot(&rates(8), 800).unwrap_err();
    assert!(matches!(err, StoreError::ReadOnly));
    Ok(())
}

#[test]
fn open_fails_with_store_init_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let blocker = dir.path().join("not-a-directory");
    std::fs::write(&blocker, b"occupied")?;

    let err = SnapshotStore::open(&blocker).err().expect("open should fail");
    assert!(matches!(err, StoreError::StoreInit { .. }));
    Ok(())
}
