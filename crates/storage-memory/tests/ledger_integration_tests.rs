//! End-to-end tests of the core services running on the in-memory store.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;

use walletquota_core::errors::{Error, Result};
use walletquota_core::events::{DomainEvent, MockDomainEventSink};
use walletquota_core::quota::{
    MovementType, NewCashMovement, QuotaError, QuotaService, QuotaServiceTrait,
};
use walletquota_core::settings::{SettingsService, SettingsServiceTrait, SettingsUpdate};
use walletquota_core::sync::{SyncError, SyncJob, SyncScheduler, ValuationFeedTrait, WalletSyncService};
use walletquota_core::valuations::{
    NewValuationObservation, ValuationService, ValuationServiceTrait, ValuationSource,
};
use walletquota_core::utils::hour_bucket;
use walletquota_core::wallets::{LedgerState, NewWallet, Wallet, WalletRepositoryTrait};
use walletquota_storage_memory::{
    MemoryDb, QuotaRepository, SettingsRepository, ValuationRepository, WalletRepository,
};

// =============================================================================
// Fixtures
// =============================================================================

struct Engine {
    wallets: Arc<WalletRepository>,
    valuations: Arc<ValuationService>,
    quota: QuotaService,
    sink: MockDomainEventSink,
}

fn engine() -> Engine {
    let db = MemoryDb::new();
    let sink = MockDomainEventSink::new();
    let wallets = Arc::new(WalletRepository::new(db.clone()));
    let valuations = Arc::new(
        ValuationService::new(Arc::new(ValuationRepository::new(db.clone())), wallets.clone())
            .with_event_sink(Arc::new(sink.clone())),
    );
    let quota = QuotaService::new(
        Arc::new(QuotaRepository::new(db)),
        wallets.clone(),
        valuations.clone(),
    )
    .with_event_sink(Arc::new(sink.clone()));

    Engine {
        wallets,
        valuations,
        quota,
        sink,
    }
}

async fn create_wallet(engine: &Engine, address: &str) -> Wallet {
    engine
        .wallets
        .create(NewWallet::new(address))
        .await
        .unwrap()
}

/// Balance API stand-in keyed by address. Unknown addresses fail.
struct StaticFeed {
    balances: HashMap<String, Decimal>,
}

#[async_trait]
impl ValuationFeedTrait for StaticFeed {
    async fn fetch_networth(&self, address: &str) -> Result<Decimal> {
        self.balances
            .get(address)
            .copied()
            .ok_or_else(|| SyncError::Feed(format!("no balance for {}", address)).into())
    }
}

// =============================================================================
// Ledger lifecycle
// =============================================================================

#[tokio::test]
async fn test_full_ledger_lifecycle() {
    let engine = engine();
    let wallet = create_wallet(&engine, "0xabc").await;
    assert_eq!(wallet.ledger_state(false), LedgerState::Unseeded);

    let init = engine
        .quota
        .initialize_ledger(&wallet.id, dec!(1000), None)
        .await
        .unwrap();
    assert_eq!(init.unit_quantity, dec!(1000));

    let t1 = Utc::now() + Duration::hours(1);
    engine
        .valuations
        .record_observation(NewValuationObservation::automatic(
            wallet.id.clone(),
            t1,
            dec!(1100),
        ))
        .await
        .unwrap();

    let deposit = engine
        .quota
        .record_movement(NewCashMovement::new(wallet.id.clone(), MovementType::In, dec!(110)).at(t1))
        .await
        .unwrap();
    assert_eq!(deposit.current_unit_value, dec!(1.1));
    assert_eq!(deposit.movement.units_issued, dec!(100));
    assert_eq!(deposit.new_unit_quantity, dec!(1100));

    let stored = engine.wallets.get_by_id(&wallet.id).unwrap();
    assert_eq!(stored.unit_quantity, dec!(1100));
    assert_eq!(stored.ledger_state(true), LedgerState::Active);

    let rejected = engine
        .quota
        .record_movement(
            NewCashMovement::new(wallet.id.clone(), MovementType::Out, dec!(5000)).at(t1),
        )
        .await;
    assert!(matches!(
        rejected,
        Err(Error::Quota(QuotaError::InsufficientUnits { .. }))
    ));

    engine
        .quota
        .delete_movement(&wallet.id, &deposit.movement.id)
        .await
        .unwrap();
    let stored = engine.wallets.get_by_id(&wallet.id).unwrap();
    assert_eq!(stored.unit_quantity, dec!(1000));
    assert_eq!(engine.quota.get_movements(&wallet.id).unwrap().len(), 1);
    assert_eq!(engine.quota.get_history_points(&wallet.id).unwrap().len(), 1);

    let kinds: Vec<_> = engine
        .sink
        .events()
        .into_iter()
        .filter(|e| !matches!(e, DomainEvent::ValuationsChanged { .. }))
        .collect();
    assert_eq!(
        kinds,
        vec![
            DomainEvent::ledger_initialized(wallet.id.clone()),
            DomainEvent::movement_recorded(
                wallet.id.clone(),
                deposit.movement.id.clone(),
                MovementType::In
            ),
            DomainEvent::movement_deleted(wallet.id.clone(), deposit.movement.id.clone()),
        ]
    );
}

#[tokio::test]
async fn test_history_prefers_automatic_observations() {
    let engine = engine();
    let wallet = create_wallet(&engine, "0xdef").await;
    let now = Utc::now();

    engine
        .quota
        .initialize_ledger(&wallet.id, dec!(500), None)
        .await
        .unwrap();

    let t = now + Duration::hours(2);
    engine
        .valuations
        .record_observation(NewValuationObservation::manual(wallet.id.clone(), t, dec!(600)))
        .await
        .unwrap();
    engine
        .valuations
        .record_observation(NewValuationObservation::automatic(
            wallet.id.clone(),
            t,
            dec!(550),
        ))
        .await
        .unwrap();

    let history = engine
        .quota
        .get_history_as_of(&wallet.id, t, 30, 100)
        .await
        .unwrap();

    assert_eq!(history.series.len(), 1);
    assert_eq!(history.series[0].networth, dec!(550));
    assert_eq!(history.series[0].unit_value, dec!(1.1));
    assert_eq!(history.metrics.current_networth, dec!(550));
    assert_eq!(history.metrics.net_invested, dec!(500));
    assert_eq!(history.metrics.absolute_gain, dec!(50));
    assert_eq!(history.metrics.roi_pct, dec!(10));

    let merged = engine
        .valuations
        .latest_at_or_before(&wallet.id, t)
        .unwrap()
        .unwrap();
    assert_eq!(merged.source, ValuationSource::Automatic);
}

#[tokio::test]
async fn test_history_matches_pricing_within_one_hour() {
    let engine = engine();
    let wallet = create_wallet(&engine, "0xhour").await;
    let hour = hour_bucket(Utc::now()) - Duration::hours(2);

    engine
        .valuations
        .record_observation(NewValuationObservation::automatic(
            wallet.id.clone(),
            hour + Duration::minutes(45),
            dec!(1000),
        ))
        .await
        .unwrap();
    let recorded = engine
        .quota
        .record_movement(
            NewCashMovement::new(wallet.id.clone(), MovementType::In, dec!(1000))
                .at(hour + Duration::minutes(30)),
        )
        .await
        .unwrap();
    assert_eq!(recorded.new_unit_quantity, dec!(1000));

    let history = engine.quota.get_history(&wallet.id, 30, 100).await.unwrap();

    let last = history.series.last().unwrap();
    assert_eq!(last.timestamp, hour);
    assert_eq!(last.unit_quantity, recorded.new_unit_quantity);
    assert_eq!(last.unit_value, recorded.current_unit_value);
}

#[tokio::test]
async fn test_huge_history_window_covers_everything() {
    let engine = engine();
    let wallet = create_wallet(&engine, "0xwide").await;
    engine
        .quota
        .initialize_ledger(&wallet.id, dec!(100), None)
        .await
        .unwrap();
    engine
        .valuations
        .record_observation(NewValuationObservation::manual(
            wallet.id.clone(),
            Utc::now() - Duration::days(400),
            dec!(100),
        ))
        .await
        .unwrap();

    let history = engine
        .quota
        .get_history(&wallet.id, 1_000_000_000, 100)
        .await
        .unwrap();
    assert_eq!(history.series.len(), 1);

    let aggregate = engine
        .valuations
        .get_merged_valuation(&[wallet.id.clone()], i64::MAX, 100)
        .unwrap();
    assert_eq!(aggregate.series.len(), 1);
}

#[tokio::test]
async fn test_wallets_are_independent() {
    let engine = engine();
    let a = create_wallet(&engine, "0xa").await;
    let b = create_wallet(&engine, "0xb").await;

    engine
        .quota
        .initialize_ledger(&a.id, dec!(100), None)
        .await
        .unwrap();
    engine
        .quota
        .initialize_ledger(&b.id, dec!(300), Some(dec!(3)))
        .await
        .unwrap();

    assert_eq!(engine.wallets.get_by_id(&a.id).unwrap().unit_quantity, dec!(100));
    assert_eq!(engine.wallets.get_by_id(&b.id).unwrap().unit_quantity, dec!(100));
    assert!(engine
        .quota
        .delete_movement(&a.id, &engine.quota.get_movements(&b.id).unwrap()[0].id)
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_unknown_wallet() {
    let engine = engine();

    let result = engine.quota.initialize_ledger("ghost", dec!(1), None).await;
    assert!(result.unwrap_err().is_not_found());

    let result = engine
        .valuations
        .record_observation(NewValuationObservation::manual("ghost", Utc::now(), dec!(1)))
        .await;
    assert!(result.unwrap_err().is_not_found());
}

// =============================================================================
// Sync
// =============================================================================

#[tokio::test]
async fn test_sync_records_automatic_observations() {
    let engine = engine();
    let good = create_wallet(&engine, "0xgood").await;
    let bad = create_wallet(&engine, "0xbad").await;

    let feed = StaticFeed {
        balances: HashMap::from([("0xgood".to_string(), dec!(1234.5))]),
    };
    let sync = Arc::new(
        WalletSyncService::new(engine.wallets.clone(), engine.valuations.clone(), Arc::new(feed))
            .with_event_sink(Arc::new(engine.sink.clone())),
    );
    let scheduler = SyncScheduler::new(sync.clone());

    let summary = scheduler.trigger_now().await.unwrap();

    assert_eq!(summary.total, 2);
    assert_eq!(summary.success, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.errors[0].wallet_id, bad.id);

    let latest = engine
        .valuations
        .latest_at_or_before(&good.id, Utc::now())
        .unwrap()
        .unwrap();
    assert_eq!(latest.networth, dec!(1234.5));
    assert_eq!(latest.source, ValuationSource::Automatic);
    assert!(engine.wallets.get_by_id(&good.id).unwrap().last_synced_at.is_some());
    assert!(engine.wallets.get_by_id(&bad.id).unwrap().last_synced_at.is_none());

    assert_eq!(
        engine.sink.events().last(),
        Some(&DomainEvent::wallets_synced(vec![good.id.clone()], 1))
    );

    // The job trait is what the scheduler runs on each tick.
    let again = sync.run().await.unwrap();
    assert_eq!(again.success, 1);
}

// =============================================================================
// Settings
// =============================================================================

#[tokio::test]
async fn test_settings_round_trip() {
    let db = MemoryDb::new();
    let service = SettingsService::new(Arc::new(SettingsRepository::new(db)));

    assert_eq!(service.get_default_initial_unit_value().unwrap(), dec!(1));

    service
        .update_settings(&SettingsUpdate {
            default_initial_unit_value: Some(dec!(100)),
            history_days: Some(90),
            ..Default::default()
        })
        .await
        .unwrap();

    let settings = service.get_settings().unwrap();
    assert_eq!(settings.default_initial_unit_value, dec!(100));
    assert_eq!(settings.history_days, 90);
    assert_eq!(settings.history_limit, 100);
}

#[tokio::test]
async fn test_wallet_creation_uses_configured_unit_value() {
    let db = MemoryDb::new();
    let settings = SettingsService::new(Arc::new(SettingsRepository::new(db.clone())));
    let wallets = WalletRepository::new(db);
    settings
        .set_setting_value("default_initial_unit_value", "10")
        .await
        .unwrap();

    let mut new_wallet = NewWallet::new("0x1");
    new_wallet.initial_unit_value = settings.get_default_initial_unit_value().unwrap();
    let wallet = wallets.create(new_wallet).await.unwrap();

    assert_eq!(wallet.initial_unit_value, dec!(10));
    assert_eq!(wallet.unit_quantity, Decimal::ZERO);
}
