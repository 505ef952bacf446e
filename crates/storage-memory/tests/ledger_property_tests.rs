//! Property-based tests for the quota ledger.
//!
//! Random deposit/withdrawal sequences are replayed against the real services
//! on the in-memory store, and the ledger invariants are checked after every
//! step.

use chrono::{Duration, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

use walletquota_core::quota::{MovementType, NewCashMovement, QuotaService, QuotaServiceTrait};
use walletquota_core::valuations::{NewValuationObservation, ValuationService, ValuationServiceTrait};
use walletquota_core::wallets::{NewWallet, WalletRepositoryTrait};
use walletquota_storage_memory::{MemoryDb, QuotaRepository, ValuationRepository, WalletRepository};

// =============================================================================
// Generators
// =============================================================================

#[derive(Debug, Clone)]
struct Step {
    movement_type: MovementType,
    amount: Decimal,
    networth: Decimal,
}

fn arb_movement_type() -> impl Strategy<Value = MovementType> {
    prop_oneof![Just(MovementType::In), Just(MovementType::Out)]
}

/// Generates a cent-precision amount between 0.01 and 100,000.00.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_step() -> impl Strategy<Value = Step> {
    (arb_movement_type(), arb_amount(), arb_amount()).prop_map(
        |(movement_type, amount, networth)| Step {
            movement_type,
            amount,
            networth,
        },
    )
}

// =============================================================================
// Harness
// =============================================================================

struct Harness {
    wallets: Arc<WalletRepository>,
    valuations: Arc<ValuationService>,
    quota: QuotaService,
    wallet_id: String,
}

async fn harness(initial: Decimal) -> Harness {
    let db = MemoryDb::new();
    let wallets = Arc::new(WalletRepository::new(db.clone()));
    let valuations = Arc::new(ValuationService::new(
        Arc::new(ValuationRepository::new(db.clone())),
        wallets.clone(),
    ));
    let quota = QuotaService::new(
        Arc::new(QuotaRepository::new(db)),
        wallets.clone(),
        valuations.clone(),
    );

    let wallet = wallets.create(NewWallet::new("0xprop")).await.unwrap();
    quota
        .initialize_ledger(&wallet.id, initial, None)
        .await
        .unwrap();

    Harness {
        wallets,
        valuations,
        quota,
        wallet_id: wallet.id,
    }
}

impl Harness {
    fn unit_quantity(&self) -> Decimal {
        self.wallets.get_by_id(&self.wallet_id).unwrap().unit_quantity
    }

    fn movement_count(&self) -> usize {
        self.quota.get_movements(&self.wallet_id).unwrap().len()
    }

    /// Outstanding units summed oldest first, the same way a rebuild does.
    fn units_from_movements(&self) -> Decimal {
        self.quota
            .get_movements(&self.wallet_id)
            .unwrap()
            .iter()
            .rev()
            .fold(Decimal::ZERO, |quantity, m| match m.movement_type {
                MovementType::In => quantity + m.units_issued,
                MovementType::Out => quantity - m.units_issued,
            })
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Unit quantity never goes negative, a rejected step changes nothing,
    /// and the live quantity always equals the sum of the stored movements.
    #[test]
    fn prop_ledger_stays_consistent(
        initial in arb_amount(),
        steps in proptest::collection::vec(arb_step(), 1..12),
    ) {
        runtime().block_on(async {
            let h = harness(initial).await;
            let start = Utc::now() + Duration::hours(1);

            for (i, step) in steps.iter().enumerate() {
                let at = start + Duration::hours(i as i64);
                h.valuations
                    .record_observation(NewValuationObservation::automatic(
                        h.wallet_id.clone(),
                        at,
                        step.networth,
                    ))
                    .await
                    .unwrap();

                let quantity_before = h.unit_quantity();
                let count_before = h.movement_count();

                let result = h
                    .quota
                    .record_movement(
                        NewCashMovement::new(h.wallet_id.clone(), step.movement_type, step.amount)
                            .at(at),
                    )
                    .await;

                let quantity = h.unit_quantity();
                prop_assert!(quantity >= Decimal::ZERO);
                match result {
                    Ok(recorded) => {
                        prop_assert_eq!(recorded.new_unit_quantity, quantity);
                        prop_assert_eq!(h.movement_count(), count_before + 1);
                    }
                    Err(_) => {
                        prop_assert_eq!(quantity, quantity_before);
                        prop_assert_eq!(h.movement_count(), count_before);
                    }
                }
                prop_assert_eq!(h.units_from_movements(), quantity);
            }
            Ok(())
        })?;
    }

    /// A withdrawal worth more than the outstanding units always fails.
    #[test]
    fn prop_overdraw_is_rejected(initial in arb_amount(), networth in arb_amount()) {
        runtime().block_on(async {
            let h = harness(initial).await;
            let at = Utc::now() + Duration::hours(1);
            h.valuations
                .record_observation(NewValuationObservation::automatic(
                    h.wallet_id.clone(),
                    at,
                    networth,
                ))
                .await
                .unwrap();

            // unit_value * quantity == networth, so anything above it overdraws.
            let amount = networth * Decimal::TWO;
            let result = h
                .quota
                .record_movement(
                    NewCashMovement::new(h.wallet_id.clone(), MovementType::Out, amount).at(at),
                )
                .await;

            prop_assert!(result.is_err());
            prop_assert_eq!(h.unit_quantity(), initial);
            prop_assert_eq!(h.movement_count(), 1);
            Ok(())
        })?;
    }

    /// Recording a deposit and deleting it restores the unit quantity exactly.
    #[test]
    fn prop_delete_undoes_deposit(
        initial in arb_amount(),
        amount in arb_amount(),
        networth in arb_amount(),
    ) {
        runtime().block_on(async {
            let h = harness(initial).await;
            let at = Utc::now() + Duration::hours(1);
            h.valuations
                .record_observation(NewValuationObservation::automatic(
                    h.wallet_id.clone(),
                    at,
                    networth,
                ))
                .await
                .unwrap();

            let before = h.unit_quantity();
            let recorded = h
                .quota
                .record_movement(
                    NewCashMovement::new(h.wallet_id.clone(), MovementType::In, amount).at(at),
                )
                .await
                .unwrap();
            h.quota
                .delete_movement(&h.wallet_id, &recorded.movement.id)
                .await
                .unwrap();

            prop_assert_eq!(h.unit_quantity(), before);
            prop_assert_eq!(h.movement_count(), 1);
            prop_assert_eq!(
                h.quota.get_history_points(&h.wallet_id).unwrap().len(),
                1
            );
            Ok(())
        })?;
    }

    /// Rebuilding a consistent ledger changes nothing.
    #[test]
    fn prop_rebuild_is_idempotent(
        initial in arb_amount(),
        steps in proptest::collection::vec(arb_step(), 0..6),
    ) {
        runtime().block_on(async {
            let h = harness(initial).await;
            let start = Utc::now() + Duration::hours(1);
            for (i, step) in steps.iter().enumerate() {
                let at = start + Duration::hours(i as i64);
                h.valuations
                    .record_observation(NewValuationObservation::automatic(
                        h.wallet_id.clone(),
                        at,
                        step.networth,
                    ))
                    .await
                    .unwrap();
                let _ = h
                    .quota
                    .record_movement(
                        NewCashMovement::new(h.wallet_id.clone(), step.movement_type, step.amount)
                            .at(at),
                    )
                    .await;
            }

            let quantity = h.unit_quantity();
            let points = h.quota.get_history_points(&h.wallet_id).unwrap();

            let rebuilt = h.quota.rebuild_ledger(&h.wallet_id).await.unwrap();

            prop_assert_eq!(rebuilt, quantity);
            prop_assert_eq!(h.unit_quantity(), quantity);
            prop_assert_eq!(h.quota.get_history_points(&h.wallet_id).unwrap(), points);
            Ok(())
        })?;
    }
}
