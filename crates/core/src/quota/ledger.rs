//! Pure quota arithmetic.
//!
//! Everything here is synchronous and side-effect free: the service loads
//! state, calls into this module, and commits whatever comes back.

use std::collections::HashMap;

use rust_decimal::Decimal;

use super::quota_errors::QuotaError;
use super::quota_model::{
    CashMovement, MovementType, QuotaHistoryPoint, QuotaMetrics, QuotaSeriesPoint,
};
use crate::utils::hour_bucket;
use crate::valuations::MergedValuationPoint;

/// Price of one unit given the pool's net worth.
///
/// While no units are outstanding the pool has no price of its own, so the
/// wallet's configured `initial_unit_value` is used instead.
pub fn unit_value(
    networth: Decimal,
    unit_quantity: Decimal,
    initial_unit_value: Decimal,
) -> Decimal {
    if unit_quantity > Decimal::ZERO {
        networth / unit_quantity
    } else {
        initial_unit_value
    }
}

/// Outcome of pricing a movement against the live ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementPricing {
    pub unit_value: Decimal,
    pub units: Decimal,
    pub new_quantity: Decimal,
}

/// Converts `amount` into units at the unit value implied by `networth`.
pub fn price_movement(
    unit_quantity: Decimal,
    initial_unit_value: Decimal,
    movement_type: MovementType,
    amount: Decimal,
    networth: Decimal,
) -> Result<MovementPricing, QuotaError> {
    if amount <= Decimal::ZERO {
        return Err(QuotaError::InvalidAmount(amount));
    }

    let unit_value = unit_value(networth, unit_quantity, initial_unit_value);
    if unit_value <= Decimal::ZERO {
        return Err(QuotaError::ZeroUnitValue(unit_quantity));
    }

    let units = units_for(amount, networth, unit_quantity, unit_value);
    let (units, new_quantity) = match movement_type {
        MovementType::In => (units, unit_quantity + units),
        MovementType::Out => redeem(unit_quantity, units)?,
    };

    Ok(MovementPricing {
        unit_value,
        units,
        new_quantity,
    })
}

/// Units worth `amount`.
///
/// With units outstanding this is `amount * quantity / networth`, which is
/// `amount / unit_value` without the rounding of the intermediate unit value,
/// so withdrawing the whole net worth redeems exactly the whole quantity.
fn units_for(
    amount: Decimal,
    networth: Decimal,
    unit_quantity: Decimal,
    unit_value: Decimal,
) -> Decimal {
    if unit_quantity > Decimal::ZERO {
        if let Some(scaled) = amount.checked_mul(unit_quantity) {
            return scaled / networth;
        }
    }
    amount / unit_value
}

/// Subtracts `units` from `available`. Returns the units redeemed and the
/// remaining quantity; any shortfall is rejected.
fn redeem(available: Decimal, units: Decimal) -> Result<(Decimal, Decimal), QuotaError> {
    let remaining = available - units;
    if remaining >= Decimal::ZERO {
        Ok((units, remaining))
    } else {
        Err(QuotaError::InsufficientUnits {
            requested: units,
            available,
        })
    }
}

/// Sorts movements into replay order: timestamp, then insertion time, then id.
pub fn sort_chronologically(movements: &mut [CashMovement]) {
    movements.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then(a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Ledger state reconstructed from stored movements.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerReplay {
    pub unit_quantity: Decimal,
    pub history: Vec<QuotaHistoryPoint>,
}

/// Rebuilds the unit quantity and the history cache from `movements`.
///
/// Movements keep the units they were issued with; nothing is re-priced.
/// Net worth is taken from the cached point of the same movement when one
/// exists, otherwise derived from the movement's own unit value. Fails if
/// the running quantity goes negative at any step.
pub fn replay_movements(
    wallet_id: &str,
    movements: &[CashMovement],
    cached: &[QuotaHistoryPoint],
) -> Result<LedgerReplay, QuotaError> {
    let mut ordered = movements.to_vec();
    sort_chronologically(&mut ordered);

    let cached_networth: HashMap<&str, Decimal> = cached
        .iter()
        .map(|p| (p.movement_id.as_str(), p.networth))
        .collect();

    let mut quantity = Decimal::ZERO;
    let mut history = Vec::with_capacity(ordered.len());

    for movement in &ordered {
        let before = quantity;
        quantity = match movement.movement_type {
            MovementType::In => quantity + movement.units_issued,
            MovementType::Out => redeem(quantity, movement.units_issued)?.1,
        };

        let networth = cached_networth
            .get(movement.id.as_str())
            .copied()
            .unwrap_or_else(|| {
                if before > Decimal::ZERO {
                    movement.unit_value_at_time * before
                } else {
                    movement.amount
                }
            });

        history.push(QuotaHistoryPoint {
            wallet_id: wallet_id.to_string(),
            movement_id: movement.id.clone(),
            timestamp: movement.timestamp,
            unit_value: movement.unit_value_at_time,
            unit_quantity: quantity,
            networth,
        });
    }

    Ok(LedgerReplay {
        unit_quantity: quantity,
        history,
    })
}

/// Derives the unit value at every valuation point.
///
/// Points are stamped with their hour bucket, so the quantity at a point is
/// the sum of signed units of all movements whose hour bucket is at or before
/// it, replayed from zero. This matches the valuation a movement was priced
/// against.
pub fn build_quota_series(
    points: &[MergedValuationPoint],
    movements: &[CashMovement],
    initial_unit_value: Decimal,
) -> Vec<QuotaSeriesPoint> {
    let mut ordered = movements.to_vec();
    sort_chronologically(&mut ordered);

    let mut cursor = 0;
    let mut quantity = Decimal::ZERO;

    points
        .iter()
        .map(|point| {
            while cursor < ordered.len()
                && hour_bucket(ordered[cursor].timestamp) <= point.timestamp
            {
                quantity += ordered[cursor].signed_units();
                cursor += 1;
            }
            QuotaSeriesPoint {
                timestamp: point.timestamp,
                unit_value: unit_value(point.networth, quantity, initial_unit_value),
                unit_quantity: quantity,
                networth: point.networth,
            }
        })
        .collect()
}

fn percent_change(from: Decimal, to: Decimal) -> Decimal {
    if from > Decimal::ZERO {
        (to - from) / from * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    }
}

/// Summarizes invested cash against the latest valuation and the series.
pub fn compute_metrics(
    series: &[QuotaSeriesPoint],
    movements: &[CashMovement],
    current_networth: Decimal,
    unit_quantity: Decimal,
    fallback_unit_value: Decimal,
) -> QuotaMetrics {
    let (total_cash_in, total_cash_out) =
        movements
            .iter()
            .fold((Decimal::ZERO, Decimal::ZERO), |(cash_in, cash_out), m| {
                match m.movement_type {
                    MovementType::In => (cash_in + m.amount, cash_out),
                    MovementType::Out => (cash_in, cash_out + m.amount),
                }
            });

    let net_invested = total_cash_in - total_cash_out;
    let absolute_gain = current_networth - net_invested;
    let roi_pct = if net_invested > Decimal::ZERO {
        absolute_gain / net_invested * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };

    let initial_unit_value = series
        .first()
        .map_or(fallback_unit_value, |p| p.unit_value);
    let current_unit_value = series.last().map_or(fallback_unit_value, |p| p.unit_value);

    QuotaMetrics {
        total_cash_in,
        total_cash_out,
        net_invested,
        current_networth,
        absolute_gain,
        roi_pct,
        initial_unit_value,
        current_unit_value,
        performance_pct: percent_change(initial_unit_value, current_unit_value),
        unit_quantity,
    }
}
