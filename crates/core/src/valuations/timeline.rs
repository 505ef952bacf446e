//! Valuation timeline merging.
//!
//! Pure functions that turn raw observations into the canonical per-wallet
//! series and into the forward-filled multi-wallet aggregate. No I/O happens
//! here; the valuation service loads the observations and calls in.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{BTreeMap, BTreeSet};

use super::valuations_model::{
    AggregatedValuationPoint, AggregatedValuationStats, MergedValuationPoint, ValuationObservation,
    ValuationSource,
};
use crate::utils::hour_bucket;

/// Latest observation per hour bucket: bucket -> (raw timestamp, net worth).
type BucketMap = BTreeMap<DateTime<Utc>, (DateTime<Utc>, Decimal)>;

fn bucketize(observations: &[ValuationObservation]) -> BucketMap {
    let mut buckets = BucketMap::new();
    for obs in observations {
        let bucket = hour_bucket(obs.timestamp);
        match buckets.get(&bucket) {
            Some((seen_at, _)) if *seen_at > obs.timestamp => {}
            _ => {
                buckets.insert(bucket, (obs.timestamp, obs.networth));
            }
        }
    }
    buckets
}

/// Merges one wallet's automatic and manual observations into a single series.
///
/// Every timestamp is truncated to its hour. When both provenances have data
/// for the same bucket, the automatic value wins and the manual one is
/// discarded. Within one provenance the observation with the latest raw
/// timestamp represents the bucket. The result is strictly increasing in time.
pub fn merge_observations(
    automatic: &[ValuationObservation],
    manual: &[ValuationObservation],
) -> Vec<MergedValuationPoint> {
    let mut merged: BTreeMap<DateTime<Utc>, MergedValuationPoint> = bucketize(manual)
        .into_iter()
        .map(|(bucket, (_, networth))| {
            (
                bucket,
                MergedValuationPoint {
                    timestamp: bucket,
                    networth,
                    source: ValuationSource::Manual,
                },
            )
        })
        .collect();

    for (bucket, (_, networth)) in bucketize(automatic) {
        merged.insert(
            bucket,
            MergedValuationPoint {
                timestamp: bucket,
                networth,
                source: ValuationSource::Automatic,
            },
        );
    }

    merged.into_values().collect()
}

/// Splits a mixed observation list by provenance and merges it.
pub fn merge_mixed(observations: &[ValuationObservation]) -> Vec<MergedValuationPoint> {
    let (automatic, manual): (Vec<ValuationObservation>, Vec<ValuationObservation>) = observations
        .iter()
        .cloned()
        .partition(|o| o.source == ValuationSource::Automatic);
    merge_observations(&automatic, &manual)
}

/// Returns the last point whose bucket is at or before `at`.
pub fn latest_at_or_before(
    series: &[MergedValuationPoint],
    at: DateTime<Utc>,
) -> Option<&MergedValuationPoint> {
    let idx = series.partition_point(|p| p.timestamp <= at);
    idx.checked_sub(1).map(|i| &series[i])
}

/// Combines several wallets' merged series into one total per bucket.
///
/// A wallet missing data at a bucket contributes its last known value.
/// Wallets with no value yet are absent from both the sum and
/// `wallet_count`; they are never counted as zero.
pub fn aggregate_series(per_wallet: &[Vec<MergedValuationPoint>]) -> Vec<AggregatedValuationPoint> {
    let buckets: BTreeSet<DateTime<Utc>> = per_wallet
        .iter()
        .flat_map(|series| series.iter().map(|p| p.timestamp))
        .collect();

    let mut cursors = vec![0usize; per_wallet.len()];
    let mut last_known: Vec<Option<Decimal>> = vec![None; per_wallet.len()];
    let mut aggregated = Vec::with_capacity(buckets.len());

    for bucket in buckets {
        for (i, series) in per_wallet.iter().enumerate() {
            while let Some(point) = series.get(cursors[i]) {
                if point.timestamp > bucket {
                    break;
                }
                last_known[i] = Some(point.networth);
                cursors[i] += 1;
            }
        }

        let (networth, wallet_count) = last_known
            .iter()
            .flatten()
            .fold((Decimal::ZERO, 0usize), |(sum, count), value| {
                (sum + *value, count + 1)
            });

        if wallet_count > 0 {
            aggregated.push(AggregatedValuationPoint {
                timestamp: bucket,
                networth,
                wallet_count,
            });
        }
    }

    aggregated
}

/// Summary statistics over an aggregated series, `None` when it is empty.
pub fn aggregate_stats(series: &[AggregatedValuationPoint]) -> Option<AggregatedValuationStats> {
    let first = series.first()?;
    let last = series.last()?;
    let change = last.networth - first.networth;
    let change_percent = if first.networth > Decimal::ZERO {
        change / first.networth * dec!(100)
    } else {
        Decimal::ZERO
    };

    Some(AggregatedValuationStats {
        current: last.networth,
        initial: first.networth,
        change,
        change_percent,
        data_points: series.len(),
    })
}
