//! End-to-end tests for the adaptive range splitter, including the
//! interaction between its two independent retry layers.

mod common;

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use common::{CollectingTelemetry, tx, tx_key, tx_order};
use range_fetcher::{FetchError, RangeSpec, RangeSplitter, RetryPolicy};
use serde_json::Value;

/// Provider yielding two transactions per block, truncated at `cap` items
/// per call the way capped explorers truncate.
fn capped_tx_spec(cap: usize) -> RangeSpec<Value> {
    RangeSpec::new(
        "txlist",
        move |start, end| {
            let mut items = Vec::new();
            'blocks: for block in start..=end {
                for index in 0..2 {
                    if items.len() >= cap {
                        break 'blocks;
                    }
                    items.push(tx(&format!("0x{block:x}_{index}"), block, index));
                }
            }
            async move { Ok(items) }
        },
        tx_key,
        tx_order,
    )
}

#[tokio::test]
async fn capped_backfill_recovers_every_transaction() -> anyhow::Result<()> {
    let splitter = RangeSplitter::builder(20).min_range_width(1).build()?;

    // 200 blocks of 2 txs against a 20-item cap forces repeated splitting
    let outcome = splitter.fetch_all(&capped_tx_spec(20), 0, 199).await?;

    assert_eq!(outcome.len(), 400);
    let order: Vec<_> = outcome.items.iter().map(|t| tx_order(t).unwrap()).collect();
    let mut sorted = order.clone();
    sorted.sort_unstable();
    assert_eq!(order, sorted, "result must be non-decreasing under the order function");
    assert!(outcome.stats.ranges_split > 0);
    assert!(!outcome.is_partial());
    Ok(())
}

/// The retry policy re-runs a single call on transient errors; the per-range
/// attempt budget re-enqueues the whole range. A range that always fails is
/// therefore attempted `retries-per-call x attempts-per-range` times before
/// it is dropped.
#[tokio::test(start_paused = true)]
async fn retry_layers_multiply_before_a_range_is_dropped() -> anyhow::Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let spec = {
        let calls = Arc::clone(&calls);
        RangeSpec::new(
            "txlist",
            move |_start, _end| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(FetchError::provider_msg("status 502")) }
            },
            tx_key,
            tx_order,
        )
    };

    let splitter = RangeSplitter::builder(10)
        .edges_first(false)
        .max_attempts_per_range(2)
        .retry_policy(RetryPolicy::new().max_retries(1).min_delay(Duration::from_millis(5)))
        .build()?;

    let outcome = splitter.fetch_all(&spec, 0, 1_000).await?;

    // 2 calls per gated attempt (initial + 1 retry), 2 range attempts
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(outcome.stats.ranges_failed, 1);
    assert_eq!(outcome.stats.ranges_retried, 1);
    assert!(outcome.is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_subrange_is_excluded_but_the_rest_survives() -> anyhow::Result<()> {
    let telemetry = Arc::new(CollectingTelemetry::default());
    // blocks 0-49 sit on a permanently failing shard; 50-99 are fine. The
    // full range saturates at the cap, so the splitter bisects it first.
    let spec = RangeSpec::new(
        "txlist",
        move |start, end| {
            let result = if start == 0 && end == 99 {
                Ok((start..=end).map(|b| tx(&format!("0x{b:x}"), b, 0)).collect())
            } else if start < 50 {
                Err(FetchError::provider_msg("shard down"))
            } else {
                Ok((start..=end).map(|b| tx(&format!("0x{b:x}"), b, 0)).collect())
            };
            async move { result }
        },
        tx_key,
        tx_order,
    );

    let splitter = RangeSplitter::builder(100)
        .edges_first(false)
        .min_range_width(50)
        .max_attempts_per_range(2)
        .telemetry(telemetry.clone())
        .build()?;

    let outcome = splitter.fetch_all(&spec, 0, 99).await?;

    // the healthy half is complete, the dead half is accounted for
    let blocks: Vec<u64> = outcome.items.iter().map(|t| tx_order(t).unwrap().0).collect();
    assert_eq!(blocks, (50..=99).collect::<Vec<u64>>());
    assert_eq!(outcome.stats.ranges_failed, 1);
    assert!(outcome.is_partial());
    assert!(telemetry.errors().contains(&"range_failed".to_string()));
    Ok(())
}

#[tokio::test]
async fn floor_saturation_is_surfaced_through_telemetry() -> anyhow::Result<()> {
    let telemetry = Arc::new(CollectingTelemetry::default());
    let splitter = RangeSplitter::builder(10)
        .min_range_width(1_000)
        .edges_first(false)
        .telemetry(telemetry.clone())
        .build()?;

    // the whole range is narrower than the floor, so the saturated response
    // is accepted as-is
    let outcome = splitter.fetch_all(&capped_tx_spec(10), 0, 99).await?;

    assert_eq!(outcome.len(), 10);
    assert_eq!(outcome.stats.ranges_saturated_at_floor, 1);
    assert!(outcome.is_partial());
    let events = telemetry.events();
    assert!(events.contains(&"range_saturated_at_floor".to_string()));
    assert!(events.contains(&"splitter_completed".to_string()));
    Ok(())
}

#[tokio::test]
async fn wide_backfill_with_edge_kickoff_is_complete() -> anyhow::Result<()> {
    // sparse data: one tx every 1_000 blocks, never saturating
    let spec = RangeSpec::new(
        "txlist",
        |start, end| {
            let items: Vec<Value> = (start..=end)
                .filter(|b| b % 1_000 == 0)
                .map(|b| tx(&format!("0x{b:x}"), b, 0))
                .collect();
            async move { Ok(items) }
        },
        tx_key,
        tx_order,
    );

    let splitter = RangeSplitter::builder(10_000).build()?;
    let outcome = splitter.fetch_all(&spec, 0, 400_000).await?;

    assert_eq!(outcome.len(), 401);
    assert_eq!(outcome.stats.ranges_split, 0);
    assert!(!outcome.is_partial());
    Ok(())
}
