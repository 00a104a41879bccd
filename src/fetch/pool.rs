//! Bounded concurrent fetcher
//!
//! Fans a list of independent units out over at most `workers` in-flight
//! futures and reassembles the survivors in input order. Completion order
//! never leaks into the result: each unit writes into the slot of its input
//! index, and a failed unit leaves its slot empty.

use futures::stream::{self, StreamExt};
use std::fmt::Display;
use std::future::Future;
use tracing::{debug, warn};

/// Runs `unit` over every input with at most `workers` units in flight
///
/// # Arguments
///
/// * `inputs` - Ordered work descriptors; the order encodes ranking
/// * `workers` - Pool size (values below 1 are treated as 1)
/// * `label` - Short description of the batch, used in log lines
/// * `unit` - Produces the future for one descriptor
///
/// # Returns
///
/// The successful results, ordered by input index. Failures are logged and
/// dropped; they never cancel or delay their siblings. Every unit future is
/// owned by this call, so nothing keeps running once it returns.
pub async fn fetch_ordered<I, T, E, F, Fut>(inputs: I, workers: usize, label: &str, unit: F) -> Vec<T>
where
    I: IntoIterator,
    F: Fn(I::Item) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let inputs: Vec<I::Item> = inputs.into_iter().collect();
    let total = inputs.len();
    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(total).collect();

    let mut completions = stream::iter(inputs.into_iter().enumerate())
        .map(|(index, input)| {
            let pending = unit(input);
            async move { (index, pending.await) }
        })
        .buffer_unordered(workers.max(1));

    let mut failed = 0usize;
    while let Some((index, outcome)) = completions.next().await {
        match outcome {
            Ok(value) => slots[index] = Some(value),
            Err(e) => {
                failed += 1;
                warn!(batch = label, index, error = %e, "Fetch unit failed; skipping");
            }
        }
    }

    debug!(batch = label, total, failed, "Batch complete");
    slots.into_iter().flatten().collect()
}
