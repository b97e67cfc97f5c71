// src/pool.rs

use std::io;

use parking_lot::Mutex;
use rayon::prelude::*;

use crate::error::{Error, Result};

/// What a pool stage produced: the order-independent output multiset plus
/// how many items were dropped by soft failures.
#[derive(Debug)]
pub struct StageOutcome<O> {
    pub outputs: Vec<O>,
    pub failed: usize,
}

/// Default worker bound: available hardware parallelism.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Applies `op` to every item with at most `worker_count` jobs in flight.
///
/// Output order is not guaranteed. One item's failure never aborts siblings:
/// soft failures are recorded and the item is dropped from the output set.
/// Fatal failures (see [`Error::is_fatal`]) abort the stage, but only after
/// every scheduled item has drained, so no child process is left behind.
pub fn map_jobs<I, O, F>(items: Vec<I>, worker_count: usize, op: F) -> Result<StageOutcome<O>>
where
    I: Send,
    O: Send,
    F: Fn(I) -> Result<O> + Send + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(worker_count.max(1))
        .build()
        .map_err(|e| Error::Io(io::Error::other(e)))?;

    let failures: Mutex<Vec<Error>> = Mutex::new(Vec::new());
    let outputs: Vec<O> = pool.install(|| {
        items
            .into_par_iter()
            .filter_map(|item| match op(item) {
                Ok(out) => Some(out),
                Err(err) => {
                    failures.lock().push(err);
                    None
                }
            })
            .collect()
    });

    let mut failures = failures.into_inner();
    if let Some(pos) = failures.iter().position(Error::is_fatal) {
        return Err(failures.swap_remove(pos));
    }
    for err in &failures {
        log::warn!("job failed: {err}");
    }

    Ok(StageOutcome {
        outputs,
        failed: failures.len(),
    })
}
