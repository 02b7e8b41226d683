//! Concurrency management for pli-impact.
//! Sizes the rayon pool used for per-file procedure extraction.

use anyhow::Result;
use tracing::info;

/// Worker count for a machine with `cores` CPUs. An explicit request wins;
/// otherwise half the cores are used. Never below one.
pub fn worker_count(requested: Option<usize>, cores: usize) -> usize {
    requested.unwrap_or(cores / 2).max(1)
}

/// Initialize the global rayon thread pool. Returns the worker count.
pub fn init_thread_pool(requested: Option<usize>) -> Result<usize> {
    let cores = num_cpus::get();
    let workers = worker_count(requested, cores);

    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build_global()?;

    info!(workers, cores, "initialized extraction thread pool");

    Ok(workers)
}
