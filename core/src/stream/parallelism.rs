// ## 📂 File: `src/stream/parallelism.rs`

use tracing::debug;

use crate::constants::{DEFAULT_MEM_FRACTION, MAX_INFLIGHT_BATCHES};

/// Worker count and in-flight bound for the parallel ECB/CTR pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParallelismProfile {
    pub worker_count: usize,
    pub inflight_batches: usize,
}

impl ParallelismProfile {
    /// Size the pool from the host: one worker per core minus one, and as many
    /// in-flight batches as `mem_fraction` of available memory allows, capped.
    pub fn dynamic(batch_bytes: usize, mem_fraction: f64, hard_cap: usize) -> Self {
        let cores = num_cpus::get();
        let worker_count = cores.saturating_sub(1).max(1);

        let mut sys = sysinfo::System::new();
        sys.refresh_memory();
        let avail_bytes = sys.available_memory();
        let budget = (avail_bytes as f64 * mem_fraction) as u64;

        // Each batch is held twice at most: once queued for a worker, once queued for the writer.
        let per_batch = (batch_bytes as u64).saturating_mul(2).max(1);
        let inflight = (budget / per_batch).clamp(1, hard_cap.max(1) as u64) as usize;

        debug!(worker_count, inflight, avail_bytes, "parallelism profile");
        Self { worker_count, inflight_batches: inflight }
    }

    /// Profile for `batch_bytes`, honouring an explicit worker count if one is configured.
    pub fn for_config(batch_bytes: usize, workers: Option<usize>) -> Self {
        let mut profile = Self::dynamic(batch_bytes, DEFAULT_MEM_FRACTION, MAX_INFLIGHT_BATCHES);
        if let Some(n) = workers {
            profile.worker_count = n.max(1);
        }
        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_profile_is_bounded() {
        let p = ParallelismProfile::dynamic(1024 * 1024, 0.25, 8);
        assert!(p.worker_count >= 1);
        assert!((1..=8).contains(&p.inflight_batches));
    }

    #[test]
    fn explicit_workers_win() {
        let p = ParallelismProfile::for_config(4096, Some(3));
        assert_eq!(p.worker_count, 3);
    }
}
