//! # Emerge Workers
//!
//! A pool of generator threads fed through channels.
//!
//! ```text
//!            submit()                         recv()/try_recv()
//!   caller ───────────► [requests] ──► worker 0 (Mapgen) ──► [results] ──► caller
//!                                 ├──► worker 1 (Mapgen) ──┤
//!                                 └──► worker N (Mapgen) ──┘
//!            recycle() ─► [buffer pool] ─► reused by the next chunk
//! ```
//!
//! Every worker owns its own [`Mapgen`], so nothing is shared while a chunk
//! is being generated. Results arrive in completion order, not submission
//! order. Only the statistics are shared, behind a `parking_lot` mutex.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use parking_lot::Mutex;
use strata_core::{ContentRegistry, VoxelBuffer};

use crate::error::{MapgenError, MapgenResult};
use crate::mapgen::{ChunkRequest, ChunkResult, Mapgen};
use crate::params::{MapgenParams, VariantParams};

/// Worker pool configuration.
#[derive(Clone, Debug)]
pub struct EmergeConfig {
    /// Generator threads.
    pub workers: usize,
    /// Pending requests before `submit` blocks.
    pub queue_capacity: usize,
    /// Recycled buffers kept for reuse.
    pub buffer_pool: usize,
}

impl Default for EmergeConfig {
    fn default() -> Self {
        let workers = thread::available_parallelism().map_or(1, |n| n.get().saturating_sub(1).max(1));
        Self {
            workers,
            queue_capacity: 256,
            buffer_pool: workers * 2,
        }
    }
}

/// Counters shared by all workers.
#[derive(Clone, Debug, Default)]
pub struct EmergeStats {
    /// Requests accepted.
    pub submitted: u64,
    /// Chunks generated.
    pub completed: u64,
    /// Requests that failed.
    pub failed: u64,
    /// Buffers returned for reuse.
    pub recycled: u64,
    /// Chunks that reused a recycled buffer.
    pub reused: u64,
    /// Total generation time (nanoseconds).
    pub total_gen_time_ns: u64,
    /// Average generation time per chunk (microseconds).
    pub avg_gen_time_us: f64,
}

/// Channels and handles of a running pool.
pub struct EmergeManager {
    requests: Option<Sender<ChunkRequest>>,
    results: Receiver<MapgenResult<ChunkResult>>,
    pool_tx: Sender<VoxelBuffer>,
    workers: Vec<JoinHandle<()>>,
    stats: Arc<Mutex<EmergeStats>>,
}

impl EmergeManager {
    /// Builds one generator per worker and starts the threads.
    ///
    /// # Errors
    ///
    /// Whatever [`Mapgen::new`] reports; no thread is started in that case.
    pub fn start(
        config: &EmergeConfig,
        params: &MapgenParams,
        variant: &VariantParams,
        registry: &ContentRegistry,
    ) -> MapgenResult<Self> {
        let count = config.workers.max(1);
        let mapgens = (0..count)
            .map(|_| Mapgen::new(params.clone(), variant.clone(), registry))
            .collect::<MapgenResult<Vec<_>>>()?;

        let (request_tx, request_rx) = bounded::<ChunkRequest>(config.queue_capacity.max(1));
        let (result_tx, result_rx) = unbounded();
        let (pool_tx, pool_rx) = bounded::<VoxelBuffer>(config.buffer_pool.max(1));
        let stats = Arc::new(Mutex::new(EmergeStats::default()));

        let workers = mapgens
            .into_iter()
            .enumerate()
            .map(|(id, mapgen)| {
                let requests = request_rx.clone();
                let results = result_tx.clone();
                let pool = pool_rx.clone();
                let stats = Arc::clone(&stats);
                thread::spawn(move || worker_loop(id, mapgen, &requests, &results, &pool, &stats))
            })
            .collect();

        tracing::info!("emerge started: {count} workers, variant {}", params.variant.name());

        Ok(Self {
            requests: Some(request_tx),
            results: result_rx,
            pool_tx,
            workers,
            stats,
        })
    }

    /// Number of worker threads.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Queues a request. Blocks while the queue is full.
    ///
    /// # Errors
    ///
    /// [`MapgenError::WorkerGone`] if every worker has exited.
    pub fn submit(&self, request: ChunkRequest) -> MapgenResult<()> {
        let requests = self.requests.as_ref().ok_or(MapgenError::WorkerGone)?;
        requests.send(request).map_err(|_| MapgenError::WorkerGone)?;
        self.stats.lock().submitted += 1;
        Ok(())
    }

    /// Waits for the next finished chunk.
    ///
    /// # Errors
    ///
    /// The chunk's own error, or [`MapgenError::WorkerGone`] if every worker
    /// has exited.
    pub fn recv(&self) -> MapgenResult<ChunkResult> {
        self.results.recv().map_err(|_| MapgenError::WorkerGone)?
    }

    /// Waits up to `timeout` for the next finished chunk.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<MapgenResult<ChunkResult>> {
        match self.results.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(MapgenError::WorkerGone)),
        }
    }

    /// Next finished chunk, if one is ready.
    pub fn try_recv(&self) -> Option<MapgenResult<ChunkResult>> {
        match self.results.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(MapgenError::WorkerGone)),
        }
    }

    /// Returns a buffer for reuse. Dropped if the pool is full.
    pub fn recycle(&self, buffer: VoxelBuffer) {
        if self.pool_tx.try_send(buffer).is_ok() {
            self.stats.lock().recycled += 1;
        }
    }

    /// Snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> EmergeStats {
        self.stats.lock().clone()
    }

    /// Stops accepting requests, lets the workers drain the queue, and joins
    /// them. Results already produced stay readable.
    pub fn shutdown(&mut self) {
        if self.requests.take().is_none() {
            return;
        }
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("emerge worker panicked");
            }
        }
        let stats = self.stats();
        tracing::info!(
            "emerge stopped: {} completed, {} failed, avg {:.0}us per chunk",
            stats.completed,
            stats.failed,
            stats.avg_gen_time_us
        );
    }
}

impl Drop for EmergeManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[allow(clippy::cast_precision_loss)]
fn worker_loop(
    id: usize,
    mut mapgen: Mapgen,
    requests: &Receiver<ChunkRequest>,
    results: &Sender<MapgenResult<ChunkResult>>,
    pool: &Receiver<VoxelBuffer>,
    stats: &Mutex<EmergeStats>,
) {
    tracing::info!("emerge worker {id} started");

    while let Ok(request) = requests.recv() {
        let recycled = pool.try_recv().ok();
        let reused = recycled.is_some();
        let start = Instant::now();
        let result = mapgen.make_chunk_into(&request, recycled.unwrap_or_default());
        let elapsed = u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX);

        {
            let mut s = stats.lock();
            match &result {
                Ok(_) => s.completed += 1,
                Err(e) => {
                    s.failed += 1;
                    tracing::debug!("chunk {} failed: {e}", request.blockpos_min);
                }
            }
            if reused {
                s.reused += 1;
            }
            s.total_gen_time_ns += elapsed;
            let done = s.completed + s.failed;
            s.avg_gen_time_us = s.total_gen_time_ns as f64 / done as f64 / 1000.0;
        }

        if results.send(result).is_err() {
            break;
        }
    }

    tracing::info!("emerge worker {id} stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::Vec3i;

    fn start(workers: usize) -> EmergeManager {
        let params = MapgenParams {
            chunk_size: 1,
            seed: 11,
            ..MapgenParams::default()
        };
        let variant = VariantParams::defaults_for(params.variant);
        let config = EmergeConfig {
            workers,
            queue_capacity: 8,
            buffer_pool: 4,
        };
        EmergeManager::start(&config, &params, &variant, &ContentRegistry::with_defaults()).unwrap()
    }

    #[test]
    fn test_results_for_every_request() {
        let emerge = start(3);
        assert_eq!(emerge.worker_count(), 3);
        let mut wanted: Vec<Vec3i> = (0..6).map(|i| Vec3i::new(i, -1, 0)).collect();
        for &p in &wanted {
            emerge.submit(ChunkRequest::new(p, 1, 11)).unwrap();
        }
        let mut got: Vec<Vec3i> = (0..6).map(|_| emerge.recv().unwrap().request.blockpos_min).collect();
        got.sort_by_key(|p| p.x);
        wanted.sort_by_key(|p| p.x);
        assert_eq!(got, wanted);

        let stats = emerge.stats();
        assert_eq!(stats.submitted, 6);
        assert_eq!(stats.completed, 6);
        assert_eq!(stats.failed, 0);
    }

    #[test]
    fn test_errors_are_delivered() {
        let emerge = start(1);
        emerge
            .submit(ChunkRequest::new(Vec3i::new(5000, 0, 0), 1, 11))
            .unwrap();
        assert!(matches!(emerge.recv(), Err(MapgenError::OutOfLimits(_))));
        assert_eq!(emerge.stats().failed, 1);
    }

    #[test]
    fn test_recycled_buffers_are_reused() {
        let emerge = start(1);
        emerge.submit(ChunkRequest::new(Vec3i::new(0, -1, 0), 1, 11)).unwrap();
        let first = emerge.recv().unwrap();
        emerge.recycle(first.buffer);
        emerge.submit(ChunkRequest::new(Vec3i::new(1, -1, 0), 1, 11)).unwrap();
        emerge.recv().unwrap();
        let stats = emerge.stats();
        assert_eq!(stats.recycled, 1);
        assert_eq!(stats.reused, 1);
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let mut emerge = start(2);
        emerge.shutdown();
        emerge.shutdown();
        assert!(matches!(
            emerge.submit(ChunkRequest::new(Vec3i::ZERO, 1, 11)),
            Err(MapgenError::WorkerGone)
        ));
        assert!(matches!(emerge.try_recv(), Some(Err(MapgenError::WorkerGone))));
    }

    #[test]
    fn test_try_recv_empty() {
        let emerge = start(1);
        assert!(emerge.try_recv().is_none());
        assert!(emerge.recv_timeout(Duration::from_millis(1)).is_none());
    }
}
