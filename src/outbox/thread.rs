//! Background thread running the outbox publisher loop.

use std::sync::mpsc::{channel, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::bus::Publisher;

use super::{OutboxStore, OutboxWorker};

/// Counters accumulated over the worker's lifetime.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    pub cycles: usize,
    pub skipped_cycles: usize,
    pub published: usize,
    pub released: usize,
    pub failed: usize,
}

/// One dedicated publisher loop per service instance.
///
/// ## Example
///
/// ```ignore
/// let worker = OutboxWorker::new(queue.clone(), "booking");
/// let thread = OutboxWorkerThread::spawn(store.clone(), worker, Duration::from_millis(20));
///
/// // ... handle commands ...
///
/// let stats = thread.stop();
/// assert!(stats.published > 0);
/// ```
pub struct OutboxWorkerThread {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<WorkerStats>>,
}

impl OutboxWorkerThread {
    /// Spawn the polling loop. The store handle must be cloneable; for
    /// `MemoryStore` a clone is another handle onto the same storage.
    pub fn spawn<R, P>(store: R, worker: OutboxWorker<P>, poll_interval: Duration) -> Self
    where
        R: OutboxStore + Send + 'static,
        P: Publisher + 'static,
    {
        let (stop_tx, stop_rx) = channel();

        let handle = thread::spawn(move || {
            let mut stats = WorkerStats::default();

            loop {
                match stop_rx.try_recv() {
                    Ok(()) | Err(TryRecvError::Disconnected) => break,
                    Err(TryRecvError::Empty) => {}
                }

                stats.cycles += 1;
                match worker.run_cycle(&store) {
                    Ok(result) => {
                        if result.skipped {
                            stats.skipped_cycles += 1;
                        }
                        stats.published += result.published;
                        stats.released += result.released;
                        stats.failed += result.failed;
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "outbox store error, continuing to poll");
                    }
                }

                thread::sleep(poll_interval);
            }

            stats
        });

        Self {
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Signal the loop to stop and wait for it, returning the stats.
    pub fn stop(mut self) -> WorkerStats {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.handle.take() {
            handle.join().unwrap_or_default()
        } else {
            WorkerStats::default()
        }
    }

    /// Signal the loop to stop without waiting.
    pub fn signal_stop(&self) {
        let _ = self.stop_tx.send(());
    }
}

impl Drop for OutboxWorkerThread {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
        // No join on drop; the thread winds down on its own.
    }
}
