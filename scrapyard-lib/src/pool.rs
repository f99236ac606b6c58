//! Worker pool for one scrape run.
//!
//! Spawns one tokio task per adapter. All workers pull from the same
//! [`WorkQueue`](crate::queue::WorkQueue) and report on one unbounded
//! channel, so the caller can render progress while the run is going.
//!
//! ```ignore
//! let mut pool = ScrapePool::start(adapters, ctx);
//! while let Some(event) = pool.recv().await {
//!     handle(event);
//! }
//! ```

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::adapter::SourceAdapter;
use crate::engine::{EngineContext, StopReason, Worker, WorkerEvent};

pub struct ScrapePool {
    event_rx: mpsc::UnboundedReceiver<WorkerEvent>,
    workers: usize,
    _handles: Vec<JoinHandle<StopReason>>,
}

impl ScrapePool {
    /// Start one worker per adapter.
    pub fn start(adapters: Vec<Box<dyn SourceAdapter>>, ctx: EngineContext) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let workers = adapters.len();

        let handles = adapters
            .into_iter()
            .enumerate()
            .map(|(index, adapter)| {
                let worker = Worker::new(index, adapter, ctx.clone(), event_tx.clone());
                tokio::spawn(worker.run())
            })
            .collect();

        // Drop our sender so the channel closes when the last worker exits
        drop(event_tx);
        log::debug!("Started {} worker(s)", workers);

        Self {
            event_rx,
            workers,
            _handles: handles,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers
    }

    /// Next event, or `None` once every worker has finished.
    pub async fn recv(&mut self) -> Option<WorkerEvent> {
        self.event_rx.recv().await
    }

    /// Drain all events and return every worker's stop reason, indexed by
    /// worker.
    pub async fn run_to_end(mut self, mut on_event: impl FnMut(&WorkerEvent)) -> Vec<StopReason> {
        let mut reasons = vec![StopReason::QueueDrained; self.workers];
        while let Some(event) = self.recv().await {
            on_event(&event);
            if let WorkerEvent::Finished { worker, reason, .. } = event {
                if let Some(slot) = reasons.get_mut(worker) {
                    *slot = reason;
                }
            }
        }
        reasons
    }
}
