//! Runtime loop with tick phases and timing enforcement.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use course_db_core::config::DbConfig;
use course_db_core::database::Database;
use course_db_core::error::DbError;
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};

use crate::api_handlers::ApiHandlers;
use crate::api_request::{ApiRequest, FlushCommand};

/// Share of each tick spent answering API requests.
const API_PHASE_SHARE: f32 = 0.3;

/// Counters exposed for monitoring and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    /// Requests executed
    pub processed: u64,
    /// Requests rejected because the queue was full
    pub dropped: u64,
    /// Flush commands handed to the persistence thread
    pub flushes_requested: u64,
}

/// Main runtime loop
pub struct Runtime {
    /// Database instance
    database: Arc<Database>,
    /// Configuration
    config: DbConfig,
    /// Tick duration
    tick_duration: Duration,
    /// API request receiver
    api_rx: mpsc::Receiver<ApiRequest>,
    /// Pending requests in arrival order
    queue: VecDeque<ApiRequest>,
    /// Maximum queue capacity (tickrate * 100)
    queue_capacity: usize,
    /// Persistence channel sender
    persistence_tx: mpsc::Sender<FlushCommand>,
    /// API handlers
    api_handlers: ApiHandlers,
    /// Current tick count
    tick_count: u64,
    /// Every request sender has been dropped
    disconnected: bool,
    stats: RuntimeStats,
}

impl Runtime {
    /// Create a new runtime
    pub fn new(
        database: Arc<Database>,
        config: DbConfig,
        api_rx: mpsc::Receiver<ApiRequest>,
        persistence_tx: mpsc::Sender<FlushCommand>,
    ) -> Self {
        let tickrate = config.tickrate.max(1);
        let tick_duration = Duration::from_secs_f64(1.0 / tickrate as f64);
        let queue_capacity = tickrate as usize * 100;

        Self {
            api_handlers: ApiHandlers::new(database.clone()),
            database,
            config,
            tick_duration,
            api_rx,
            queue: VecDeque::new(),
            queue_capacity,
            persistence_tx,
            tick_count: 0,
            disconnected: false,
            stats: RuntimeStats::default(),
        }
    }

    /// Get queue size for testing
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Returns a copy of the runtime counters.
    pub fn stats(&self) -> RuntimeStats {
        self.stats
    }

    /// True once all senders are gone and the queue is drained.
    pub fn is_finished(&self) -> bool {
        self.disconnected && self.queue.is_empty()
    }

    /// Execute a single tick of the runtime
    pub fn tick(&mut self) {
        let tick_start = Instant::now();

        // Phase 1: API requests
        self.process_api_phase(tick_start);

        // Phase 2: Persistence
        self.process_persistence_phase();

        // Sleep remainder of tick
        self.sleep_remaining(tick_start);

        self.tick_count += 1;
    }

    /// Run the runtime loop (blocking) until every request sender is dropped.
    ///
    /// Pending changes are handed to the persistence thread before returning.
    pub fn run(&mut self) {
        tracing::info!(
            "Runtime started at {} Hz (queue capacity {})",
            self.config.tickrate,
            self.queue_capacity
        );
        while !self.is_finished() {
            self.tick();
        }
        if self.database.take_dirty() {
            self.request_flush();
        }
        tracing::info!(
            "Runtime stopped after {} ticks: processed={}, dropped={}",
            self.tick_count,
            self.stats.processed,
            self.stats.dropped
        );
    }

    /// Time each tick may spend answering API requests.
    pub fn api_time_budget(&self) -> Duration {
        self.tick_duration.mul_f32(API_PHASE_SHARE)
    }

    /// Process API phase
    pub fn process_api_phase(&mut self, tick_start: Instant) {
        let api_time_budget = self.api_time_budget();

        // Drain incoming channel into the queue
        self.drain_api_channel();

        // Process queued requests respecting time budget and rate limit
        self.process_queued_requests(tick_start, api_time_budget);
    }

    /// Process persistence phase
    ///
    /// Every `persistence_interval_ticks` ticks, schedules a flush if anything changed.
    pub fn process_persistence_phase(&mut self) {
        let interval = u64::from(self.config.persistence_interval_ticks.max(1));
        if !self.tick_count.is_multiple_of(interval) {
            return;
        }
        if self.database.take_dirty() {
            self.request_flush();
        }
    }

    /// Drain API channel into the queue, respecting capacity.
    fn drain_api_channel(&mut self) {
        loop {
            match self.api_rx.try_recv() {
                Ok(req) => {
                    if self.queue.len() >= self.queue_capacity {
                        self.stats.dropped += 1;
                        tracing::warn!(
                            "Request queue full ({}), dropping request",
                            self.queue_capacity
                        );
                        req.reject(DbError::QueueFull {
                            capacity: self.queue_capacity,
                        });
                        continue;
                    }
                    self.queue.push_back(req);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        tracing::debug!("All request senders dropped");
                    }
                    self.disconnected = true;
                    break;
                }
            }
        }
    }

    /// Process queued API requests up to limit and time budget.
    fn process_queued_requests(&mut self, tick_start: Instant, time_budget: Duration) {
        let max_requests = self.config.max_api_requests_per_tick;
        let mut processed = 0;

        while processed < max_requests {
            if tick_start.elapsed() > time_budget {
                break;
            }
            let Some(req) = self.queue.pop_front() else {
                break;
            };
            self.api_handlers.handle_api_request(req);
            processed += 1;
        }

        self.stats.processed += u64::from(processed);
    }

    /// Hands a flush to the persistence thread.
    ///
    /// A full channel already holds a pending flush, which will see the
    /// current table contents when it runs.
    fn request_flush(&mut self) {
        match self.persistence_tx.try_send(FlushCommand::FlushAll) {
            Ok(()) => {
                self.stats.flushes_requested += 1;
                tracing::debug!("Requested flush at tick {}", self.tick_count);
            }
            Err(TrySendError::Full(_)) => {
                tracing::debug!("Flush already pending at tick {}", self.tick_count);
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!("Persistence channel closed; changes will not be flushed");
            }
        }
    }

    /// Sleep remaining tick time
    fn sleep_remaining(&self, tick_start: Instant) {
        if self.is_finished() {
            return;
        }
        if let Some(remaining) = self.tick_duration.checked_sub(tick_start.elapsed()) {
            std::thread::sleep(remaining);
        }
    }
}
