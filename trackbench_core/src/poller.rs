//! Background accuracy polling.
//!
//! Spawns a thread that owns the `AccuracySource`, reads every monitored
//! channel once per period, and pushes the snapshot through a one-slot channel.
//! An unread snapshot is replaced by the next one, so the consumer only ever
//! sees the newest pass.
//! The thread is the single writer, so concurrent sensor access is serialized
//! here and the monitor only ever sees whole snapshots.
//!
//! Each `LevelPoller` spawns exactly one thread, shut down and joined when the
//! poller is dropped.
use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use trackbench_traits::clock::Clock;
use trackbench_traits::{AccuracySource, Channel};

/// Levels of all monitored channels read in one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelsReading {
    /// Poller-relative milliseconds at which the pass finished.
    pub at_ms: u64,
    pub levels: Vec<(Channel, u8)>,
}

pub struct LevelPoller {
    rx: xch::Receiver<LevelsReading>,
    last_ok: Arc<AtomicU64>,
    read_errors: Arc<AtomicU64>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl LevelPoller {
    pub fn spawn<S, C>(mut source: S, channels: Vec<Channel>, period: Duration, clock: C) -> Self
    where
        S: AccuracySource + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let (tx, rx) = xch::bounded(1);
        let stale = rx.clone();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let last_ok = Arc::new(AtomicU64::new(0));
        let last_ok_clone = last_ok.clone();
        let read_errors = Arc::new(AtomicU64::new(0));
        let read_errors_clone = read_errors.clone();
        let epoch: Instant = clock.now();

        let join_handle = std::thread::spawn(move || {
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("level poller received shutdown signal");
                    break;
                }

                let mut levels = Vec::with_capacity(channels.len());
                let mut failed = false;
                for &ch in &channels {
                    match source.read_level(ch) {
                        Ok(level) => levels.push((ch, level)),
                        Err(e) => {
                            tracing::warn!(channel = %ch, error = %e, "accuracy read failed");
                            read_errors_clone.fetch_add(1, Ordering::Relaxed);
                            failed = true;
                            break;
                        }
                    }
                }

                if !failed {
                    let at_ms = clock.ms_since(epoch);
                    let reading = LevelsReading { at_ms, levels };
                    // This thread is the only sender, so after evicting the
                    // unread snapshot the retry always finds the slot free.
                    if let Err(xch::TrySendError::Full(reading)) = tx.try_send(reading) {
                        let _ = stale.try_recv();
                        let _ = tx.try_send(reading);
                    }
                    last_ok_clone.store(at_ms, Ordering::Relaxed);
                }

                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                clock.sleep(period);
            }
            tracing::trace!("level poller exiting cleanly");
        });

        Self {
            rx,
            last_ok,
            read_errors,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Newest snapshot, if one arrived since the last call.
    pub fn latest(&self) -> Option<LevelsReading> {
        self.rx.try_iter().last()
    }

    /// Block up to `timeout` for the next snapshot.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<LevelsReading> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Milliseconds since the last complete pass, relative to `now_ms`.
    pub fn stalled_for(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_ok.load(Ordering::Relaxed))
    }

    /// Number of failed channel reads so far.
    pub fn read_errors(&self) -> u64 {
        self.read_errors.load(Ordering::Relaxed)
    }
}

impl Drop for LevelPoller {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("level poller joined");
                }
                Err(e) => {
                    tracing::warn!(?e, "level poller panicked during shutdown");
                }
            }
        }
    }
}
