//! Test and helper mocks for trackbench_core.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use trackbench_traits::{AccuracySource, CalibrationStore, Channel};

/// Accuracy source whose levels are set from another thread.
///
/// Channels never set read as 0 (unreliable).
#[derive(Debug, Clone, Default)]
pub struct SharedLevels {
    levels: Arc<Mutex<BTreeMap<Channel, u8>>>,
}

impl SharedLevels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, channel: Channel, level: u8) {
        if let Ok(mut m) = self.levels.lock() {
            m.insert(channel, level);
        }
    }

    pub fn set_all(&self, level: u8) {
        for ch in Channel::ALL {
            self.set(ch, level);
        }
    }
}

impl AccuracySource for SharedLevels {
    fn read_level(
        &mut self,
        channel: Channel,
    ) -> Result<u8, Box<dyn std::error::Error + Send + Sync>> {
        let m = self
            .levels
            .lock()
            .map_err(|_| std::io::Error::other("levels lock poisoned"))?;
        Ok(m.get(&channel).copied().unwrap_or(0))
    }
}

/// A source that always errors; useful for stall and deadline paths.
pub struct DeadSource;

impl AccuracySource for DeadSource {
    fn read_level(
        &mut self,
        _channel: Channel,
    ) -> Result<u8, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("dead source")))
    }
}

/// Store that counts `save` calls; clones share the counter.
#[derive(Debug, Clone, Default)]
pub struct CountingStore {
    saves: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl CalibrationStore for CountingStore {
    fn save(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Store whose save always fails.
pub struct FailingStore;

impl CalibrationStore for FailingStore {
    fn save(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("flash write rejected")))
    }
}
