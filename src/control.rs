//! Control surface: the configuration options a controller reads and
//! writes, plus the `active-pad` change notification.

use crate::error::SelectorError;
use crate::media::DownstreamPeer;
use crate::media::Media;
use crate::selector::Selector;

/// Source of the reference running time non-active inputs wait against
/// when `sync_streams` is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Reference is the active input's current position.
    ActiveSegment,
    /// Reference is the pipeline clock, relative to its base time.
    Clock,
}

impl Default for SyncMode {
    fn default() -> Self {
        SyncMode::ActiveSegment
    }
}

/// Selector-wide configuration, mutable only while the selector is not
/// actively forwarding (a host typically enforces this by only calling the
/// setters here in its own ready state).
#[derive(Debug, Clone, Copy)]
pub struct SelectorConfig {
    pub sync_streams: bool,
    pub sync_mode: SyncMode,
    pub cache_buffers: bool,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        SelectorConfig {
            sync_streams: false,
            sync_mode: SyncMode::ActiveSegment,
            cache_buffers: false,
        }
    }
}

impl<M: Media, D: DownstreamPeer<M>> Selector<M, D> {
    pub fn config(&self) -> SelectorConfig {
        self.lock().config
    }

    pub fn set_sync_streams(&self, enabled: bool) {
        self.lock().config.sync_streams = enabled;
    }

    pub fn set_sync_mode(&self, mode: SyncMode) {
        self.lock().config.sync_mode = mode;
    }

    pub fn set_cache_buffers(&self, enabled: bool) {
        self.lock().config.cache_buffers = enabled;
    }

    /// Per-input `always-ok`: when not active, answer `Ok` instead of
    /// `NotLinked` to the producer.
    pub fn set_always_ok(&self, id: u64, enabled: bool) -> Result<(), SelectorError> {
        let mut inner = self.lock();
        match inner.inputs.get_mut(&id) {
            Some(input) => {
                input.always_ok = enabled;
                Ok(())
            }
            None => Err(SelectorError::UnknownInput(id)),
        }
    }

    /// Number of currently registered inputs.
    pub fn n_pads(&self) -> usize {
        self.lock().inputs.len()
    }

    pub fn active_pad(&self) -> Option<u64> {
        self.lock().active
    }

    /// Immediate switch to `target`, with no block required (equivalent
    /// to `switch(target, UNKNOWN, UNKNOWN)`).
    pub fn set_active_pad(&self, target: u64) -> Result<(), SelectorError> {
        let mut inner = self.lock();
        if !inner.inputs.contains_key(&target) {
            return Err(SelectorError::UnknownInput(target));
        }
        let changed = self.perform_switch(&mut inner, target, None, None);
        drop(inner);
        if changed {
            self.notify_active_changed(Some(target));
        }
        Ok(())
    }

    pub fn tags(&self, id: u64) -> Result<Option<M::Tags>, SelectorError> {
        let inner = self.lock();
        inner
            .inputs
            .get(&id)
            .map(|input| input.tags.clone())
            .ok_or(SelectorError::UnknownInput(id))
    }

    /// Current running time of an input's last observed position, or
    /// `None` if it hasn't received data yet or isn't time-based.
    pub fn input_running_time(&self, id: u64) -> Result<Option<i64>, SelectorError> {
        let inner = self.lock();
        inner
            .inputs
            .get(&id)
            .map(|input| input.running_time_at_last_stop())
            .ok_or(SelectorError::UnknownInput(id))
    }

    /// Register the callback invoked (outside the selector lock) whenever
    /// the active input changes via the block/switch protocol or
    /// `set_active_pad`. First-touch activation does not trigger this.
    pub fn on_active_changed(&self, callback: impl Fn(Option<u64>) + Send + 'static) {
        *self.active_changed.lock().unwrap() = Some(Box::new(callback));
    }
}
