//! Per-input state: segment, flags, tags, and cached-buffer queue. The
//! state machine itself is driven by [`crate::selector::Selector`], which
//! owns every `Input` and mutates it under the selector lock; this module
//! only holds the data and the handful of derived values that don't need
//! the lock's broader context.

use crate::cache::Cache;
use crate::media::Media;
use crate::segment::{running_time, Segment};

pub struct Input<M: Media> {
    pub id: u64,
    pub segment: Segment,
    /// Whether the last segment event received was an "update" rather than
    /// a fresh segment.
    pub segment_update: bool,
    /// A segment must be (re-)emitted downstream before this input's next
    /// buffer.
    pub segment_pending: bool,
    /// At least one buffer has ever arrived on this input.
    pub active_seen: bool,
    /// At least one buffer has been forwarded since this input last became
    /// active.
    pub pushed: bool,
    pub eos: bool,
    pub eos_sent: bool,
    /// The next forwarded buffer must be marked discontinuous.
    pub discont: bool,
    /// Between flush-start and flush-stop on this input.
    pub flushing: bool,
    /// When not active, answer `Ok` instead of `NotLinked`.
    pub always_ok: bool,
    pub tags: Option<M::Tags>,
    pub cache: Cache<M>,
    /// Re-entry guard while replaying `cache`.
    pub sending_cache: bool,
}

impl<M: Media> Input<M> {
    pub fn new(id: u64) -> Self {
        Input {
            id,
            segment: Segment::default(),
            segment_update: false,
            segment_pending: false,
            active_seen: false,
            pushed: false,
            eos: false,
            eos_sent: false,
            discont: false,
            flushing: false,
            always_ok: false,
            tags: None,
            cache: Cache::new(),
            sending_cache: false,
        }
    }

    /// Reset everything except identity and the sticky `always_ok`
    /// configuration: used on flush-stop and on a not-ready transition.
    pub fn reset(&mut self) {
        self.segment = Segment::default();
        self.segment_update = false;
        self.segment_pending = false;
        self.active_seen = false;
        self.pushed = false;
        self.eos = false;
        self.eos_sent = false;
        self.discont = false;
        self.flushing = false;
        self.tags = None;
        self.cache.clear();
        self.sending_cache = false;
    }

    /// Running time at the most recently observed position in this input's
    /// segment, or `None` if nothing has been observed yet or the segment
    /// isn't time-based.
    pub fn running_time_at_last_stop(&self) -> Option<i64> {
        let ts = self.last_stop()?;
        running_time(&self.segment, ts)
    }

    fn last_stop(&self) -> Option<i64> {
        self.segment.last_stop
    }
}
