//! The selector core: the single lock and condition variable that own the
//! active-input pointer, the block/switch handshake, and the non-active
//! input wait loops.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use log::{debug, error, warn};

use crate::cache::{buffer_end_running_time, CacheEntry};
use crate::control::{SelectorConfig, SyncMode};
use crate::error::SelectorError;
use crate::input::Input;
use crate::media::{
    Clock, DownstreamPeer, Event, FlowStatus, Media, SegmentEvent, SegmentFormat, UpstreamPeer,
};
use crate::segment::{self, Segment};

pub(crate) struct Inner<M: Media> {
    pub(crate) inputs: HashMap<u64, Input<M>>,
    pub(crate) next_id: u64,
    pub(crate) active: Option<u64>,
    /// Selector-wide segment tracking the most recently forwarded position;
    /// used to synthesize the closing segment-update at a switch.
    pub(crate) segment: Segment,
    pub(crate) pending_close: bool,
    pub(crate) blocked: bool,
    pub(crate) flushing: bool,
    pub(crate) config: SelectorConfig,
}

/// An N-to-1 input stream selector.
///
/// Generic over the [`Media`] value types and the single [`DownstreamPeer`]
/// the output port forwards to. One `Selector` owns every [`Input`] it has
/// ever requested; inputs are looked up by the `u64` id returned from
/// [`Selector::request_input`].
pub struct Selector<M: Media, D: DownstreamPeer<M>> {
    pub(crate) inner: Mutex<Inner<M>>,
    pub(crate) cond: Condvar,
    pub(crate) downstream: D,
    pub(crate) clock: Option<Arc<dyn Clock>>,
    pub(crate) upstream_peers: Mutex<HashMap<u64, Arc<dyn UpstreamPeer<M>>>>,
    pub(crate) active_changed: Mutex<Option<Box<dyn Fn(Option<u64>) + Send>>>,
}

impl<M: Media, D: DownstreamPeer<M>> Selector<M, D> {
    pub fn new(downstream: D) -> Self {
        Self::with_config(downstream, SelectorConfig::default())
    }

    pub fn with_config(downstream: D, config: SelectorConfig) -> Self {
        Selector {
            inner: Mutex::new(Inner {
                inputs: HashMap::new(),
                next_id: 0,
                active: None,
                segment: Segment::default(),
                pending_close: false,
                blocked: false,
                flushing: false,
                config,
            }),
            cond: Condvar::new(),
            downstream,
            clock: None,
            upstream_peers: Mutex::new(HashMap::new()),
            active_changed: Mutex::new(None),
        }
    }

    /// Attach a pipeline clock, required only when `sync_mode = Clock`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Register a new input, returning its id. Ids are never reused, even
    /// after [`Selector::release_input`].
    pub fn request_input(&self) -> u64 {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.inputs.insert(id, Input::new(id));
        debug!("input {} requested", id);
        id
    }

    /// Deregister an input. If it was the active input, the selector falls
    /// back to no active input until the next first-touch activation.
    pub fn release_input(&self, id: u64) -> Result<(), SelectorError> {
        let mut was_active = false;
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.inputs.remove(&id).is_none() {
                return Err(SelectorError::UnknownInput(id));
            }
            if inner.active == Some(id) {
                inner.active = None;
                was_active = true;
            }
            self.cond.notify_all();
        }
        self.upstream_peers.lock().unwrap().remove(&id);
        debug!("input {} released", id);
        if was_active {
            self.notify_active_changed(None);
        }
        Ok(())
    }

    /// Register the upstream collaborator queried for latency on this
    /// input. Optional: inputs with no registered peer simply don't
    /// contribute to the combined latency query.
    pub fn register_upstream_peer(&self, id: u64, peer: Arc<dyn UpstreamPeer<M>>) {
        self.upstream_peers.lock().unwrap().insert(id, peer);
    }

    /// Transition the selector's flushing state (paused/ready/playing
    /// transitions in a host pipeline produce this). Setting `true` cancels
    /// every waiting `chain` call.
    pub fn set_flushing(&self, flushing: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.flushing = flushing;
        debug!("selector flushing = {}", flushing);
        self.cond.notify_all();
    }

    pub(crate) fn notify_active_changed(&self, active: Option<u64>) {
        if let Some(cb) = self.active_changed.lock().unwrap().as_ref() {
            cb(active);
        }
    }

    fn activate_first_touch(&self, inner: &mut Inner<M>, id: u64) {
        if inner.active.is_none() {
            inner.active = Some(id);
            debug!("input {} activated by first touch", id);
            // No change notification: spec-mandated exemption for
            // first-touch activation, unlike an explicit switch.
        }
    }

    fn reference_running_time(&self, inner: &Inner<M>) -> Option<i64> {
        if !inner.config.sync_streams {
            return None;
        }
        match inner.config.sync_mode {
            SyncMode::Clock => {
                let clock = self.clock.as_ref()?;
                let rt = clock.time_ns().saturating_sub(clock.base_time_ns());
                Some(rt as i64)
            }
            SyncMode::ActiveSegment => {
                let active_id = inner.active?;
                inner.inputs.get(&active_id)?.running_time_at_last_stop()
            }
        }
    }

    /// §4.2 event handling: flush-start, flush-stop, segment, tag,
    /// end-of-stream, and opaque passthrough events.
    pub fn handle_event(&self, id: u64, event: Event<M>) -> FlowStatus {
        let mut inner = self.inner.lock().unwrap();
        if !inner.inputs.contains_key(&id) {
            error!("event on unknown input {}", id);
            return FlowStatus::Error;
        }
        self.activate_first_touch(&mut inner, id);

        match event {
            Event::FlushStart => {
                if let Some(input) = inner.inputs.get_mut(&id) {
                    input.flushing = true;
                }
                let is_active = inner.active == Some(id);
                self.cond.notify_all();
                drop(inner);
                if is_active {
                    self.downstream.push_event(Event::FlushStart)
                } else {
                    FlowStatus::Ok
                }
            }
            Event::FlushStop => {
                let is_active = inner.active == Some(id);
                if let Some(input) = inner.inputs.get_mut(&id) {
                    input.reset();
                }
                inner.pending_close = false;
                self.cond.notify_all();
                drop(inner);
                if is_active {
                    self.downstream.push_event(Event::FlushStop)
                } else {
                    FlowStatus::Ok
                }
            }
            Event::Segment(seg_event) => {
                let is_active = inner.active == Some(id);
                {
                    let input = inner.inputs.get_mut(&id).unwrap();
                    input.segment = segment_from_event(&seg_event, &input.segment);
                    input.segment_update = seg_event.update;
                    if !is_active {
                        input.segment_pending = true;
                    }
                }
                drop(inner);
                if is_active {
                    self.downstream.push_event(Event::Segment(seg_event))
                } else {
                    FlowStatus::Ok
                }
            }
            Event::Tag(tags) => {
                let is_active = inner.active == Some(id);
                let merged = {
                    let input = inner.inputs.get_mut(&id).unwrap();
                    let merged = M::merge_tags(input.tags.take(), tags);
                    input.tags = Some(merged.clone());
                    merged
                };
                drop(inner);
                if is_active {
                    self.downstream.push_event(Event::Tag(merged))
                } else {
                    FlowStatus::Ok
                }
            }
            Event::Eos => {
                // Global dedup: once any input's `eos_sent` is set, no
                // further EOS is ever forwarded, for the life of the
                // selector (invariant: at most one downstream EOS).
                let already_sent = inner.inputs.values().any(|i| i.eos_sent);
                let is_active = inner.active == Some(id);
                let active_unsent = inner
                    .active
                    .and_then(|aid| inner.inputs.get(&aid))
                    .map(|a| a.eos && !a.eos_sent)
                    .unwrap_or(false);
                let forward = !already_sent && (is_active || active_unsent);
                if let Some(input) = inner.inputs.get_mut(&id) {
                    input.eos = true;
                    if forward {
                        input.eos_sent = true;
                    }
                }
                self.cond.notify_all();
                drop(inner);
                if forward {
                    self.downstream.push_event(Event::Eos)
                } else {
                    FlowStatus::Ok
                }
            }
            Event::Other(other) => {
                let is_active = inner.active == Some(id);
                drop(inner);
                if is_active {
                    self.downstream.push_event(Event::Other(other))
                } else {
                    FlowStatus::Ok
                }
            }
        }
    }

    /// §4.2 buffer handling (`chain`).
    pub fn chain(&self, id: u64, mut buffer: M::Buffer) -> FlowStatus {
        let mut inner = self.inner.lock().unwrap();
        if !inner.inputs.contains_key(&id) {
            error!("buffer on unknown input {}", id);
            return FlowStatus::Error;
        }

        // Steps 1-2: flushing check, then wait out the block gate.
        loop {
            if inner.flushing || inner.inputs.get(&id).map(|i| i.flushing).unwrap_or(true) {
                return FlowStatus::Flushing;
            }
            if !inner.blocked {
                break;
            }
            inner = self.cond.wait(inner).unwrap();
        }

        // Step 3.
        self.activate_first_touch(&mut inner, id);
        if let Some(input) = inner.inputs.get_mut(&id) {
            input.active_seen = true;
        }

        // Step 4. `last_stop` tracks the end of the buffer (timestamp plus
        // duration, clamped to the segment stop), not just its start, so it
        // agrees with the cache's own end-running-time accounting and with
        // what `block()` reports as "how far this input has played".
        if let Some(ts) = M::buffer_timestamp(&buffer) {
            if let Some(input) = inner.inputs.get_mut(&id) {
                let mut end = ts + M::buffer_duration(&buffer).unwrap_or(0);
                if let Some(stop) = input.segment.stop {
                    end = end.min(stop);
                }
                input.segment.last_stop = Some(end);
            }
        }

        // Step 5: sync-streams cache replay.
        let should_replay = {
            let cfg = inner.config;
            let is_active = inner.active == Some(id);
            match inner.inputs.get(&id) {
                Some(input) => {
                    cfg.sync_streams
                        && cfg.cache_buffers
                        && (!is_active || !input.pushed)
                        && !input.cache.is_empty()
                        && !input.sending_cache
                }
                None => false,
            }
        };

        if should_replay {
            // Save the live segment (already carrying this buffer's own
            // `last_stop` from step 4) so it can be restored once the cache
            // is drained, rather than left at whatever the last replayed
            // entry's segment happened to be.
            let (saved_segment, saved_segment_update) = {
                let input = inner.inputs.get_mut(&id).unwrap();
                input.sending_cache = true;
                (input.segment, input.segment_update)
            };
            drop(inner);
            loop {
                let mut guard = self.inner.lock().unwrap();
                let entry = match guard.inputs.get_mut(&id).and_then(|i| i.cache.pop_front()) {
                    Some(entry) => entry,
                    None => break,
                };
                if let Some(input) = guard.inputs.get_mut(&id) {
                    input.segment = entry.segment;
                    input.segment_update = entry.segment_update;
                    input.segment_pending = true;
                }
                drop(guard);
                let status = self.chain(id, entry.buffer);
                if status != FlowStatus::Ok {
                    warn!("cache replay on input {} returned {:?}", id, status);
                }
            }
            inner = self.inner.lock().unwrap();
            if let Some(input) = inner.inputs.get_mut(&id) {
                input.segment = saved_segment;
                input.segment_update = saved_segment_update;
                // The triggering buffer always gets a fresh segment event:
                // a real segment may have arrived on this input between
                // caching and reactivation, and the replay loop above left
                // `segment_pending` clear (set on the cache's own segment).
                input.segment_pending = true;
                input.sending_cache = false;
            }
        }

        // Step 6: wait until this buffer is not ahead of the reference
        // running time, re-evaluating `active` on every wake.
        loop {
            if inner.active == Some(id) {
                break;
            }
            if inner.flushing || inner.inputs.get(&id).map(|i| i.flushing).unwrap_or(true) {
                return FlowStatus::Flushing;
            }
            let reference = self.reference_running_time(&inner);
            let buf_rt = match inner.inputs.get(&id) {
                Some(input) => buffer_end_running_time::<M>(&input.segment, &buffer),
                None => return FlowStatus::Flushing,
            };
            let proceed = match (reference, buf_rt) {
                (None, _) => true,
                (Some(_), None) => true,
                (Some(r), Some(rt)) => rt < r,
            };
            if proceed {
                break;
            }
            inner = self.cond.wait(inner).unwrap();
        }

        if inner.active != Some(id) {
            // Step 7: still not active, drop.
            let active_has_pushed = inner
                .active
                .and_then(|aid| inner.inputs.get(&aid))
                .map(|a| a.pushed)
                .unwrap_or(false);
            let input = match inner.inputs.get_mut(&id) {
                Some(input) => input,
                None => return FlowStatus::Flushing,
            };
            input.discont = true;
            let status = if input.always_ok || !active_has_pushed {
                FlowStatus::Ok
            } else {
                FlowStatus::NotLinked
            };
            debug!("input {} dropped buffer (inactive), status={:?}", id, status);
            return status;
        }

        // Step 8: forward.
        let pending_close_event = if inner.pending_close {
            inner.pending_close = false;
            Some(segment_to_event(&inner.segment, true))
        } else {
            None
        };

        let pending_open_event = match inner.inputs.get_mut(&id) {
            Some(input) if input.segment_pending => {
                let update = inner.config.sync_streams
                    && inner.config.cache_buffers
                    && input.pushed
                    && input.segment_update;
                input.segment_pending = false;
                Some(segment_to_event(&input.segment, update))
            }
            _ => None,
        };

        let discont = match inner.inputs.get_mut(&id) {
            Some(input) => {
                let d = input.discont;
                input.discont = false;
                d
            }
            None => false,
        };
        M::set_discont(&mut buffer, discont);

        // Never re-cache a buffer while it's itself being replayed from the
        // cache: doing so would hand the replay loop a fresh entry to pop on
        // its next iteration, recursing forever.
        let should_cache = inner.config.sync_streams
            && inner.config.cache_buffers
            && inner
                .inputs
                .get(&id)
                .map(|i| i.segment.format == SegmentFormat::Time && !i.sending_cache)
                .unwrap_or(false);
        let cache_entry = if should_cache {
            inner.inputs.get(&id).map(|input| CacheEntry {
                buffer: buffer.clone(),
                segment: input.segment,
                segment_update: input.segment_update,
            })
        } else {
            None
        };

        drop(inner);

        if let Some(event) = pending_close_event {
            self.downstream.push_event(Event::Segment(event));
        }
        if let Some(event) = pending_open_event {
            self.downstream.push_event(Event::Segment(event));
        }
        let status = self.downstream.push_buffer(buffer);

        let mut inner = self.inner.lock().unwrap();
        // Only mark this input pushed if it's still the active one: a
        // switch may have landed while the lock was released for the push.
        if inner.active == Some(id) {
            if let Some(input) = inner.inputs.get_mut(&id) {
                input.pushed = true;
            }
        }
        if let Some(entry) = cache_entry {
            if let Some(input) = inner.inputs.get_mut(&id) {
                input.cache.push(entry);
            }
        }
        self.prune_all_caches(&mut inner);
        if inner.config.sync_streams {
            self.cond.notify_all();
        }
        status
    }

    fn prune_all_caches(&self, inner: &mut Inner<M>) {
        let reference = self.reference_running_time(inner);
        for input in inner.inputs.values_mut() {
            let dropped = input.cache.prune(reference);
            if dropped > 0 {
                debug!("pruned {} cached buffers on input {}", dropped, input.id);
            }
        }
    }

    /// Block gate: pause forwarding until [`Selector::switch`]. Returns the
    /// current active input's running time (0 if none or no data yet).
    pub fn block(&self) -> i64 {
        let mut inner = self.inner.lock().unwrap();
        if inner.blocked {
            warn!("block() called while a block is already pending");
        }
        inner.blocked = true;
        inner
            .active
            .and_then(|id| inner.inputs.get(&id))
            .and_then(|input| input.running_time_at_last_stop())
            .unwrap_or(0)
    }

    /// Switch the active input. Requires a pending [`Selector::block`].
    pub fn switch(
        &self,
        target: u64,
        stop_rt: Option<i64>,
        start_rt: Option<i64>,
    ) -> Result<(), SelectorError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.blocked {
            return Err(SelectorError::NotBlocked);
        }
        if !inner.inputs.contains_key(&target) {
            return Err(SelectorError::UnknownInput(target));
        }
        let changed = self.perform_switch(&mut inner, target, stop_rt, start_rt);
        drop(inner);
        if changed {
            self.notify_active_changed(Some(target));
        }
        Ok(())
    }

    /// The switch protocol itself (§4.4), shared by `switch()` (which
    /// requires a pending block) and the `active-pad` control-surface write
    /// (which does not). Returns whether the active input actually changed.
    pub(crate) fn perform_switch(
        &self,
        inner: &mut Inner<M>,
        target: u64,
        stop_rt: Option<i64>,
        start_rt: Option<i64>,
    ) -> bool {
        // Step 1.
        if inner.active == Some(target) {
            inner.blocked = false;
            self.cond.notify_all();
            return false;
        }

        let old_active = inner.active;

        // Step 2.
        let (mut stop_rt, mut start_rt) = (stop_rt, start_rt);
        if stop_rt.is_none() {
            if let Some(old_id) = old_active {
                let rt = inner
                    .inputs
                    .get(&old_id)
                    .and_then(|i| i.running_time_at_last_stop());
                stop_rt = rt;
                start_rt = rt;
            }
        }

        // Step 3.
        if let Some(old_id) = old_active {
            let (active_seen, old_segment) = match inner.inputs.get(&old_id) {
                Some(input) => (input.active_seen, input.segment),
                None => (false, Segment::default()),
            };
            if active_seen {
                if let Some(rt) = stop_rt {
                    if rt >= 0 && !inner.pending_close {
                        inner.segment = old_segment;
                        segment::set_stop(&mut inner.segment, rt);
                        inner.pending_close = true;
                    }
                }
            }
        }

        // Step 4.
        if let Some(old_id) = old_active {
            if let Some(old_input) = inner.inputs.get_mut(&old_id) {
                old_input.pushed = false;
            }
        }

        // Step 5.
        let target_active_seen = inner
            .inputs
            .get(&target)
            .map(|i| i.active_seen)
            .unwrap_or(false);
        if target_active_seen {
            if let Some(mut rt) = start_rt {
                if rt >= 0 {
                    if inner.config.sync_streams && inner.config.cache_buffers {
                        if let Some(target_rt) = inner
                            .inputs
                            .get(&target)
                            .and_then(|i| i.running_time_at_last_stop())
                        {
                            rt = target_rt;
                        }
                    }
                    if let Some(target_input) = inner.inputs.get_mut(&target) {
                        segment::set_start(&mut target_input.segment, rt);
                        target_input.segment_pending = true;
                    }
                }
            }
        }

        // Step 6. The new active input's next forwarded buffer is marked
        // discontinuous, same as a drop-then-reactivate (§4.5: "after a
        // drop or a switch").
        if let Some(target_input) = inner.inputs.get_mut(&target) {
            target_input.discont = true;
        }
        inner.active = Some(target);
        inner.blocked = false;
        self.cond.notify_all();
        debug!("switched active input to {}", target);
        true
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Inner<M>> {
        self.inner.lock().unwrap()
    }
}

fn segment_from_event(event: &SegmentEvent, old: &Segment) -> Segment {
    // `accum`/`last_stop` are purely internal bookkeeping the selector
    // maintains across switches (§3.1): they are never reset by an
    // incoming segment event, preserving "accum is non-decreasing over the
    // life of an input" even across upstream segment resets.
    Segment {
        format: event.format,
        rate: event.rate,
        applied_rate: event.applied_rate,
        start: event.start,
        stop: event.stop,
        time: event.time,
        last_stop: old.last_stop,
        accum: old.accum,
    }
}

fn segment_to_event(segment: &Segment, update: bool) -> SegmentEvent {
    SegmentEvent {
        update,
        rate: segment.rate,
        applied_rate: segment.applied_rate,
        format: segment.format,
        start: segment.start,
        stop: segment.stop,
        time: segment.time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::SegmentFormat;
    use std::sync::Mutex as StdMutex;

    #[derive(Clone, Debug)]
    struct TestBuffer {
        ts: Option<i64>,
        dur: Option<i64>,
        discont: bool,
    }

    struct TestMedia;

    impl Media for TestMedia {
        type Buffer = TestBuffer;
        type Tags = u32;
        type Other = ();
        type Format = ();

        fn buffer_timestamp(buffer: &Self::Buffer) -> Option<i64> {
            buffer.ts
        }
        fn buffer_duration(buffer: &Self::Buffer) -> Option<i64> {
            buffer.dur
        }
        fn buffer_format(_buffer: &Self::Buffer) -> Self::Format {}
        fn set_discont(buffer: &mut Self::Buffer, discont: bool) {
            buffer.discont = discont;
        }
        fn merge_tags(old: Option<Self::Tags>, new: Self::Tags) -> Self::Tags {
            old.map(|_| new).unwrap_or(new)
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Pushed {
        Event(&'static str),
        Buffer(Option<i64>, bool),
    }

    #[derive(Default)]
    struct RecordingPeer {
        log: StdMutex<Vec<Pushed>>,
    }

    impl DownstreamPeer<TestMedia> for RecordingPeer {
        fn push_event(&self, event: Event<TestMedia>) -> FlowStatus {
            let label = match event {
                Event::FlushStart => "flush-start",
                Event::FlushStop => "flush-stop",
                Event::Segment(_) => "segment",
                Event::Tag(_) => "tag",
                Event::Eos => "eos",
                Event::Other(_) => "other",
            };
            self.log.lock().unwrap().push(Pushed::Event(label));
            FlowStatus::Ok
        }
        fn push_buffer(&self, buffer: TestBuffer) -> FlowStatus {
            self.log
                .lock()
                .unwrap()
                .push(Pushed::Buffer(buffer.ts, buffer.discont));
            FlowStatus::Ok
        }
        fn query_formats(&self) -> Vec<()> {
            vec![()]
        }
        fn accept_format(&self, _format: &()) -> bool {
            true
        }
    }

    fn time_segment_event(start: i64) -> SegmentEvent {
        SegmentEvent {
            update: false,
            rate: 1.0,
            applied_rate: 1.0,
            format: SegmentFormat::Time,
            start,
            stop: None,
            time: start,
        }
    }

    fn buf(ts: i64, dur: i64) -> TestBuffer {
        TestBuffer {
            ts: Some(ts),
            dur: Some(dur),
            discont: false,
        }
    }

    /// S1: single input.
    #[test]
    fn single_input_forwards_segment_buffers_and_eos() {
        let sel: Selector<TestMedia, RecordingPeer> = Selector::new(RecordingPeer::default());
        let a = sel.request_input();
        assert_eq!(sel.handle_event(a, Event::Segment(time_segment_event(0))), FlowStatus::Ok);
        assert_eq!(sel.chain(a, buf(0, 40)), FlowStatus::Ok);
        assert_eq!(sel.chain(a, buf(40, 40)), FlowStatus::Ok);
        assert_eq!(sel.chain(a, buf(80, 40)), FlowStatus::Ok);
        assert_eq!(sel.handle_event(a, Event::Eos), FlowStatus::Ok);

        let log = sel.downstream.log.lock().unwrap();
        assert_eq!(
            *log,
            vec![
                Pushed::Event("segment"),
                Pushed::Buffer(Some(0), false),
                Pushed::Buffer(Some(40), false),
                Pushed::Buffer(Some(80), false),
                Pushed::Event("eos"),
            ]
        );
    }

    /// S2: clean switch.
    #[test]
    fn clean_switch_splices_segments_and_marks_discont() {
        let sel: Selector<TestMedia, RecordingPeer> = Selector::new(RecordingPeer::default());
        let a = sel.request_input();
        let b = sel.request_input();
        sel.handle_event(a, Event::Segment(time_segment_event(0)));
        sel.handle_event(b, Event::Segment(time_segment_event(0)));

        sel.chain(a, buf(0, 40));
        sel.chain(a, buf(40, 40));

        let rt = sel.block();
        assert_eq!(rt, 80);
        sel.switch(b, None, None).unwrap();

        sel.chain(b, buf(80, 40));
        sel.chain(b, buf(120, 40));

        let log = sel.downstream.log.lock().unwrap();
        assert_eq!(
            *log,
            vec![
                Pushed::Event("segment"),
                Pushed::Buffer(Some(0), false),
                Pushed::Buffer(Some(40), false),
                Pushed::Event("segment"), // close of A
                Pushed::Event("segment"), // open of B
                Pushed::Buffer(Some(80), true),
                Pushed::Buffer(Some(120), false),
            ]
        );
    }

    /// S3: EOS race, exactly one EOS forwarded regardless of which input
    /// processes it while active.
    #[test]
    fn eos_is_forwarded_at_most_once_across_a_switch() {
        let sel: Selector<TestMedia, RecordingPeer> = Selector::new(RecordingPeer::default());
        let a = sel.request_input();
        let b = sel.request_input();
        sel.handle_event(a, Event::Segment(time_segment_event(0)));
        sel.handle_event(b, Event::Segment(time_segment_event(0)));
        sel.chain(a, buf(0, 40));

        assert_eq!(sel.handle_event(a, Event::Eos), FlowStatus::Ok);

        sel.block();
        sel.switch(b, None, None).unwrap();
        sel.chain(b, buf(40, 40));
        assert_eq!(sel.handle_event(b, Event::Eos), FlowStatus::Ok);

        let eos_count = sel
            .downstream
            .log
            .lock()
            .unwrap()
            .iter()
            .filter(|p| matches!(p, Pushed::Event("eos")))
            .count();
        assert_eq!(eos_count, 1);
    }

    /// S6: flush-start on a waiting input returns Flushing without the
    /// controller doing anything.
    #[test]
    fn flush_start_marks_input_flushing_for_subsequent_chain_calls() {
        let sel: Selector<TestMedia, RecordingPeer> = Selector::new(RecordingPeer::default());
        let a = sel.request_input();
        sel.handle_event(a, Event::Segment(time_segment_event(0)));
        sel.chain(a, buf(0, 40));

        sel.handle_event(a, Event::FlushStart);
        assert_eq!(sel.chain(a, buf(40, 40)), FlowStatus::Flushing);
    }

    #[test]
    fn release_of_active_input_clears_active() {
        let sel: Selector<TestMedia, RecordingPeer> = Selector::new(RecordingPeer::default());
        let a = sel.request_input();
        sel.handle_event(a, Event::Segment(time_segment_event(0)));
        sel.chain(a, buf(0, 40));
        sel.release_input(a).unwrap();
        assert!(sel.lock().active.is_none());
    }

    #[test]
    fn switch_without_pending_block_is_rejected() {
        let sel: Selector<TestMedia, RecordingPeer> = Selector::new(RecordingPeer::default());
        let a = sel.request_input();
        let b = sel.request_input();
        sel.handle_event(a, Event::Segment(time_segment_event(0)));
        assert!(matches!(sel.switch(b, None, None), Err(SelectorError::NotBlocked)));
    }
}
