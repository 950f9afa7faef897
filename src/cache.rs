//! Per-input buffer cache, replayed on reactivation and pruned whenever a
//! buffer's running time falls behind the current reference running time.

use std::collections::VecDeque;

use log::trace;

use crate::media::Media;
use crate::segment::{running_time, Segment};

/// A single cached buffer, together with the segment it was forwarded
/// under (needed to recompute its running time once the input's live
/// segment has since moved on).
pub struct CacheEntry<M: Media> {
    pub buffer: M::Buffer,
    pub segment: Segment,
    pub segment_update: bool,
}

/// The running time of a cached (or about-to-be-cached) buffer: its
/// `timestamp + duration`, clamped to the segment's `stop` when one is set.
pub fn buffer_end_running_time<M: Media>(segment: &Segment, buffer: &M::Buffer) -> Option<i64> {
    let ts = M::buffer_timestamp(buffer)?;
    let dur = M::buffer_duration(buffer).unwrap_or(0);
    let mut end = ts + dur;
    if let Some(stop) = segment.stop {
        if end > stop {
            end = stop;
        }
    }
    running_time(segment, end)
}

fn entry_running_time<M: Media>(entry: &CacheEntry<M>) -> Option<i64> {
    buffer_end_running_time::<M>(&entry.segment, &entry.buffer)
}

/// Ordered cache of recently forwarded buffers for one input.
pub struct Cache<M: Media> {
    entries: VecDeque<CacheEntry<M>>,
}

impl<M: Media> Cache<M> {
    pub fn new() -> Self {
        Cache {
            entries: VecDeque::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn push(&mut self, entry: CacheEntry<M>) {
        self.entries.push_back(entry);
    }

    pub fn pop_front(&mut self) -> Option<CacheEntry<M>> {
        self.entries.pop_front()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop cached entries that have fallen behind `reference`.
    ///
    /// Repeatedly finds the earliest entry with a determinable running time
    /// that is strictly behind `reference`; that entry, plus every
    /// undetermined (invalid-timestamp) entry ahead of it in queue order,
    /// is dropped (the "trailing drop" rule: those entries are older and
    /// have nothing else to anchor them). Stops as soon as the earliest
    /// remaining determinable entry is at or after `reference`, or no
    /// determinable entry remains (an indeterminate prefix is never
    /// dropped blindly).
    pub fn prune(&mut self, reference: Option<i64>) -> usize {
        let reference = match reference {
            Some(r) => r,
            None => return 0,
        };
        let mut dropped = 0;
        loop {
            let first_determinable = self
                .entries
                .iter()
                .enumerate()
                .find_map(|(i, e)| entry_running_time(e).map(|rt| (i, rt)));
            let (idx, rt) = match first_determinable {
                Some(found) => found,
                None => break,
            };
            if rt >= reference {
                break;
            }
            for _ in 0..=idx {
                self.entries.pop_front();
                dropped += 1;
            }
            trace!("cache pruned {} entries behind reference {}", idx + 1, reference);
        }
        dropped
    }
}

impl<M: Media> Default for Cache<M> {
    fn default() -> Self {
        Self::new()
    }
}
