//! Pure segment arithmetic: translating buffer timestamps into a monotonic
//! running time across segments, and rewriting a segment's start/stop to
//! splice cleanly across a switch.

use crate::media::SegmentFormat;

/// A contiguous window of stream time being played, with a playback rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub format: SegmentFormat,
    pub rate: f64,
    pub applied_rate: f64,
    pub start: i64,
    pub stop: Option<i64>,
    pub time: i64,
    /// Most recently observed position within the segment.
    pub last_stop: Option<i64>,
    /// Accumulated running time of all prior segments on this input.
    pub accum: i64,
}

impl Segment {
    pub fn abs_rate(&self) -> f64 {
        self.rate.abs()
    }
}

impl Default for Segment {
    fn default() -> Self {
        Segment {
            format: SegmentFormat::Undefined,
            rate: 1.0,
            applied_rate: 1.0,
            start: 0,
            stop: None,
            time: 0,
            last_stop: None,
            accum: 0,
        }
    }
}

/// Running time of timestamp `ts` within `segment`, or `None` ("outside")
/// when the segment isn't time-based or `ts` precedes `segment.start`.
pub fn running_time(segment: &Segment, ts: i64) -> Option<i64> {
    if segment.format != SegmentFormat::Time {
        return None;
    }
    if ts < segment.start {
        return None;
    }
    let abs_rate = segment.abs_rate();
    if abs_rate <= 0.0 {
        return None;
    }
    let rt = ((ts - segment.start) as f64 / abs_rate) as i64 + segment.accum;
    Some(rt)
}

/// Inverse of [`running_time`]: the timestamp within `segment` that
/// produces running time `rt`. Returns `segment.start` when `rt` does not
/// exceed `segment.accum`.
pub fn timestamp_for(segment: &Segment, rt: i64) -> i64 {
    if rt <= segment.accum {
        return segment.start;
    }
    let abs_rate = segment.abs_rate();
    segment.start + ((rt - segment.accum) as f64 * abs_rate) as i64
}

/// Close a segment at running time `rt`: `stop = timestamp_for(rt)`,
/// `last_stop` is cleared.
pub fn set_stop(segment: &mut Segment, rt: i64) {
    segment.stop = Some(timestamp_for(segment, rt));
    segment.last_stop = None;
}

/// Open a segment at running time `rt`: advances `accum`, `time`, and
/// `start` by the same delta, so running time stays monotonic across the
/// splice.
pub fn set_start(segment: &mut Segment, rt: i64) {
    let new_start = timestamp_for(segment, rt);
    let delta = new_start - segment.start;
    segment.accum += delta;
    segment.time += delta;
    segment.start = new_start;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time_segment(start: i64) -> Segment {
        Segment {
            format: SegmentFormat::Time,
            start,
            ..Segment::default()
        }
    }

    #[test]
    fn running_time_tracks_start_offset() {
        let seg = time_segment(100);
        assert_eq!(running_time(&seg, 140), Some(40));
    }

    #[test]
    fn running_time_outside_before_start() {
        let seg = time_segment(100);
        assert_eq!(running_time(&seg, 50), None);
    }

    #[test]
    fn running_time_undefined_format_is_outside() {
        let seg = Segment::default();
        assert_eq!(running_time(&seg, 40), None);
    }

    #[test]
    fn timestamp_for_inverts_running_time() {
        let seg = time_segment(100);
        for rt in [0, 40, 1000] {
            let ts = timestamp_for(&seg, seg.accum.max(rt));
            assert_eq!(running_time(&seg, ts), Some(seg.accum.max(rt)));
        }
    }

    #[test]
    fn timestamp_for_before_accum_returns_start() {
        let mut seg = time_segment(100);
        seg.accum = 500;
        assert_eq!(timestamp_for(&seg, 200), 100);
    }

    #[test]
    fn set_stop_sets_stop_and_clears_last_stop() {
        let mut seg = time_segment(0);
        seg.last_stop = Some(80);
        set_stop(&mut seg, 80);
        assert_eq!(seg.stop, Some(80));
        assert_eq!(seg.last_stop, None);
    }

    #[test]
    fn set_start_advances_accum_time_and_start() {
        let mut seg = time_segment(0);
        seg.time = 0;
        set_start(&mut seg, 120);
        assert_eq!(seg.start, 120);
        assert_eq!(seg.accum, 120);
        assert_eq!(seg.time, 120);
    }

    #[test]
    fn set_start_is_noop_when_rt_within_accum() {
        let mut seg = time_segment(0);
        seg.accum = 200;
        set_start(&mut seg, 50);
        assert_eq!(seg.start, 0);
        assert_eq!(seg.accum, 200);
    }
}
