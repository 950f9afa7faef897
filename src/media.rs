//! Host-framework seam: the concrete buffer/event/tag/clock types are
//! supplied by whatever media pipeline embeds the selector. The selector
//! core never constructs or inspects these values beyond the accessors
//! below.

/// The set of value types a host framework must supply.
///
/// A stream selector is generic over exactly one `Media` implementation:
/// every input and the output share the same buffer/tag/event/format types.
pub trait Media: 'static {
    /// An opaque media buffer (audio frame, video frame, packet, ...).
    type Buffer: Clone + Send;
    /// Opaque tag/metadata container.
    type Tags: Clone + Send;
    /// Opaque passthrough event payload for events this core does not
    /// interpret (caps, custom events, etc.).
    type Other: Clone + Send;
    /// Opaque format/capability descriptor.
    type Format: Clone + PartialEq + Send;

    /// The buffer's presentation timestamp, or `None` if it carries none.
    fn buffer_timestamp(buffer: &Self::Buffer) -> Option<i64>;
    /// The buffer's duration, or `None` if unknown.
    fn buffer_duration(buffer: &Self::Buffer) -> Option<i64>;
    /// The buffer's format tag, used only for output-format bookkeeping.
    fn buffer_format(buffer: &Self::Buffer) -> Self::Format;
    /// Stamp (or clear) the discontinuity flag on a buffer.
    fn set_discont(buffer: &mut Self::Buffer, discont: bool);
    /// Merge an incoming tag list with whatever tags an input already holds.
    /// New values replace old ones on key conflict.
    fn merge_tags(old: Option<Self::Tags>, new: Self::Tags) -> Self::Tags;
}

/// Segment format: only `Time` carries running-time semantics; any other
/// format disables time-based sync for that input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentFormat {
    Time,
    Undefined,
}

/// A segment event as carried over the wire between ports: the same fields
/// as [`crate::segment::Segment`], plus the `update` flag that distinguishes
/// a position-only update from a fresh segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentEvent {
    pub update: bool,
    pub rate: f64,
    pub applied_rate: f64,
    pub format: SegmentFormat,
    pub start: i64,
    pub stop: Option<i64>,
    pub time: i64,
}

/// The five event kinds an input port reacts to, plus an opaque passthrough
/// variant for anything else the host framework defines.
#[derive(Clone)]
pub enum Event<M: Media> {
    FlushStart,
    FlushStop,
    Segment(SegmentEvent),
    Tag(M::Tags),
    Eos,
    Other(M::Other),
}

/// Outcome of pushing a buffer or event downstream, mirroring the taxonomy
/// every producer on an input must be prepared to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStatus {
    Ok,
    NotLinked,
    Flushing,
    Unexpected,
    Error,
}

/// Latency bounds reported by one upstream peer.
#[derive(Debug, Clone, Copy)]
pub struct LatencyInfo {
    pub min: i64,
    pub max: Option<i64>,
    pub live: bool,
}

/// The single downstream collaborator the output port forwards to.
pub trait DownstreamPeer<M: Media>: Send + Sync {
    fn push_event(&self, event: Event<M>) -> FlowStatus;
    fn push_buffer(&self, buffer: M::Buffer) -> FlowStatus;
    /// Formats the peer currently accepts, most preferred first.
    fn query_formats(&self) -> Vec<M::Format>;
    fn accept_format(&self, format: &M::Format) -> bool;
}

/// Per-input upstream collaborator: queried for latency combination, and,
/// when its input is the active one, for the output port's own format
/// negotiation (§4.5: the src side exposes the active input's peer's
/// formats, or accepts anything when unlinked).
pub trait UpstreamPeer<M: Media>: Send + Sync {
    fn query_latency(&self) -> Option<LatencyInfo>;
    /// Formats this input's upstream peer supports, most preferred first.
    fn query_formats(&self) -> Vec<M::Format>;
    fn accept_format(&self, format: &M::Format) -> bool;
}

/// Pipeline clock, used only when `sync_mode = Clock`.
pub trait Clock: Send + Sync {
    fn time_ns(&self) -> u64;
    fn base_time_ns(&self) -> u64;
}
