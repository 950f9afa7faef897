//! # Stream Selector
//!
//! An N-to-1 input stream selector: accepts media buffers and events on N
//! sink inputs and forwards exactly one of them downstream at a time,
//! preserving stream-time continuity across switches. This is the
//! synchronization and routing core of a live-switching media pipeline
//! (language-track switching, camera switching, and similar N-to-1 routing
//! decisions), with no mixing, transcoding, resampling, or reordering.

pub mod cache;
pub mod control;
pub mod error;
pub mod input;
pub mod media;
pub mod output;
pub mod segment;
pub mod selector;

pub use control::{SelectorConfig, SyncMode};
pub use error::SelectorError;
pub use input::Input;
pub use media::{
    Clock, DownstreamPeer, Event, FlowStatus, LatencyInfo, Media, SegmentEvent, SegmentFormat,
    UpstreamPeer,
};
pub use segment::Segment;
pub use selector::Selector;
