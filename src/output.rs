//! Output port: the single downstream peer and the queries that combine
//! information across every input (latency) or simply forward to the
//! linked side (formats/capabilities).

use crate::media::{DownstreamPeer, LatencyInfo, Media};
use crate::selector::Selector;

impl<M: Media, D: DownstreamPeer<M>> Selector<M, D> {
    /// Combined latency across every input with a registered upstream peer:
    /// `min` is the largest lower bound, `max` the smallest upper bound,
    /// `live` true if any input is live. `None` if no peer answered.
    pub fn query_latency(&self) -> Option<LatencyInfo> {
        let peers: Vec<_> = self.upstream_peers.lock().unwrap().values().cloned().collect();
        let mut combined: Option<LatencyInfo> = None;
        for peer in peers {
            let info = match peer.query_latency() {
                Some(info) => info,
                None => continue,
            };
            combined = Some(match combined {
                None => info,
                Some(acc) => LatencyInfo {
                    min: acc.min.max(info.min),
                    max: match (acc.max, info.max) {
                        (Some(a), Some(b)) => Some(a.min(b)),
                        (Some(a), None) => Some(a),
                        (None, Some(b)) => Some(b),
                        (None, None) => None,
                    },
                    live: acc.live || info.live,
                },
            });
        }
        combined
    }

    /// Formats the output peer currently accepts.
    pub fn query_formats(&self) -> Vec<M::Format> {
        self.downstream.query_formats()
    }

    pub fn accept_format(&self, format: &M::Format) -> bool {
        self.downstream.accept_format(format)
    }

    /// Formats the src side answers with: the active input's upstream
    /// peer's formats, or an empty ("any") list when there's no active
    /// input or its peer isn't registered.
    pub fn src_query_formats(&self) -> Vec<M::Format> {
        match self.active_upstream_peer() {
            Some(peer) => peer.query_formats(),
            None => Vec::new(),
        }
    }

    /// Whether the src side accepts `format`: delegates to the active
    /// input's upstream peer, or accepts anything when unlinked.
    pub fn src_accept_format(&self, format: &M::Format) -> bool {
        match self.active_upstream_peer() {
            Some(peer) => peer.accept_format(format),
            None => true,
        }
    }

    fn active_upstream_peer(&self) -> Option<std::sync::Arc<dyn crate::media::UpstreamPeer<M>>> {
        let active = self.lock().active?;
        self.upstream_peers.lock().unwrap().get(&active).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{Event, FlowStatus};
    use std::sync::Arc;

    #[derive(Clone)]
    struct NoopBuffer;
    struct NoopMedia;

    impl Media for NoopMedia {
        type Buffer = NoopBuffer;
        type Tags = ();
        type Other = ();
        type Format = ();

        fn buffer_timestamp(_buffer: &Self::Buffer) -> Option<i64> {
            None
        }
        fn buffer_duration(_buffer: &Self::Buffer) -> Option<i64> {
            None
        }
        fn buffer_format(_buffer: &Self::Buffer) -> Self::Format {}
        fn set_discont(_buffer: &mut Self::Buffer, _discont: bool) {}
        fn merge_tags(_old: Option<Self::Tags>, _new: Self::Tags) -> Self::Tags {}
    }

    struct NoopPeer;
    impl DownstreamPeer<NoopMedia> for NoopPeer {
        fn push_event(&self, _event: Event<NoopMedia>) -> FlowStatus {
            FlowStatus::Ok
        }
        fn push_buffer(&self, _buffer: NoopBuffer) -> FlowStatus {
            FlowStatus::Ok
        }
        fn query_formats(&self) -> Vec<()> {
            vec![()]
        }
        fn accept_format(&self, _format: &()) -> bool {
            true
        }
    }

    struct FixedLatency(LatencyInfo);
    impl crate::media::UpstreamPeer<NoopMedia> for FixedLatency {
        fn query_latency(&self) -> Option<LatencyInfo> {
            Some(self.0)
        }
        fn query_formats(&self) -> Vec<()> {
            vec![()]
        }
        fn accept_format(&self, _format: &()) -> bool {
            true
        }
    }

    #[test]
    fn query_latency_combines_min_max_and_live() {
        let sel: Selector<NoopMedia, NoopPeer> = Selector::new(NoopPeer);
        let a = sel.request_input();
        let b = sel.request_input();
        sel.register_upstream_peer(
            a,
            Arc::new(FixedLatency(LatencyInfo {
                min: 10,
                max: Some(100),
                live: false,
            })),
        );
        sel.register_upstream_peer(
            b,
            Arc::new(FixedLatency(LatencyInfo {
                min: 20,
                max: Some(50),
                live: true,
            })),
        );

        let combined = sel.query_latency().unwrap();
        assert_eq!(combined.min, 20);
        assert_eq!(combined.max, Some(50));
        assert!(combined.live);
    }

    #[test]
    fn query_latency_is_none_with_no_peers() {
        let sel: Selector<NoopMedia, NoopPeer> = Selector::new(NoopPeer);
        assert!(sel.query_latency().is_none());
    }

    #[test]
    fn src_format_queries_accept_anything_when_unlinked() {
        let sel: Selector<NoopMedia, NoopPeer> = Selector::new(NoopPeer);
        assert!(sel.src_query_formats().is_empty());
        assert!(sel.src_accept_format(&()));
    }

    #[test]
    fn src_format_queries_delegate_to_the_active_inputs_peer() {
        let sel: Selector<NoopMedia, NoopPeer> = Selector::new(NoopPeer);
        let a = sel.request_input();
        sel.register_upstream_peer(
            a,
            Arc::new(FixedLatency(LatencyInfo {
                min: 0,
                max: None,
                live: false,
            })),
        );
        sel.chain(a, NoopBuffer); // first-touch activation
        assert_eq!(sel.src_query_formats(), vec![()]);
        assert!(sel.src_accept_format(&()));
    }
}
