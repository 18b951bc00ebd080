//! Prometheus counters for the relay.

use prometheus::{IntCounter, Registry, TextEncoder};

/// Counter bundle registered against a private registry.
///
/// Counters are cheap to clone (shared atomics), so handlers and in-flight
/// streams hold their own handles.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub requests_total: IntCounter,
    pub invalid_requests_total: IntCounter,
    pub upstream_failures_total: IntCounter,
    pub relayed_streams_total: IntCounter,
    pub stream_aborts_total: IntCounter,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let requests_total =
            IntCounter::new("relay_requests_total", "Inbound chat relay requests")?;
        let invalid_requests_total = IntCounter::new(
            "relay_invalid_requests_total",
            "Requests rejected before dispatch (bad method excluded)",
        )?;
        let upstream_failures_total = IntCounter::new(
            "relay_upstream_failures_total",
            "Upstream responses with a non-success status",
        )?;
        let relayed_streams_total = IntCounter::new(
            "relay_streams_total",
            "Streams opened toward callers",
        )?;
        let stream_aborts_total = IntCounter::new(
            "relay_stream_aborts_total",
            "Streams that ended on an upstream read error",
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(invalid_requests_total.clone()))?;
        registry.register(Box::new(upstream_failures_total.clone()))?;
        registry.register(Box::new(relayed_streams_total.clone()))?;
        registry.register(Box::new(stream_aborts_total.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            invalid_requests_total,
            upstream_failures_total,
            relayed_streams_total,
            stream_aborts_total,
        })
    }

    /// Render all counters in the Prometheus text exposition format.
    pub fn render(&self) -> prometheus::Result<String> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.requests_total.get(), 0);
        assert_eq!(metrics.stream_aborts_total.get(), 0);
    }

    #[test]
    fn test_render_exposes_all_counters() {
        let metrics = Metrics::new().unwrap();
        metrics.requests_total.inc();

        let text = metrics.render().unwrap();
        assert!(text.contains("relay_requests_total 1"));
        assert!(text.contains("relay_invalid_requests_total 0"));
        assert!(text.contains("relay_upstream_failures_total 0"));
        assert!(text.contains("relay_streams_total 0"));
        assert!(text.contains("relay_stream_aborts_total 0"));
    }
}
