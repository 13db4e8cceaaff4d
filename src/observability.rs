use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("hfchat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("hfchat.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("hfchat.client.request_duration_seconds");

pub(crate) static STREAM_CHUNKS: Counter = Counter::new("hfchat.stream.chunks");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("hfchat.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("hfchat.stream.bytes");

pub(crate) static RELAY_TURNS: Counter = Counter::new("hfchat.relay.turns");
pub(crate) static RELAY_FRAGMENTS: Counter = Counter::new("hfchat.relay.fragments");
pub(crate) static RELAY_FAILURES: Counter = Counter::new("hfchat.relay.failures");
pub(crate) static RELAY_TTFB: Moments = Moments::new("hfchat.relay.ttfb_seconds");
pub(crate) static RELAY_DURATION: Moments = Moments::new("hfchat.relay.duration_seconds");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_CHUNKS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);

    collector.register_counter(&RELAY_TURNS);
    collector.register_counter(&RELAY_FRAGMENTS);
    collector.register_counter(&RELAY_FAILURES);
    collector.register_moments(&RELAY_TTFB);
    collector.register_moments(&RELAY_DURATION);
}
