use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("gamechat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("gamechat.client.request_errors");
pub(crate) static CLIENT_MISSING_CREDENTIAL: Counter =
    Counter::new("gamechat.client.missing_credential");

pub(crate) static STREAM_FRAGMENTS: Counter = Counter::new("gamechat.stream.fragments");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("gamechat.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("gamechat.stream.bytes");
pub(crate) static STREAM_TTFF: Moments = Moments::new("gamechat.stream.ttff_seconds");
pub(crate) static STREAM_DURATION: Moments = Moments::new("gamechat.stream.duration_seconds");

pub(crate) static TURNS_COMPLETED: Counter = Counter::new("gamechat.turn.completed");
pub(crate) static TURNS_FAILED: Counter = Counter::new("gamechat.turn.failed");
pub(crate) static PERSONALITY_RESETS: Counter = Counter::new("gamechat.session.personality_resets");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_counter(&CLIENT_MISSING_CREDENTIAL);

    collector.register_counter(&STREAM_FRAGMENTS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);
    collector.register_moments(&STREAM_TTFF);
    collector.register_moments(&STREAM_DURATION);

    collector.register_counter(&TURNS_COMPLETED);
    collector.register_counter(&TURNS_FAILED);
    collector.register_counter(&PERSONALITY_RESETS);
}
