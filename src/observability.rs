use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("chatline.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("chatline.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("chatline.client.request_duration_seconds");

pub(crate) static TYPING_PIECES: Counter = Counter::new("chatline.typing.pieces");
pub(crate) static TYPING_FAST_FORWARDS: Counter = Counter::new("chatline.typing.fast_forwards");

pub(crate) static SESSION_SENDS: Counter = Counter::new("chatline.session.sends");
pub(crate) static SESSION_SKIPPED_SENDS: Counter = Counter::new("chatline.session.skipped_sends");
pub(crate) static SESSION_EVICTIONS: Counter = Counter::new("chatline.session.evictions");

pub(crate) static STORAGE_WRITES: Counter = Counter::new("chatline.storage.writes");
pub(crate) static STORAGE_CORRUPT_LOADS: Counter = Counter::new("chatline.storage.corrupt_loads");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&TYPING_PIECES);
    collector.register_counter(&TYPING_FAST_FORWARDS);

    collector.register_counter(&SESSION_SENDS);
    collector.register_counter(&SESSION_SKIPPED_SENDS);
    collector.register_counter(&SESSION_EVICTIONS);

    collector.register_counter(&STORAGE_WRITES);
    collector.register_counter(&STORAGE_CORRUPT_LOADS);
}
