use crate::trace::{SpanId, TraceId};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of fresh trace and span ids.
///
/// The all-zero id is reserved as "invalid" on the wire; implementations
/// never return it.
pub trait IdGenerator: Send + Sync + std::fmt::Debug {
    /// An id for a locally-rooted trace.
    fn new_trace_id(&self) -> TraceId;

    /// An id for a new span, unique within its trace.
    fn new_span_id(&self) -> SpanId;
}

thread_local! {
    static THREAD_RNG: RefCell<SmallRng> = RefCell::new(SmallRng::from_entropy());
}

/// The default id source: uniform draws from a per-thread generator.
///
/// Each thread seeds its own generator once from OS entropy, so id creation
/// never contends on shared state. Zero draws are retried.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn new_trace_id(&self) -> TraceId {
        THREAD_RNG.with(|rng| {
            let mut rng = rng.borrow_mut();
            loop {
                match rng.gen::<u128>() {
                    0 => continue,
                    value => return TraceId::from(value),
                }
            }
        })
    }

    fn new_span_id(&self) -> SpanId {
        THREAD_RNG.with(|rng| {
            let mut rng = rng.borrow_mut();
            loop {
                match rng.gen::<u64>() {
                    0 => continue,
                    value => return SpanId::from(value),
                }
            }
        })
    }
}

/// An id source that hands out consecutive integers starting at 1, for
/// tests that need predictable ids.
#[derive(Clone, Debug)]
pub struct IncrementIdGenerator {
    next: Arc<AtomicU64>,
}

impl IncrementIdGenerator {
    /// Create a new `IncrementIdGenerator`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for IncrementIdGenerator {
    fn default() -> Self {
        IncrementIdGenerator {
            next: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl IdGenerator for IncrementIdGenerator {
    fn new_trace_id(&self) -> TraceId {
        TraceId::from(self.next.fetch_add(1, Ordering::SeqCst) as u128)
    }

    fn new_span_id(&self) -> SpanId {
        SpanId::from(self.next.fetch_add(1, Ordering::SeqCst))
    }
}
