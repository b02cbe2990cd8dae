//! Global named counters, reported once at exit.
//!
//! Counters are registered lazily the first time their call site runs. With the `counter`
//! feature disabled the macros compile to nothing (or to the bare closure call).
use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

pub enum Counter {
    Events(EventCounter),
    Time(TimeCounter),
}

impl Counter {
    pub fn format(&self) -> String {
        match self {
            Counter::Events(c) => c.value().to_string(),
            Counter::Time(c) => super::timer::format_elapsed(c.value()),
        }
    }
}

#[derive(Default)]
pub struct EventCounter {
    count: AtomicU64,
}

impl EventCounter {
    pub const fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
        }
    }

    pub fn add(&self, n: u64) {
        // Only the final sum matters
        self.count.fetch_add(n, Ordering::Relaxed);
    }

    pub fn value(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }
}

/// Total duration, in nanoseconds
#[derive(Default)]
pub struct TimeCounter {
    nanos: AtomicU64,
}

impl TimeCounter {
    pub const fn new() -> Self {
        Self {
            nanos: AtomicU64::new(0),
        }
    }

    pub fn add(&self, elapsed: Duration) {
        self.nanos
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn value(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Acquire))
    }
}

lazy_static::lazy_static! {
    static ref COUNTERS: Mutex<BTreeMap<&'static str, Arc<Counter>>> = Mutex::new(BTreeMap::new());
}

/// Register a counter, or get the one already registered under that name
pub fn insert_counter(name: &'static str, counter: Counter) -> Arc<Counter> {
    let mut counters = COUNTERS.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    counters.entry(name).or_insert_with(|| Arc::new(counter)).clone()
}

pub fn report_counters() {
    let counters = COUNTERS.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    for (name, counter) in counters.iter() {
        log::info!(target: "counter_report", "{name}: {}", counter.format());
    }
}

/// Count events: `counter!("rays")` or `counter!("rays", n)`
#[macro_export]
macro_rules! counter {
    ($name:literal) => {
        $crate::counter!($name, 1)
    };
    ($name:literal, $n:expr) => {
        if cfg!(feature = "counter") {
            use $crate::utils::counter::{insert_counter, lazy_static, Counter, EventCounter};
            lazy_static::lazy_static! {
                static ref COUNTER: std::sync::Arc<Counter> =
                    insert_counter($name, Counter::Events(EventCounter::new()));
            }
            if let Counter::Events(c) = &**COUNTER {
                c.add($n as u64);
            }
        }
    };
}

/// Run the closure and add its duration to the named counter
#[macro_export]
macro_rules! timed_scope_accumulate {
    ($name:literal, $f:expr) => {{
        if cfg!(feature = "counter") {
            use $crate::utils::counter::{insert_counter, lazy_static, Counter, TimeCounter};
            lazy_static::lazy_static! {
                static ref COUNTER: std::sync::Arc<Counter> =
                    insert_counter($name, Counter::Time(TimeCounter::new()));
            }
            let timed = $crate::utils::timer::timed_scope($f);
            if let Counter::Time(c) = &**COUNTER {
                c.add(timed.elapsed);
            }
            timed.res
        } else {
            ($f)()
        }
    }};
}

pub use counter;
pub use lazy_static;
pub use timed_scope_accumulate;

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{insert_counter, Counter, EventCounter, TimeCounter};

    #[test]
    fn counters_are_shared_by_name() {
        let a = insert_counter("test shared", Counter::Events(EventCounter::new()));
        let b = insert_counter("test shared", Counter::Events(EventCounter::new()));
        if let Counter::Events(c) = &*a {
            c.add(3);
        }
        assert_eq!(b.format(), "3");
    }

    #[test]
    fn time_counter_sums() {
        let c = TimeCounter::new();
        c.add(Duration::from_millis(2));
        c.add(Duration::from_millis(3));
        assert_eq!(c.value(), Duration::from_millis(5));
    }

    #[test]
    fn accumulate_returns_closure_result() {
        let v = crate::timed_scope_accumulate!("test accumulate", || 21 * 2);
        assert_eq!(v, 42);
        crate::counter!("test events", 2);
    }
}
