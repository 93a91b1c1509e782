#![forbid(unsafe_code)]

//! Consumers and the broadcast sweep.
//!
//! A consumer is anything that renders localized output and wants a nudge
//! when the translation registry or the ambient locale changes. The
//! [`ConsumerSet`] holds them weakly, keyed by pointer identity:
//! attaching twice is one membership, detaching is idempotent, and a
//! consumer whose owner dropped it is skipped silently and pruned during
//! the next sweep.
//!
//! # Failure Modes
//!
//! - **Panicking consumer**: the sweep catches it, finishes the remaining
//!   consumers, then resumes the first panic.
//! - **Forgotten detach**: the weak handle dangles after the owner drops;
//!   broadcasts skip it, so the only cost is the slot until the next
//!   prune.

use lingo_i18n::Direction;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::info_span;
use web_time::Instant;

/// A rendering host binding: re-render on demand, plus the per-consumer
/// locale and direction overrides the accessor consults.
pub trait Consumer {
    /// Ask the host to re-render this consumer. Called once per broadcast.
    fn request_render(&self);

    /// Locale override for this consumer. `None` or an empty tag means
    /// "follow the ambient locale".
    fn locale_override(&self) -> Option<String> {
        None
    }

    /// Direction override for this consumer. `None` means "follow the
    /// ambient direction".
    fn direction_override(&self) -> Option<Direction> {
        None
    }
}

/// Weakly-held set of consumers with pointer-identity membership.
#[derive(Default)]
pub struct ConsumerSet {
    entries: RefCell<Vec<Weak<dyn Consumer>>>,
}

impl ConsumerSet {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a consumer. A second attach of the same `Rc` is a no-op, so
    /// membership stays single even when wiring code runs twice.
    pub fn attach(&self, consumer: &Rc<dyn Consumer>) {
        let ptr = Rc::as_ptr(consumer) as *const ();
        let mut entries = self.entries.borrow_mut();
        if entries.iter().any(|w| w.as_ptr() as *const () == ptr) {
            return;
        }
        entries.push(Rc::downgrade(consumer));
    }

    /// Remove a consumer. Unknown consumers are ignored.
    pub fn detach(&self, consumer: &Rc<dyn Consumer>) {
        let ptr = Rc::as_ptr(consumer) as *const ();
        self.entries
            .borrow_mut()
            .retain(|w| w.as_ptr() as *const () != ptr);
    }

    /// Invoke `request_render` on every live consumer, in attachment
    /// order, pruning dead entries first.
    ///
    /// Each callback runs under `catch_unwind`; the first panic resumes
    /// after the sweep so one bad consumer cannot starve the rest.
    pub fn broadcast(&self) {
        let (live, stale) = {
            let mut entries = self.entries.borrow_mut();
            let before = entries.len();
            entries.retain(|w| w.strong_count() > 0);
            let stale = (before - entries.len()) as u64;
            let live: Vec<Rc<dyn Consumer>> =
                entries.iter().filter_map(Weak::upgrade).collect();
            (live, stale)
        };

        if live.is_empty() && stale == 0 {
            return;
        }

        let consumers = live.len() as u64;
        let sweep_start = Instant::now();
        let span = info_span!(
            "locale.broadcast",
            consumers,
            stale,
            duration_us = tracing::field::Empty
        );
        let _entered = span.enter();

        let mut first_panic: Option<Box<dyn std::any::Any + Send>> = None;
        for consumer in live {
            let result =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| consumer.request_render()));
            if let Err(payload) = result
                && first_panic.is_none()
            {
                first_panic = Some(payload);
            }
        }

        span.record("duration_us", sweep_start.elapsed().as_micros() as u64);

        if let Some(payload) = first_panic {
            std::panic::resume_unwind(payload);
        }
    }

    /// Live consumers currently attached.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ConsumerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsumerSet")
            .field("live", &self.len())
            .field("slots", &self.entries.borrow().len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};
    use tracing::field::{Field, Visit};

    struct RenderCounter {
        renders: Cell<u32>,
    }

    impl RenderCounter {
        fn shared() -> Rc<Self> {
            Rc::new(Self {
                renders: Cell::new(0),
            })
        }
    }

    impl Consumer for RenderCounter {
        fn request_render(&self) {
            self.renders.set(self.renders.get() + 1);
        }
    }

    #[derive(Default)]
    struct BroadcastSpanVisitor {
        consumers: Option<u64>,
        stale: Option<u64>,
    }

    impl Visit for BroadcastSpanVisitor {
        fn record_u64(&mut self, field: &Field, value: u64) {
            match field.name() {
                "consumers" => self.consumers = Some(value),
                "stale" => self.stale = Some(value),
                _ => {}
            }
        }

        fn record_i64(&mut self, field: &Field, value: i64) {
            if value >= 0 {
                self.record_u64(field, value as u64);
            }
        }

        fn record_debug(&mut self, _field: &Field, _value: &dyn std::fmt::Debug) {}
    }

    struct BroadcastSpanCapture {
        next_id: AtomicU64,
        spans: Arc<Mutex<Vec<(u64, u64)>>>,
    }

    impl tracing::Subscriber for BroadcastSpanCapture {
        fn enabled(&self, _metadata: &tracing::Metadata<'_>) -> bool {
            true
        }

        fn new_span(&self, attrs: &tracing::span::Attributes<'_>) -> tracing::span::Id {
            if attrs.metadata().name() == "locale.broadcast" {
                let mut visitor = BroadcastSpanVisitor::default();
                attrs.record(&mut visitor);
                self.spans.lock().expect("span capture lock").push((
                    visitor.consumers.unwrap_or(0),
                    visitor.stale.unwrap_or(0),
                ));
            }
            tracing::span::Id::from_u64(self.next_id.fetch_add(1, Ordering::Relaxed))
        }

        fn record(&self, _span: &tracing::span::Id, _values: &tracing::span::Record<'_>) {}

        fn record_follows_from(&self, _span: &tracing::span::Id, _follows: &tracing::span::Id) {}

        fn event(&self, _event: &tracing::Event<'_>) {}

        fn enter(&self, _span: &tracing::span::Id) {}

        fn exit(&self, _span: &tracing::span::Id) {}
    }

    fn capture_broadcast_spans(run: impl FnOnce()) -> Vec<(u64, u64)> {
        let spans = Arc::new(Mutex::new(Vec::new()));
        let subscriber = BroadcastSpanCapture {
            next_id: AtomicU64::new(1),
            spans: Arc::clone(&spans),
        };
        let _guard = tracing::subscriber::set_default(subscriber);
        run();
        spans.lock().expect("span capture lock").clone()
    }

    #[test]
    fn broadcast_reaches_every_consumer_once() {
        let set = ConsumerSet::new();
        let a = RenderCounter::shared();
        let b = RenderCounter::shared();
        set.attach(&(a.clone() as Rc<dyn Consumer>));
        set.attach(&(b.clone() as Rc<dyn Consumer>));

        set.broadcast();

        assert_eq!(a.renders.get(), 1);
        assert_eq!(b.renders.get(), 1);
    }

    #[test]
    fn attach_twice_is_one_membership() {
        let set = ConsumerSet::new();
        let consumer = RenderCounter::shared();
        let as_dyn: Rc<dyn Consumer> = consumer.clone();

        set.attach(&as_dyn);
        set.attach(&as_dyn);
        assert_eq!(set.len(), 1);

        set.broadcast();
        assert_eq!(consumer.renders.get(), 1);
    }

    #[test]
    fn detach_stops_future_renders_and_is_idempotent() {
        let set = ConsumerSet::new();
        let consumer = RenderCounter::shared();
        let as_dyn: Rc<dyn Consumer> = consumer.clone();

        set.attach(&as_dyn);
        set.broadcast();
        assert_eq!(consumer.renders.get(), 1);

        set.detach(&as_dyn);
        set.detach(&as_dyn);
        set.broadcast();
        assert_eq!(consumer.renders.get(), 1);
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn dropped_consumer_is_skipped_silently() {
        let set = ConsumerSet::new();
        let keeper = RenderCounter::shared();
        set.attach(&(keeper.clone() as Rc<dyn Consumer>));

        {
            let ephemeral = RenderCounter::shared();
            set.attach(&(ephemeral.clone() as Rc<dyn Consumer>));
            assert_eq!(set.len(), 2);
        }

        assert_eq!(set.len(), 1, "dead entry no longer counts");
        set.broadcast();
        assert_eq!(keeper.renders.get(), 1);
    }

    #[test]
    fn broadcast_order_is_attachment_order() {
        struct Logger {
            tag: char,
            log: Rc<RefCell<Vec<char>>>,
        }
        impl Consumer for Logger {
            fn request_render(&self) {
                self.log.borrow_mut().push(self.tag);
            }
        }

        let set = ConsumerSet::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let consumers: Vec<Rc<dyn Consumer>> = ['a', 'b', 'c']
            .into_iter()
            .map(|tag| {
                Rc::new(Logger {
                    tag,
                    log: Rc::clone(&log),
                }) as Rc<dyn Consumer>
            })
            .collect();
        for consumer in &consumers {
            set.attach(consumer);
        }

        set.broadcast();
        assert_eq!(*log.borrow(), vec!['a', 'b', 'c']);
    }

    #[test]
    fn panicking_consumer_does_not_starve_the_rest() {
        struct Bomb;
        impl Consumer for Bomb {
            fn request_render(&self) {
                panic!("render exploded");
            }
        }

        let set = ConsumerSet::new();
        let bomb: Rc<dyn Consumer> = Rc::new(Bomb);
        let survivor = RenderCounter::shared();
        set.attach(&bomb);
        set.attach(&(survivor.clone() as Rc<dyn Consumer>));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| set.broadcast()));

        assert!(result.is_err(), "the panic must resurface");
        assert_eq!(survivor.renders.get(), 1, "later consumers still rendered");
    }

    #[test]
    fn overrides_default_to_none() {
        struct Plain;
        impl Consumer for Plain {
            fn request_render(&self) {}
        }

        assert_eq!(Plain.locale_override(), None);
        assert_eq!(Plain.direction_override(), None);
    }

    #[test]
    fn broadcast_span_counts_live_and_stale() {
        let set = ConsumerSet::new();
        let keeper = RenderCounter::shared();
        set.attach(&(keeper.clone() as Rc<dyn Consumer>));
        {
            let ephemeral = RenderCounter::shared();
            set.attach(&(ephemeral.clone() as Rc<dyn Consumer>));
        }

        let spans = capture_broadcast_spans(|| set.broadcast());
        assert_eq!(spans, vec![(1, 1)]);
    }

    #[test]
    fn empty_set_broadcast_is_silent() {
        let set = ConsumerSet::new();
        let spans = capture_broadcast_spans(|| set.broadcast());
        assert!(spans.is_empty());
    }
}
