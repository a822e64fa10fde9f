//! In-process change notifications.
//!
//! A view that mutates the store publishes one [`AppEvent`] afterwards; every
//! view that depends on that collection has subscribed a handler and re-queries
//! the store when it runs. Delivery is synchronous: by the time `publish`
//! returns, every handler registered at the moment of the call has run, in
//! registration order.
//!
//! The bus is a cheap cloneable handle. It is created once at startup and
//! handed to each view instead of living in a global.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use anyhow::Result;

/// Which collection changed. Adding an entity type means adding a variant here
/// and teaching the derived views that should react to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppEvent {
    BookChanged,
    ReaderChanged,
    BorrowRecordChanged,
}

impl AppEvent {
    pub const ALL: [AppEvent; 3] = [
        AppEvent::BookChanged,
        AppEvent::ReaderChanged,
        AppEvent::BorrowRecordChanged,
    ];
}

impl fmt::Display for AppEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AppEvent::BookChanged => "book-changed",
            AppEvent::ReaderChanged => "reader-changed",
            AppEvent::BorrowRecordChanged => "borrow-record-changed",
        };
        f.write_str(name)
    }
}

/// Identity of one registration, unique for the life of the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type Handler = Arc<dyn Fn(&AppEvent) -> Result<()> + Send + Sync>;

struct Entry {
    id: SubscriptionId,
    handler: Handler,
}

struct Inner {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<Entry>>,
}

#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                next_id: AtomicU64::new(1),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Register `handler` behind every handler already registered. The handler
    /// stays registered until the returned [`Subscription`] is dropped or
    /// explicitly unsubscribed.
    pub fn subscribe<H>(&self, handler: H) -> Subscription
    where
        H: Fn(&AppEvent) -> Result<()> + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.lock().push(Entry {
            id,
            handler: Arc::new(handler),
        });
        tracing::debug!(subscription = %id, "subscribed to event bus");
        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Remove a handler. Returns `false` when the id was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.remove(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().len()
    }

    /// Deliver `event` to every current subscriber, in registration order.
    ///
    /// A handler that fails or panics is logged and recorded in the returned
    /// report; the remaining handlers still run. The subscriber list is copied
    /// before delivery starts, so handlers may subscribe, unsubscribe, or
    /// publish again without deadlocking. Handlers added during delivery do
    /// not see the in-flight event; handlers removed during delivery still
    /// receive it and miss every later one.
    pub fn publish(&self, event: AppEvent) -> DeliveryReport {
        let snapshot: Vec<(SubscriptionId, Handler)> = self
            .inner
            .lock()
            .iter()
            .map(|entry| (entry.id, Arc::clone(&entry.handler)))
            .collect();

        tracing::debug!(%event, subscribers = snapshot.len(), "publishing");

        let mut report = DeliveryReport {
            event,
            delivered: 0,
            failures: Vec::new(),
        };

        for (id, handler) in snapshot {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(&event)));
            let message = match outcome {
                Ok(Ok(())) => {
                    report.delivered += 1;
                    continue;
                }
                Ok(Err(err)) => format!("{err:#}"),
                Err(payload) => panic_message(payload.as_ref()),
            };
            tracing::warn!(%event, subscription = %id, error = %message, "event handler failed");
            report.failures.push(HandlerFailure {
                subscription: id,
                message,
            });
        }

        report
    }
}

impl Inner {
    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Entry>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.lock();
        let before = subscribers.len();
        subscribers.retain(|entry| entry.id != id);
        let removed = subscribers.len() != before;
        if removed {
            tracing::debug!(subscription = %id, "unsubscribed from event bus");
        }
        removed
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {text}")
    } else if let Some(text) = payload.downcast_ref::<String>() {
        format!("handler panicked: {text}")
    } else {
        "handler panicked".to_string()
    }
}

/// Registration handle. Dropping it removes the handler from the bus.
#[must_use = "dropping a Subscription unsubscribes its handler"]
pub struct Subscription {
    id: SubscriptionId,
    bus: Weak<Inner>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn unsubscribe(self) {
        // Drop does the work.
    }

    /// Keep the handler registered for as long as the bus lives.
    pub fn detach(self) -> SubscriptionId {
        let id = self.id;
        std::mem::forget(self);
        id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            inner.remove(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Subscription").field(&self.id).finish()
    }
}

/// What happened during one `publish` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub event: AppEvent,
    pub delivered: usize,
    pub failures: Vec<HandlerFailure>,
}

impl DeliveryReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    pub subscription: SubscriptionId,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use anyhow::anyhow;
    use pretty_assertions::assert_eq;

    use super::*;

    type Log = Arc<Mutex<Vec<(&'static str, AppEvent)>>>;
    type BoxedHandler = Box<dyn Fn(&AppEvent) -> Result<()> + Send + Sync>;

    /// Shared log plus a factory for handlers that append `(name, event)`.
    fn recorder() -> (Log, impl Fn(&'static str) -> BoxedHandler) {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let shared = Arc::clone(&log);
        let make = move |name: &'static str| -> BoxedHandler {
            let log = Arc::clone(&shared);
            Box::new(move |event: &AppEvent| {
                log.lock().unwrap().push((name, *event));
                Ok(())
            })
        };
        (log, make)
    }

    #[test]
    fn handlers_run_once_each_in_registration_order() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let _a = bus.subscribe(make("a"));
        let _b = bus.subscribe(make("b"));
        let _c = bus.subscribe(make("c"));

        let report = bus.publish(AppEvent::BookChanged);

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                ("a", AppEvent::BookChanged),
                ("b", AppEvent::BookChanged),
                ("c", AppEvent::BookChanged),
            ]
        );
        assert_eq!(report.delivered, 3);
        assert!(report.is_clean());
    }

    #[test]
    fn failing_handler_does_not_stop_delivery() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let _a = bus.subscribe(make("a"));
        let broken = bus.subscribe(|_| Err(anyhow!("store offline")));
        let _b = bus.subscribe(make("b"));

        let report = bus.publish(AppEvent::ReaderChanged);

        assert_eq!(log.lock().unwrap().len(), 2);
        assert_eq!(report.delivered, 2);
        assert_eq!(
            report.failures,
            vec![HandlerFailure {
                subscription: broken.id(),
                message: "store offline".into(),
            }]
        );
    }

    #[test]
    fn panicking_handler_is_isolated() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let _boom = bus.subscribe(|_| panic!("boom"));
        let _a = bus.subscribe(make("a"));

        let report = bus.publish(AppEvent::BorrowRecordChanged);

        assert_eq!(*log.lock().unwrap(), vec![("a", AppEvent::BorrowRecordChanged)]);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].message.contains("boom"));

        // The bus is still usable afterwards.
        let again = bus.publish(AppEvent::BookChanged);
        assert_eq!(again.delivered, 1);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let subscription = bus.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish(AppEvent::BookChanged);
        drop(subscription);
        bus.publish(AppEvent::BookChanged);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn explicit_unsubscribe_by_id() {
        let bus = EventBus::new();
        let id = bus.subscribe(|_| Ok(())).detach();
        assert_eq!(bus.subscriber_count(), 1);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn subscribing_during_delivery_waits_for_next_event() {
        let bus = EventBus::new();
        let late_hits = Arc::new(AtomicUsize::new(0));
        let parked: Arc<Mutex<Vec<Subscription>>> = Arc::new(Mutex::new(Vec::new()));

        let handle = bus.clone();
        let hits = Arc::clone(&late_hits);
        let store = Arc::clone(&parked);
        let _registrar = bus.subscribe(move |_| {
            let hits = Arc::clone(&hits);
            let late = handle.subscribe(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
            store.lock().unwrap().push(late);
            Ok(())
        });

        bus.publish(AppEvent::BookChanged);
        assert_eq!(late_hits.load(Ordering::SeqCst), 0);

        bus.publish(AppEvent::BookChanged);
        assert_eq!(late_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribing_during_delivery_takes_effect_on_next_event() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let doomed_id: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));

        let handle = bus.clone();
        let held = Arc::clone(&slot);
        let by_id = Arc::clone(&doomed_id);
        let _remover = bus.subscribe(move |_| {
            drop(held.lock().unwrap().take());
            if let Some(id) = by_id.lock().unwrap().take() {
                handle.unsubscribe(id);
            }
            Ok(())
        });
        *slot.lock().unwrap() = Some(bus.subscribe(make("dropped")));
        *doomed_id.lock().unwrap() = Some(bus.subscribe(make("by-id")).detach());
        assert_eq!(bus.subscriber_count(), 3);

        let report = bus.publish(AppEvent::ReaderChanged);
        assert_eq!(report.delivered, 3);
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish(AppEvent::BookChanged);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                ("dropped", AppEvent::ReaderChanged),
                ("by-id", AppEvent::ReaderChanged),
            ]
        );
    }

    #[test]
    fn handler_may_publish_reentrantly() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let handle = bus.clone();
        let _chain = bus.subscribe(move |event| {
            if *event == AppEvent::BorrowRecordChanged {
                handle.publish(AppEvent::BookChanged);
            }
            Ok(())
        });
        let _watch = bus.subscribe(make("watch"));

        bus.publish(AppEvent::BorrowRecordChanged);

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                ("watch", AppEvent::BookChanged),
                ("watch", AppEvent::BorrowRecordChanged),
            ]
        );
    }
}
