//! Values computed from store queries rather than stored directly.
//!
//! A derived view recomputes its whole value when one of the events it
//! watches arrives, but only while it is the active page. An inactive view
//! just remembers that it is stale; activating it recomputes immediately so it
//! never shows old numbers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::db::DataAccessError;
use crate::events::{AppEvent, EventBus, Subscription};

type Compute<T> = Arc<dyn Fn() -> Result<T, DataAccessError> + Send + Sync>;

struct DerivedState<T> {
    value: T,
    active: bool,
    stale: bool,
    last_error: Option<String>,
    recomputes: u64,
}

pub struct DerivedView<T> {
    state: Arc<Mutex<DerivedState<T>>>,
    compute: Compute<T>,
    _subscription: Subscription,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn recompute<T>(
    compute: &Compute<T>,
    state: &Mutex<DerivedState<T>>,
) -> Result<(), DataAccessError> {
    let outcome = compute();
    let mut state = lock(state);
    match outcome {
        Ok(value) => {
            state.value = value;
            state.stale = false;
            state.last_error = None;
            state.recomputes += 1;
            Ok(())
        }
        Err(err) => {
            state.stale = true;
            state.last_error = Some(err.to_string());
            Err(err)
        }
    }
}

impl<T: Clone + Default + Send + 'static> DerivedView<T> {
    /// Start inactive and stale; nothing is queried until [`activate`] or
    /// [`refresh`] runs.
    ///
    /// [`activate`]: DerivedView::activate
    /// [`refresh`]: DerivedView::refresh
    pub fn new<C>(bus: &EventBus, watches: &'static [AppEvent], compute: C) -> Self
    where
        C: Fn() -> Result<T, DataAccessError> + Send + Sync + 'static,
    {
        let compute: Compute<T> = Arc::new(compute);
        let state = Arc::new(Mutex::new(DerivedState {
            value: T::default(),
            active: false,
            stale: true,
            last_error: None,
            recomputes: 0,
        }));

        let subscription = {
            let compute = Arc::clone(&compute);
            let state = Arc::clone(&state);
            bus.subscribe(move |event| {
                if !watches.contains(event) {
                    return Ok(());
                }
                {
                    let mut current = lock(&state);
                    if !current.active {
                        current.stale = true;
                        return Ok(());
                    }
                }
                recompute(&compute, &state)?;
                Ok(())
            })
        };

        Self {
            state,
            compute,
            _subscription: subscription,
        }
    }

    /// Become the visible page and recompute right away.
    pub fn activate(&self) -> Result<(), DataAccessError> {
        lock(&self.state).active = true;
        self.refresh()
    }

    pub fn deactivate(&self) {
        lock(&self.state).active = false;
    }

    /// Recompute regardless of activity.
    pub fn refresh(&self) -> Result<(), DataAccessError> {
        recompute(&self.compute, &self.state)
    }

    pub fn value(&self) -> T {
        lock(&self.state).value.clone()
    }

    pub fn is_active(&self) -> bool {
        lock(&self.state).active
    }

    pub fn is_stale(&self) -> bool {
        lock(&self.state).stale
    }

    pub fn last_error(&self) -> Option<String> {
        lock(&self.state).last_error.clone()
    }

    /// Completed recomputations, for diagnostics.
    pub fn recomputes(&self) -> u64 {
        lock(&self.state).recomputes
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI64, Ordering};

    use super::*;

    fn counter_view(bus: &EventBus) -> (Arc<AtomicI64>, DerivedView<i64>) {
        let source = Arc::new(AtomicI64::new(0));
        let read = Arc::clone(&source);
        let view = DerivedView::new(bus, &[AppEvent::BookChanged], move || {
            Ok(read.load(Ordering::SeqCst))
        });
        (source, view)
    }

    #[test]
    fn inactive_view_only_marks_stale() {
        let bus = EventBus::new();
        let (source, view) = counter_view(&bus);

        source.store(7, Ordering::SeqCst);
        bus.publish(AppEvent::BookChanged);

        assert_eq!(view.value(), 0);
        assert!(view.is_stale());
        assert_eq!(view.recomputes(), 0);

        view.activate().unwrap();
        assert_eq!(view.value(), 7);
        assert!(!view.is_stale());
    }

    #[test]
    fn active_view_recomputes_on_watched_events_only() {
        let bus = EventBus::new();
        let (source, view) = counter_view(&bus);
        view.activate().unwrap();

        source.store(3, Ordering::SeqCst);
        bus.publish(AppEvent::ReaderChanged);
        assert_eq!(view.value(), 0);

        bus.publish(AppEvent::BookChanged);
        assert_eq!(view.value(), 3);
        assert_eq!(view.recomputes(), 2);

        view.deactivate();
        source.store(4, Ordering::SeqCst);
        bus.publish(AppEvent::BookChanged);
        assert_eq!(view.value(), 3);
        assert!(view.is_stale());
    }

    #[test]
    fn failed_recompute_keeps_previous_value() {
        let bus = EventBus::new();
        let healthy = Arc::new(std::sync::atomic::AtomicBool::new(true));
        let flag = Arc::clone(&healthy);
        let view = DerivedView::new(&bus, &AppEvent::ALL, move || {
            if flag.load(Ordering::SeqCst) {
                Ok(1_i64)
            } else {
                Err(DataAccessError::Invalid("store offline".into()))
            }
        });
        view.activate().unwrap();

        healthy.store(false, Ordering::SeqCst);
        let report = bus.publish(AppEvent::ReaderChanged);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(view.value(), 1);
        assert_eq!(view.last_error().as_deref(), Some("store offline"));
    }
}
