//! A filterable list of one entity type, kept in step with the store.
//!
//! The panel owns a snapshot of rows plus the current filter and selection.
//! Mutations go through the façade and, only when they succeed, publish the
//! façade's change event. The panel subscribes to the events listed in
//! `F::WATCHES` and re-queries with its current filter whenever one arrives,
//! including the ones it published itself.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::db::DataAccessError;
use crate::events::{EventBus, Subscription};
use crate::facade::Facade;
use crate::models::Record;

use super::status::StatusMessage;

struct PanelRows<E> {
    rows: Vec<E>,
    filter: String,
    selected: Option<usize>,
    last_error: Option<String>,
}

impl<E> Default for PanelRows<E> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            filter: String::new(),
            selected: None,
            last_error: None,
        }
    }
}

impl<E: Record> PanelRows<E> {
    /// Swap in freshly queried rows, keeping the selection on the same record
    /// when it survived the reload.
    fn replace(&mut self, rows: Vec<E>) {
        let selected_id = self
            .selected
            .and_then(|idx| self.rows.get(idx))
            .map(Record::id);
        self.rows = rows;
        self.selected = match selected_id {
            Some(id) => self
                .rows
                .iter()
                .position(|row| row.id() == id)
                .or_else(|| self.clamped(self.selected)),
            None => None,
        };
    }

    fn clamped(&self, index: Option<usize>) -> Option<usize> {
        match index {
            _ if self.rows.is_empty() => None,
            Some(idx) => Some(idx.min(self.rows.len() - 1)),
            None => None,
        }
    }
}

/// What a renderer needs to draw the panel.
#[derive(Debug, Clone)]
pub struct PanelSnapshot<E> {
    pub rows: Vec<E>,
    pub filter: String,
    pub selected: Option<usize>,
    pub last_error: Option<String>,
}

pub struct TablePanel<F: Facade> {
    facade: Arc<F>,
    bus: EventBus,
    state: Arc<Mutex<PanelRows<F::Entity>>>,
    _subscription: Subscription,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Re-run the panel's current query. The state lock is released while the
/// façade runs so a handler and the panel never wait on each other.
fn refresh<F: Facade>(
    facade: &F,
    state: &Mutex<PanelRows<F::Entity>>,
) -> Result<usize, DataAccessError> {
    let filter = lock(state).filter.clone();
    let result = if filter.is_empty() {
        facade.find_all()
    } else {
        facade.search(&filter)
    };

    let mut rows = lock(state);
    match result {
        Ok(fresh) => {
            rows.replace(fresh);
            rows.last_error = None;
            Ok(rows.rows.len())
        }
        Err(err) => {
            rows.last_error = Some(err.to_string());
            Err(err)
        }
    }
}

impl<F: Facade> TablePanel<F> {
    /// Build the panel, subscribe it to the events it depends on, and run the
    /// first load. A failing first load is kept in `last_error` rather than
    /// returned so the shell can still come up.
    pub fn new(facade: Arc<F>, bus: EventBus) -> Self {
        let state = Arc::new(Mutex::new(PanelRows::default()));

        let subscription = {
            let facade = Arc::clone(&facade);
            let state = Arc::clone(&state);
            bus.subscribe(move |event| {
                if *event != F::CHANGED && !F::WATCHES.contains(event) {
                    return Ok(());
                }
                refresh(facade.as_ref(), &state)?;
                Ok(())
            })
        };

        let panel = Self {
            facade,
            bus,
            state,
            _subscription: subscription,
        };
        if let Err(err) = panel.reload() {
            tracing::warn!(entity = F::ENTITY, error = %err, "initial load failed");
        }
        panel
    }

    /// Replace the filter and re-query: `find_all` when the trimmed keyword is
    /// empty or absent, `search` otherwise.
    pub fn load_data(&self, filter: Option<&str>) -> Result<usize, DataAccessError> {
        lock(&self.state).filter = filter.unwrap_or_default().trim().to_string();
        refresh(self.facade.as_ref(), &self.state)
    }

    /// Live search as the user types.
    pub fn set_filter(&self, text: &str) -> Result<usize, DataAccessError> {
        self.load_data(Some(text))
    }

    pub fn reload(&self) -> Result<usize, DataAccessError> {
        refresh(self.facade.as_ref(), &self.state)
    }

    pub fn snapshot(&self) -> PanelSnapshot<F::Entity> {
        let state = lock(&self.state);
        PanelSnapshot {
            rows: state.rows.clone(),
            filter: state.filter.clone(),
            selected: state.selected,
            last_error: state.last_error.clone(),
        }
    }

    pub fn rows(&self) -> Vec<F::Entity> {
        lock(&self.state).rows.clone()
    }

    pub fn filter(&self) -> String {
        lock(&self.state).filter.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        lock(&self.state).last_error.clone()
    }

    pub fn select(&self, index: Option<usize>) {
        let mut state = lock(&self.state);
        state.selected = state.clamped(index);
    }

    pub fn move_selection(&self, offset: isize) {
        let mut state = lock(&self.state);
        if state.rows.is_empty() {
            state.selected = None;
            return;
        }
        let last = state.rows.len() as isize - 1;
        let next = match state.selected {
            Some(idx) => (idx as isize + offset).clamp(0, last),
            None if offset < 0 => last,
            None => 0,
        };
        state.selected = Some(next as usize);
    }

    pub fn select_first(&self) {
        self.select(Some(0));
    }

    pub fn select_last(&self) {
        self.select(Some(usize::MAX));
    }

    /// Move the selection onto the record with `id`, if it is listed.
    pub fn focus(&self, id: i64) {
        let mut state = lock(&self.state);
        if let Some(idx) = state.rows.iter().position(|row| row.id() == id) {
            state.selected = Some(idx);
        }
    }

    pub fn selected(&self) -> Option<F::Entity> {
        let state = lock(&self.state);
        state.selected.and_then(|idx| state.rows.get(idx)).cloned()
    }

    /// Run one store mutation. On success the change event is published
    /// exactly once; on failure nothing is published and the rows stay as
    /// they were.
    pub fn mutate<R>(
        &self,
        action: &str,
        op: impl FnOnce(&F) -> Result<R, DataAccessError>,
    ) -> Result<R, StatusMessage> {
        match op(self.facade.as_ref()) {
            Ok(value) => {
                tracing::info!(entity = F::ENTITY, action, "store updated");
                let report = self.bus.publish(F::CHANGED);
                if !report.is_clean() {
                    tracing::warn!(
                        event = %report.event,
                        failures = report.failures.len(),
                        "some views failed to refresh"
                    );
                }
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(entity = F::ENTITY, action, error = %err, "store update failed");
                Err(StatusMessage::error(format!("Failed to {action}: {err}")))
            }
        }
    }

    pub fn create(&self, draft: &F::Draft) -> StatusMessage {
        let action = format!("add {}", F::ENTITY);
        match self.mutate(&action, |facade| facade.create(draft)) {
            Ok(created) => {
                self.focus(created.id());
                StatusMessage::info(format!("Added {} #{}.", F::ENTITY, created.id()))
            }
            Err(message) => message,
        }
    }

    pub fn update(&self, id: i64, draft: &F::Draft) -> StatusMessage {
        let action = format!("update {}", F::ENTITY);
        match self.mutate(&action, |facade| facade.update(id, draft)) {
            Ok(()) => {
                self.focus(id);
                StatusMessage::info(format!("Updated {} #{id}.", F::ENTITY))
            }
            Err(message) => message,
        }
    }

    pub fn delete(&self, id: i64) -> StatusMessage {
        let action = format!("delete {}", F::ENTITY);
        match self.mutate(&action, |facade| facade.delete(id)) {
            Ok(()) => StatusMessage::info(format!("Deleted {} #{id}.", F::ENTITY)),
            Err(message) => message,
        }
    }

    /// Delete the selected row. With nothing selected this only returns a
    /// warning.
    pub fn delete_selected(&self) -> StatusMessage {
        match self.selected() {
            Some(row) => self.delete(row.id()),
            None => StatusMessage::warning(format!("Select a {} to delete.", F::ENTITY)),
        }
    }

    /// Fetch a fresh copy of the selected record to prefill an edit form.
    pub fn selected_for_edit(&self) -> Result<F::Entity, StatusMessage> {
        let row = self
            .selected()
            .ok_or_else(|| StatusMessage::warning(format!("Select a {} to update.", F::ENTITY)))?;
        match self.facade.find_by_id(row.id()) {
            Ok(Some(fresh)) => Ok(fresh),
            Ok(None) => Err(StatusMessage::error(format!(
                "Could not find {} #{}.",
                F::ENTITY,
                row.id()
            ))),
            Err(err) => Err(StatusMessage::error(format!(
                "Failed to load {}: {err}",
                F::ENTITY
            ))),
        }
    }
}
