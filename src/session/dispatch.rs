//! Runs session commands against the backend.
//!
//! Every backend call is its own tokio task; completions come back over an
//! mpsc channel so the owner of the [`SearchSession`] stays the single
//! writer. Suggestion lookups go through the [`Debouncer`] instead of being
//! spawned directly.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{Command, Event, SearchSession};
use crate::api::{ApiError, SearchBackend};
use crate::search::suggest::{DebounceState, Debouncer};

pub struct Dispatcher {
    backend: Arc<dyn SearchBackend>,
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
    debouncer: Debouncer,
    outstanding: usize,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn SearchBackend>, suggest_delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            backend,
            tx,
            rx,
            debouncer: Debouncer::new(suggest_delay),
            outstanding: 0,
        }
    }

    /// Start a command. Must be called from within a tokio runtime.
    pub fn submit(&mut self, command: Command) {
        debug!(command = command.name(), "dispatch");
        match command {
            Command::CancelSuggest => {
                self.debouncer.cancel();
            }
            Command::Suggest { seq, text } => {
                let backend = Arc::clone(&self.backend);
                let tx = self.tx.clone();
                self.debouncer.arm(seq, async move {
                    let result = backend.suggest(&text).await;
                    let _ = tx.send(Event::Suggestions { seq, result });
                });
            }
            other => {
                self.outstanding += 1;
                let backend = Arc::clone(&self.backend);
                let tx = self.tx.clone();
                let name = other.name();
                // Sent instead when the call never completes, so `outstanding`
                // always drains.
                let fallback = failure_event(
                    &other,
                    ApiError::Transport(format!("{name} did not complete")),
                );
                let call = tokio::spawn(async move { execute(backend.as_ref(), other).await });
                tokio::spawn(async move {
                    let event = match call.await {
                        Ok(event) => event,
                        Err(err) => {
                            warn!(command = name, error = %err, "backend task failed");
                            fallback
                        }
                    };
                    if let Some(event) = event {
                        let _ = tx.send(event);
                    }
                });
            }
        }
    }

    pub fn submit_all(&mut self, commands: impl IntoIterator<Item = Command>) {
        for command in commands {
            self.submit(command);
        }
    }

    /// Number of spawned calls whose completion has not been received.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn suggest_state(&self) -> DebounceState {
        self.debouncer.state()
    }

    /// A completion, if one is ready.
    pub fn try_next(&mut self) -> Option<Event> {
        let event = self.rx.try_recv().ok()?;
        self.received(&event);
        Some(event)
    }

    pub async fn next(&mut self) -> Option<Event> {
        let event = self.rx.recv().await?;
        self.received(&event);
        Some(event)
    }

    fn received(&mut self, event: &Event) {
        if !matches!(event, Event::Suggestions { .. }) {
            self.outstanding = self.outstanding.saturating_sub(1);
        }
    }

    /// Apply completions to `session` (submitting any follow-up commands)
    /// until no spawned call is left. Pending suggestion timers are not
    /// waited for.
    pub async fn settle(&mut self, session: &mut SearchSession) {
        while self.outstanding > 0 {
            let Some(event) = self.next().await else {
                break;
            };
            if let Some(follow_up) = session.apply(event) {
                self.submit(follow_up);
            }
        }
    }

    /// Apply every completion that is already waiting, without blocking.
    /// Returns whether anything was applied.
    pub fn drain(&mut self, session: &mut SearchSession) -> bool {
        let mut applied = false;
        while let Some(event) = self.try_next() {
            applied = true;
            if let Some(follow_up) = session.apply(event) {
                self.submit(follow_up);
            }
        }
        applied
    }
}

/// Perform one non-debounced command and wrap the outcome as an event.
pub async fn execute(backend: &dyn SearchBackend, command: Command) -> Option<Event> {
    let event = match command {
        Command::Search(request) => Event::SearchFinished(backend.search(&request).await),
        Command::ListCollections => Event::CollectionsLoaded(backend.list_collections().await),
        Command::CreateCollection(body) => {
            Event::CollectionCreated(backend.create_collection(&body).await)
        }
        Command::AddItems {
            collection_id,
            body,
        } => Event::ItemsAdded {
            collection_id,
            result: backend.add_collection_items(collection_id, &body).await,
        },
        Command::SaveSearch(record) => Event::SearchSaved(backend.save_search(&record).await),
        Command::LoadSavedSearches => Event::SavedSearchesLoaded(backend.saved_searches().await),
        Command::RunSavedSearch(id) => {
            Event::SavedSearchExecuted(backend.execute_saved_search(id).await)
        }
        Command::DeleteSavedSearch(id) => Event::SavedSearchDeleted {
            id,
            result: backend.delete_saved_search(id).await,
        },
        Command::LoadHistory => Event::HistoryLoaded(backend.search_history().await),
        Command::SaveHistoryEntry(id) => Event::HistoryEntrySaved {
            id,
            result: backend.save_history_entry(id).await,
        },
        Command::Suggest { .. } | Command::CancelSuggest => return None,
    };
    Some(event)
}

/// The completion a command would produce had its call failed with `err`.
fn failure_event(command: &Command, err: ApiError) -> Option<Event> {
    let event = match command {
        Command::Search(_) => Event::SearchFinished(Err(err)),
        Command::Suggest { seq, .. } => Event::Suggestions {
            seq: *seq,
            result: Err(err),
        },
        Command::ListCollections => Event::CollectionsLoaded(Err(err)),
        Command::CreateCollection(_) => Event::CollectionCreated(Err(err)),
        Command::AddItems { collection_id, .. } => Event::ItemsAdded {
            collection_id: *collection_id,
            result: Err(err),
        },
        Command::SaveSearch(_) => Event::SearchSaved(Err(err)),
        Command::LoadSavedSearches => Event::SavedSearchesLoaded(Err(err)),
        Command::RunSavedSearch(_) => Event::SavedSearchExecuted(Err(err)),
        Command::DeleteSavedSearch(id) => Event::SavedSearchDeleted {
            id: *id,
            result: Err(err),
        },
        Command::LoadHistory => Event::HistoryLoaded(Err(err)),
        Command::SaveHistoryEntry(id) => Event::HistoryEntrySaved {
            id: *id,
            result: Err(err),
        },
        Command::CancelSuggest => return None,
    };
    Some(event)
}
