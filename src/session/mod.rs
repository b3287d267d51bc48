//! Search session controller.
//!
//! [`SearchSession`] owns every piece of mutable page state. Its operations
//! are synchronous state transitions; anything that needs the backend comes
//! back as a [`Command`] for the [`dispatch::Dispatcher`] to run, and the
//! completion is fed back through [`SearchSession::apply`] as an [`Event`].

pub mod collections;
pub mod controller;
pub mod dispatch;
pub mod selection;

use serde::Serialize;
use std::time::{Duration, Instant};

use crate::api::ApiError;
use crate::model::types::{
    Ack, Collection, CollectionItems, ExecutedSearch, HistoryEntry, NewCollection,
    SaveSearchRecord, SavedSearch, SearchResponse, Suggestion,
};
use crate::search::query::{QueryState, SearchRequest};
use crate::search::suggest::SuggestTracker;
use selection::SelectionSet;

pub use dispatch::Dispatcher;

/// How long a notice stays on screen.
pub const NOTICE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// Transient message shown above the results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    pub link: Option<String>,
    pub expires_at: Instant,
}

impl Notice {
    pub fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
            link: None,
            expires_at: Instant::now() + NOTICE_TTL,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, text)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, text)
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// What the results area currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResultsPane {
    /// Nothing searched yet, or every term was removed.
    #[default]
    Cleared,
    Loaded(SearchResponse),
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionsView {
    #[default]
    List,
    CreateForm,
}

/// State of the "add to collection" dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionsPanel {
    pub open: bool,
    pub view: CollectionsView,
    /// `None` until the first listing arrives.
    pub items: Option<Vec<Collection>>,
    pub load_failed: bool,
    pub form_title: String,
    pub form_description: String,
}

/// A backend call requested by a session operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Search(SearchRequest),
    /// Debounced; only the latest `seq` may reach the network.
    Suggest {
        seq: u64,
        text: String,
    },
    CancelSuggest,
    ListCollections,
    CreateCollection(NewCollection),
    AddItems {
        collection_id: i64,
        body: CollectionItems,
    },
    SaveSearch(SaveSearchRecord),
    LoadSavedSearches,
    RunSavedSearch(i64),
    DeleteSavedSearch(i64),
    LoadHistory,
    SaveHistoryEntry(i64),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Search(_) => "search",
            Command::Suggest { .. } => "suggest",
            Command::CancelSuggest => "cancel_suggest",
            Command::ListCollections => "list_collections",
            Command::CreateCollection(_) => "create_collection",
            Command::AddItems { .. } => "add_items",
            Command::SaveSearch(_) => "save_search",
            Command::LoadSavedSearches => "load_saved_searches",
            Command::RunSavedSearch(_) => "run_saved_search",
            Command::DeleteSavedSearch(_) => "delete_saved_search",
            Command::LoadHistory => "load_history",
            Command::SaveHistoryEntry(_) => "save_history_entry",
        }
    }
}

/// Completion of a [`Command`].
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    SearchFinished(Result<SearchResponse, ApiError>),
    Suggestions {
        seq: u64,
        result: Result<Vec<Suggestion>, ApiError>,
    },
    CollectionsLoaded(Result<Vec<Collection>, ApiError>),
    CollectionCreated(Result<Collection, ApiError>),
    ItemsAdded {
        collection_id: i64,
        result: Result<(), ApiError>,
    },
    SearchSaved(Result<Ack, ApiError>),
    SavedSearchesLoaded(Result<Vec<SavedSearch>, ApiError>),
    SavedSearchExecuted(Result<ExecutedSearch, ApiError>),
    SavedSearchDeleted {
        id: i64,
        result: Result<Ack, ApiError>,
    },
    HistoryLoaded(Result<Vec<HistoryEntry>, ApiError>),
    HistoryEntrySaved {
        id: i64,
        result: Result<Ack, ApiError>,
    },
}

/// All page state for one search screen.
#[derive(Debug, Default)]
pub struct SearchSession {
    query: QueryState,
    input: String,
    loading: bool,
    results: ResultsPane,
    selection: SelectionSet,
    suggestions: Vec<Suggestion>,
    suggest: SuggestTracker,
    collections: CollectionsPanel,
    saved_searches: Option<Vec<SavedSearch>>,
    history: Option<Vec<HistoryEntry>>,
    notice: Option<Notice>,
    redirect: Option<String>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already populated query, e.g. one built from CLI flags.
    pub fn from_query(query: QueryState) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    /// Raw text in the query input.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn results(&self) -> &ResultsPane {
        &self.results
    }

    pub fn response(&self) -> Option<&SearchResponse> {
        match &self.results {
            ResultsPane::Loaded(resp) => Some(resp),
            _ => None,
        }
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// The actions affordance is shown iff something is checked.
    pub fn actions_visible(&self) -> bool {
        !self.selection.is_empty()
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn collections(&self) -> &CollectionsPanel {
        &self.collections
    }

    pub fn saved_searches(&self) -> Option<&[SavedSearch]> {
        self.saved_searches.as_deref()
    }

    pub fn history(&self) -> Option<&[HistoryEntry]> {
        self.history.as_deref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn notify(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    /// Drop the notice once it has expired; returns whether one was removed.
    pub fn expire_notice(&mut self, now: Instant) -> bool {
        if self.notice.as_ref().is_some_and(|n| n.is_expired(now)) {
            self.notice = None;
            return true;
        }
        false
    }

    /// Pending login redirect, if an operation hit an auth failure.
    pub fn redirect(&self) -> Option<&str> {
        self.redirect.as_deref()
    }

    pub fn take_redirect(&mut self) -> Option<String> {
        self.redirect.take()
    }

    /// Route a backend completion to its handler.
    pub fn apply(&mut self, event: Event) -> Option<Command> {
        match event {
            Event::SearchFinished(result) => {
                self.finish_search(result);
                None
            }
            Event::Suggestions { seq, result } => {
                self.receive_suggestions(seq, result);
                None
            }
            Event::CollectionsLoaded(result) => {
                self.collections_loaded(result);
                None
            }
            Event::CollectionCreated(result) => self.collection_created(result),
            Event::ItemsAdded {
                collection_id,
                result,
            } => {
                self.items_added(collection_id, result);
                None
            }
            Event::SearchSaved(result) => {
                self.search_saved(result);
                None
            }
            Event::SavedSearchesLoaded(result) => {
                self.saved_searches_loaded(result);
                None
            }
            Event::SavedSearchExecuted(result) => self.saved_search_executed(result),
            Event::SavedSearchDeleted { id, result } => self.saved_search_deleted(id, result),
            Event::HistoryLoaded(result) => {
                self.history_loaded(result);
                None
            }
            Event::HistoryEntrySaved { id, result } => self.history_entry_saved(id, result),
        }
    }

    /// Record a login redirect for an auth failure. Returns false (and does
    /// nothing) for any other error.
    fn redirect_on_auth(&mut self, err: &ApiError, next: &str) -> bool {
        if !err.requires_login() {
            return false;
        }
        let target = crate::credentials::login_redirect(next);
        tracing::info!(%target, reason = %err, "redirecting to login");
        self.redirect = Some(target);
        true
    }
}
