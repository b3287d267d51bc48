//! Collection workflow plus saved searches and history.
//!
//! Every operation here needs the bearer credential. Auth failures never
//! surface inline; they leave a login redirect on the session instead.

use serde_json::Value;
use tracing::{info, warn};

use super::{Command, CollectionsView, Notice, SearchSession};
use crate::api::ApiError;
use crate::credentials::{
    COLLECTIONS_PATH, SAVED_SEARCHES_PATH, SEARCH_HISTORY_PATH, SEARCH_PAGE_PATH,
};
use crate::error::ValidationError;
use crate::model::types::{
    Ack, Collection, CollectionItems, ExecutedSearch, HistoryEntry, NewCollection,
    SaveSearchRecord, SavedSearch,
};
use crate::search::query::{Category, FilterField};

pub const COLLECTION_CREATED: &str = "Collection created successfully";
pub const ITEMS_ADDED: &str = "Items added to collection successfully";
pub const SEARCH_SAVED: &str = "Search saved successfully!";
pub const NO_COLLECTIONS: &str = "No collections yet. Create your first collection.";

const CREATE_FAILED: &str = "Failed to create collection";
const ADD_FAILED: &str = "Failed to add items to collection";
const LOAD_FAILED: &str = "Failed to load collections";
const SAVE_FAILED: &str = "Failed to save search. Please try again.";

impl SearchSession {
    /// Open the collection dialog on its list view and fetch the listing.
    pub fn open_collections(&mut self) -> Command {
        self.collections.open = true;
        self.collections.view = CollectionsView::List;
        Command::ListCollections
    }

    pub fn close_collections(&mut self) {
        self.collections.open = false;
        self.collections.view = CollectionsView::List;
    }

    pub fn list_collections(&mut self) -> Command {
        Command::ListCollections
    }

    pub fn show_create_form(&mut self) {
        self.collections.view = CollectionsView::CreateForm;
    }

    pub fn show_collections_list(&mut self) {
        self.collections.view = CollectionsView::List;
    }

    pub fn form_title_mut(&mut self) -> &mut String {
        &mut self.collections.form_title
    }

    pub fn form_description_mut(&mut self) -> &mut String {
        &mut self.collections.form_description
    }

    /// Validate and build the create request. An empty title never reaches
    /// the network; an empty description is sent as `null`.
    pub fn create_collection(
        &mut self,
        title: &str,
        description: Option<&str>,
    ) -> Result<Command, ValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(self.reject(ValidationError::EmptyTitle));
        }
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        Ok(Command::CreateCollection(NewCollection {
            title: title.to_string(),
            description,
        }))
    }

    /// Submit the create form as currently typed.
    pub fn submit_collection_form(&mut self) -> Result<Command, ValidationError> {
        let title = self.collections.form_title.clone();
        let description = self.collections.form_description.clone();
        self.create_collection(&title, Some(&description))
    }

    /// Append every checked product to `collection_id`, in selection order.
    pub fn add_selected_to_collection(
        &mut self,
        collection_id: i64,
    ) -> Result<Command, ValidationError> {
        if self.selection.is_empty() {
            return Err(self.reject(ValidationError::EmptySelection));
        }
        Ok(Command::AddItems {
            collection_id,
            body: CollectionItems {
                data_product_ids: self.selection.ids(),
            },
        })
    }

    /// Record the current search. The query is the trimmed raw input, or the
    /// joined terms when the input is empty.
    pub fn save_current_search(&mut self) -> Command {
        let raw = self.input.trim();
        let query = if raw.is_empty() {
            self.query.joined_terms()
        } else {
            raw.to_string()
        };
        Command::SaveSearch(SaveSearchRecord {
            query,
            category: self.query.category().as_str().to_string(),
            results_count: self.response().map_or(0, |r| r.results().len()),
            is_saved: true,
        })
    }

    pub fn load_saved_searches(&mut self) -> Command {
        Command::LoadSavedSearches
    }

    pub fn run_saved_search(&mut self, id: i64) -> Command {
        Command::RunSavedSearch(id)
    }

    pub fn delete_saved_search(&mut self, id: i64) -> Command {
        Command::DeleteSavedSearch(id)
    }

    pub fn load_history(&mut self) -> Command {
        Command::LoadHistory
    }

    pub fn save_history_entry(&mut self, id: i64) -> Command {
        Command::SaveHistoryEntry(id)
    }

    pub(super) fn collections_loaded(&mut self, result: Result<Vec<Collection>, ApiError>) {
        match result {
            Ok(items) => {
                self.collections.load_failed = false;
                self.collections.items = Some(items);
            }
            Err(err) => {
                if self.redirect_on_auth(&err, COLLECTIONS_PATH) {
                    return;
                }
                warn!(error = %err, "loading collections failed");
                self.collections.load_failed = true;
                self.notify(Notice::error(LOAD_FAILED));
            }
        }
    }

    pub(super) fn collection_created(
        &mut self,
        result: Result<Collection, ApiError>,
    ) -> Option<Command> {
        match result {
            Ok(created) => {
                info!(id = created.id, title = %created.title, "collection_created");
                self.collections.form_title.clear();
                self.collections.form_description.clear();
                self.collections.view = CollectionsView::List;
                self.notify(Notice::success(COLLECTION_CREATED));
                Some(Command::ListCollections)
            }
            Err(err) => {
                if !self.redirect_on_auth(&err, COLLECTIONS_PATH) {
                    warn!(error = %err, "creating collection failed");
                    self.notify(Notice::error(err.user_message(CREATE_FAILED)));
                }
                None
            }
        }
    }

    pub(super) fn items_added(&mut self, collection_id: i64, result: Result<(), ApiError>) {
        match result {
            Ok(()) => {
                info!(
                    collection_id,
                    items = self.selection.len(),
                    "collection_items_added"
                );
                self.selection.clear();
                self.close_collections();
                self.notify(Notice::success(ITEMS_ADDED));
            }
            Err(err) => {
                if !self.redirect_on_auth(&err, COLLECTIONS_PATH) {
                    warn!(collection_id, error = %err, "adding items failed");
                    self.notify(Notice::error(err.user_message(ADD_FAILED)));
                }
            }
        }
    }

    pub(super) fn search_saved(&mut self, result: Result<Ack, ApiError>) {
        match result {
            Ok(ack) if ack.success => {
                self.notify(Notice::success(SEARCH_SAVED).with_link(SAVED_SEARCHES_PATH));
            }
            Ok(ack) => {
                warn!(message = ?ack.message, "backend declined to save search");
                self.notify(Notice::error(SAVE_FAILED));
            }
            Err(err) => {
                if !self.redirect_on_auth(&err, SEARCH_PAGE_PATH) {
                    warn!(error = %err, "saving search failed");
                    self.notify(Notice::error(SAVE_FAILED));
                }
            }
        }
    }

    pub(super) fn saved_searches_loaded(&mut self, result: Result<Vec<SavedSearch>, ApiError>) {
        match result {
            Ok(list) => self.saved_searches = Some(list),
            Err(err) => {
                if !self.redirect_on_auth(&err, SAVED_SEARCHES_PATH) {
                    warn!(error = %err, "loading saved searches failed");
                    self.notify(Notice::error(
                        err.user_message("Failed to load saved searches"),
                    ));
                }
            }
        }
    }

    /// Load the returned parameters into the query and search.
    pub(super) fn saved_search_executed(
        &mut self,
        result: Result<ExecutedSearch, ApiError>,
    ) -> Option<Command> {
        let executed = match result {
            Ok(executed) => executed,
            Err(err) => {
                if !self.redirect_on_auth(&err, SAVED_SEARCHES_PATH) {
                    warn!(error = %err, "running saved search failed");
                    self.notify(Notice::error(err.user_message("Failed to run saved search")));
                }
                return None;
            }
        };

        self.query.load_joined(&executed.query);
        let category = executed
            .category
            .as_deref()
            .map(|c| {
                c.parse().unwrap_or_else(|_| {
                    warn!(category = c, "unknown saved category; using all");
                    Category::All
                })
            })
            .unwrap_or_default();
        self.query.set_category(category);

        self.query.filters_mut().clear();
        for (name, value) in executed.filters.iter().flatten() {
            let Ok(field) = name.parse::<FilterField>() else {
                warn!(filter = %name, "ignoring unknown saved filter");
                continue;
            };
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Null => continue,
                other => other.to_string(),
            };
            self.query.filters_mut().set(field, &value);
        }

        self.input.clear();
        self.hide_suggestions();
        self.begin_search().map(Command::Search)
    }

    pub(super) fn saved_search_deleted(
        &mut self,
        id: i64,
        result: Result<Ack, ApiError>,
    ) -> Option<Command> {
        match result {
            Ok(ack) => {
                info!(id, "saved_search_deleted");
                let text = ack
                    .message
                    .unwrap_or_else(|| "Saved search deleted successfully".to_string());
                self.notify(Notice::success(text));
                Some(Command::LoadSavedSearches)
            }
            Err(err) => {
                if !self.redirect_on_auth(&err, SAVED_SEARCHES_PATH) {
                    warn!(id, error = %err, "deleting saved search failed");
                    self.notify(Notice::error(
                        err.user_message("Failed to delete saved search"),
                    ));
                }
                None
            }
        }
    }

    pub(super) fn history_loaded(&mut self, result: Result<Vec<HistoryEntry>, ApiError>) {
        match result {
            Ok(list) => self.history = Some(list),
            Err(err) => {
                if !self.redirect_on_auth(&err, SEARCH_HISTORY_PATH) {
                    warn!(error = %err, "loading search history failed");
                    self.notify(Notice::error(
                        err.user_message("Failed to load search history"),
                    ));
                }
            }
        }
    }

    pub(super) fn history_entry_saved(
        &mut self,
        id: i64,
        result: Result<Ack, ApiError>,
    ) -> Option<Command> {
        match result {
            Ok(_) => {
                info!(id, "history_entry_saved");
                self.notify(Notice::success(SEARCH_SAVED).with_link(SAVED_SEARCHES_PATH));
                None
            }
            Err(err) => {
                if !self.redirect_on_auth(&err, SEARCH_HISTORY_PATH) {
                    warn!(id, error = %err, "saving history entry failed");
                    self.notify(Notice::error(err.user_message(SAVE_FAILED)));
                }
                None
            }
        }
    }
}
