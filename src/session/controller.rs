//! Query, paging, suggestion and selection transitions.

use tracing::{debug, warn};

use super::{Command, Notice, ResultsPane, SearchSession};
use crate::api::ApiError;
use crate::credentials::SEARCH_PAGE_PATH;
use crate::error::ValidationError;
use crate::model::types::{SearchResponse, Suggestion};
use crate::search::query::{Category, FilterField, PageInfo, SearchRequest};
use crate::search::suggest::wants_suggestions;

impl SearchSession {
    /// Add a term and search. Rejections leave the state untouched and raise
    /// an error notice.
    pub fn add_term(&mut self, term: &str) -> Result<Option<Command>, ValidationError> {
        if let Err(err) = self.query.add_term(term) {
            return Err(self.reject(err));
        }
        debug!(term = term.trim(), "term_added");
        self.input.clear();
        self.hide_suggestions();
        Ok(self.begin_search().map(Command::Search))
    }

    /// Commit whatever is in the query input as a term.
    pub fn submit_input(&mut self) -> Result<Option<Command>, ValidationError> {
        let input = self.input.clone();
        self.add_term(&input)
    }

    /// Remove a term. With terms left this re-searches; removing the last
    /// one clears results, pagination and selection.
    pub fn remove_term(&mut self, term: &str) -> Option<Command> {
        if !self.query.remove_term(term) {
            return None;
        }
        if self.query.has_terms() {
            self.begin_search().map(Command::Search)
        } else {
            self.clear_search();
            None
        }
    }

    pub fn remove_last_term(&mut self) -> Option<Command> {
        let last = self.query.terms().last().cloned()?;
        self.remove_term(&last)
    }

    fn clear_search(&mut self) {
        self.query.clear_terms();
        self.results = ResultsPane::Cleared;
        self.selection.clear();
        self.input.clear();
        self.hide_suggestions();
    }

    pub fn set_category(&mut self, category: Category) -> Option<Command> {
        self.query.set_category(category);
        self.search_if_terms()
    }

    pub fn cycle_category(&mut self) -> Option<Command> {
        self.set_category(self.query.category().next())
    }

    /// Replace one filter value; an empty value clears it.
    pub fn set_filter(&mut self, field: FilterField, value: &str) -> Option<Command> {
        if !self.query.filters_mut().set(field, value) {
            return None;
        }
        self.search_if_terms()
    }

    pub fn reset_filters(&mut self) -> Option<Command> {
        self.query.filters_mut().clear();
        self.search_if_terms()
    }

    fn search_if_terms(&mut self) -> Option<Command> {
        if self.query.has_terms() {
            self.begin_search().map(Command::Search)
        } else {
            None
        }
    }

    /// Jump to `page`, keeping terms and filters. Page 0 is ignored.
    pub fn go_to_page(&mut self, page: u32) -> Option<Command> {
        if !self.query.set_page(page) {
            return None;
        }
        self.begin_search().map(Command::Search)
    }

    pub fn prev_page(&mut self) -> Option<Command> {
        let page = self.query.page().checked_sub(1)?;
        self.go_to_page(page)
    }

    /// Next page; a no-op on the last known page.
    pub fn next_page(&mut self) -> Option<Command> {
        let page = self.query.page();
        if let Some(info) = self.page_info()
            && page >= info.total_pages()
        {
            return None;
        }
        self.go_to_page(page + 1)
    }

    /// Paging metadata for the loaded response.
    pub fn page_info(&self) -> Option<PageInfo> {
        self.response()
            .and_then(|r| r.total)
            .map(PageInfo::new)
    }

    /// Snapshot the query for sending, unless there is nothing to search for
    /// or a search is already outstanding. Overlapping requests are dropped.
    pub fn begin_search(&mut self) -> Option<SearchRequest> {
        if self.loading {
            debug!("search already in flight; dropping request");
            return None;
        }
        let request = SearchRequest::from_state(&self.query)?;
        self.loading = true;
        Some(request)
    }

    /// Render a search outcome. Always releases the in-flight flag.
    pub fn finish_search(&mut self, result: Result<SearchResponse, ApiError>) {
        self.loading = false;
        if !self.query.has_terms() {
            debug!("discarding search response; no terms remain");
            return;
        }
        match result {
            Ok(response) => {
                debug!(
                    results = response.results().len(),
                    total = ?response.total,
                    "search_complete"
                );
                self.selection.clear();
                self.results = ResultsPane::Loaded(response);
            }
            Err(err) => {
                if self.redirect_on_auth(&err, SEARCH_PAGE_PATH) {
                    return;
                }
                warn!(error = %err, "search failed");
                self.selection.clear();
                self.results = ResultsPane::Failed;
            }
        }
    }

    /// Keystroke in the query input. Returns the debouncer instruction: arm
    /// a new lookup, or cancel the pending one for short input.
    pub fn on_query_input(&mut self, text: &str) -> Command {
        self.input = text.to_string();
        if !wants_suggestions(text) {
            self.hide_suggestions();
            return Command::CancelSuggest;
        }
        Command::Suggest {
            seq: self.suggest.next_seq(),
            text: text.trim().to_string(),
        }
    }

    pub(super) fn receive_suggestions(
        &mut self,
        seq: u64,
        result: Result<Vec<Suggestion>, ApiError>,
    ) {
        if !self.suggest.is_latest(seq) {
            debug!(seq, latest = self.suggest.latest(), "discarding stale suggestions");
            return;
        }
        match result {
            Ok(list) => self.suggestions = list,
            Err(err) => {
                if self.redirect_on_auth(&err, SEARCH_PAGE_PATH) {
                    return;
                }
                warn!(error = %err, "suggestion lookup failed");
                self.suggestions.clear();
            }
        }
    }

    /// Copy a suggestion into the input, hide the list and search now.
    /// With no terms yet there is nothing to search, so point at Enter.
    pub fn select_suggestion(&mut self, index: usize) -> Option<Command> {
        let text = self.suggestions.get(index)?.text.clone();
        self.input = text;
        self.hide_suggestions();
        if !self.query.has_terms() {
            self.notify(Notice::info(format!(
                "Press Enter to add \"{}\" as a search term",
                self.input
            )));
            return None;
        }
        self.begin_search().map(Command::Search)
    }

    pub fn hide_suggestions(&mut self) {
        self.suggestions.clear();
        self.suggest.invalidate();
    }

    /// Flip a product checkbox in the rendered results; returns the new state.
    pub fn toggle_product(&mut self, id: i64) -> Result<bool, ValidationError> {
        let product = self
            .response()
            .and_then(|r| r.find_product(id))
            .cloned()
            .ok_or(ValidationError::UnknownProduct(id))?;
        Ok(self.selection.toggle(&product))
    }

    pub(super) fn reject(&mut self, err: ValidationError) -> ValidationError {
        self.notify(Notice::error(err.to_string()));
        err
    }
}
