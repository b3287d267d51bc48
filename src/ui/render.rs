//! View models for the search page and their plain-text rendering.
//!
//! Every frontend (text, `--json`, the TUI) draws from the same
//! [`PageView`], so empty states, badges and pagination rules live here once.

use colored::Colorize;
use serde::Serialize;

use crate::model::types::{Collection, HistoryEntry, SavedSearch, SearchResult, display_timestamp};
use crate::search::query::{Category, FilterField, PageInfo};
use crate::session::collections::NO_COLLECTIONS;
use crate::session::{CollectionsView, NoticeLevel, ResultsPane, SearchSession};

pub const NO_RESULTS: &str = "No results found";
pub const SEARCH_FAILED: &str = "Search failed. Please try again.";
pub const NO_SELECTION: &str = "No items selected";
pub const LOADING: &str = "Searching...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductItem {
    pub id: i64,
    pub label: String,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultBlock {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// `Phase: …` / `Status: …`, only for values the result carries.
    pub badges: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub products: Vec<ProductItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ResultsView {
    Idle,
    Loading,
    Empty { message: &'static str },
    Failed { message: &'static str },
    Results { items: Vec<ResultBlock> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub number: u32,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationView {
    pub current: u32,
    pub total_pages: u32,
    pub prev_disabled: bool,
    pub next_disabled: bool,
    pub pages: Vec<PageLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionView {
    pub actions_visible: bool,
    pub items: Vec<String>,
}

impl SelectionView {
    pub fn summary(&self) -> String {
        if self.items.is_empty() {
            NO_SELECTION.to_string()
        } else {
            self.items.join(", ")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterChip {
    pub name: &'static str,
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestionItem {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoticeView {
    pub level: NoticeLevel,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionOption {
    pub id: i64,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionsDialog {
    pub view: CollectionsView,
    pub loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub options: Vec<CollectionOption>,
    pub selected: SelectionView,
}

/// Everything a frontend needs to draw the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageView {
    pub terms: Vec<String>,
    pub input: String,
    pub category: Category,
    pub filters: Vec<FilterChip>,
    pub results: ResultsView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationView>,
    pub selection: SelectionView,
    pub suggestions: Vec<SuggestionItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collections: Option<CollectionsDialog>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<NoticeView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

fn result_block(result: &SearchResult, session: &SearchSession) -> ResultBlock {
    let mut badges = Vec::new();
    if let Some(phase) = result.phase.as_deref().filter(|p| !p.is_empty()) {
        badges.push(format!("Phase: {phase}"));
    }
    if let Some(status) = result.status.as_deref().filter(|s| !s.is_empty()) {
        badges.push(format!("Status: {status}"));
    }
    ResultBlock {
        title: result.title.clone(),
        kind: result.kind.clone(),
        badges,
        description: result.description.clone().filter(|d| !d.is_empty()),
        products: result
            .products()
            .iter()
            .map(|p| ProductItem {
                id: p.id,
                label: p.label(),
                checked: session.selection().contains(p.id),
            })
            .collect(),
    }
}

pub fn results_view(session: &SearchSession) -> ResultsView {
    if session.is_loading() {
        return ResultsView::Loading;
    }
    match session.results() {
        ResultsPane::Cleared => ResultsView::Idle,
        ResultsPane::Failed => ResultsView::Failed {
            message: SEARCH_FAILED,
        },
        ResultsPane::Loaded(response) if response.results().is_empty() => ResultsView::Empty {
            message: NO_RESULTS,
        },
        ResultsPane::Loaded(response) => ResultsView::Results {
            items: response
                .results()
                .iter()
                .map(|r| result_block(r, session))
                .collect(),
        },
    }
}

/// Navigation for `total` results with `current` selected. `None` when
/// everything fits on one page.
pub fn pagination(total: Option<u64>, current: u32) -> Option<PaginationView> {
    let total = total.filter(|t| *t > 0)?;
    let total_pages = PageInfo::new(total).total_pages();
    if total_pages <= 1 {
        return None;
    }
    Some(PaginationView {
        current,
        total_pages,
        prev_disabled: current == 1,
        next_disabled: current == total_pages,
        pages: (1..=total_pages)
            .map(|number| PageLink {
                number,
                active: number == current,
            })
            .collect(),
    })
}

pub fn selection_view(session: &SearchSession) -> SelectionView {
    SelectionView {
        actions_visible: session.actions_visible(),
        items: session.selection().labels().map(str::to_string).collect(),
    }
}

fn collections_dialog(session: &SearchSession) -> Option<CollectionsDialog> {
    let panel = session.collections();
    if !panel.open {
        return None;
    }
    let options: Vec<CollectionOption> = panel
        .items
        .iter()
        .flatten()
        .map(|c| CollectionOption {
            id: c.id,
            title: c.title.clone(),
            description: c.description.clone().unwrap_or_default(),
        })
        .collect();
    let message = match &panel.items {
        Some(items) if items.is_empty() => Some(NO_COLLECTIONS),
        _ => None,
    };
    Some(CollectionsDialog {
        view: panel.view,
        loading: panel.items.is_none() && !panel.load_failed,
        message,
        options,
        selected: selection_view(session),
    })
}

pub fn page_view(session: &SearchSession) -> PageView {
    let query = session.query();
    let response = session.response();
    PageView {
        terms: query.terms().to_vec(),
        input: session.input().to_string(),
        category: query.category(),
        filters: query
            .filters()
            .active()
            .map(|(field, value)| FilterChip {
                name: field.param(),
                label: field.label(),
                value: value.to_string(),
            })
            .collect(),
        results: results_view(session),
        pagination: response.and_then(|r| pagination(r.total, query.page())),
        selection: selection_view(session),
        suggestions: session
            .suggestions()
            .iter()
            .map(|s| SuggestionItem {
                text: s.text.clone(),
                kind: s.kind.clone(),
            })
            .collect(),
        collections: collections_dialog(session),
        notice: session.notice().map(|n| NoticeView {
            level: n.level,
            text: n.text.clone(),
            link: n.link.clone(),
        }),
        redirect: session.redirect().map(str::to_string),
    }
}

/// Filters offered for the active category, with their current values.
pub fn filter_panel(session: &SearchSession) -> Vec<(FilterField, Option<String>)> {
    let filters = session.query().filters();
    FilterField::visible_for(session.query().category())
        .into_iter()
        .map(|f| (f, filters.get(f).map(str::to_string)))
        .collect()
}

fn render_pagination(p: &PaginationView) -> String {
    let prev = if p.prev_disabled {
        "‹ Previous".dimmed().to_string()
    } else {
        "‹ Previous".to_string()
    };
    let next = if p.next_disabled {
        "Next ›".dimmed().to_string()
    } else {
        "Next ›".to_string()
    };
    let pages: Vec<String> = p
        .pages
        .iter()
        .map(|l| {
            if l.active {
                format!("[{}]", l.number).bold().to_string()
            } else {
                l.number.to_string()
            }
        })
        .collect();
    format!("{prev}  {}  {next}", pages.join(" "))
}

/// Human-readable rendering of the page.
pub fn render_text(view: &PageView) -> String {
    let mut out = Vec::new();

    if let Some(notice) = &view.notice {
        let text = match notice.level {
            NoticeLevel::Success => notice.text.green(),
            NoticeLevel::Info => notice.text.cyan(),
            NoticeLevel::Error => notice.text.red(),
        };
        match &notice.link {
            Some(link) => out.push(format!("{text} ({link})")),
            None => out.push(text.to_string()),
        }
    }

    if !view.terms.is_empty() {
        let pills: Vec<String> = view.terms.iter().map(|t| format!("[{t}]")).collect();
        out.push(format!(
            "{} {}  {} {}",
            "Terms:".bold(),
            pills.join(" OR "),
            "Category:".bold(),
            view.category.label()
        ));
    }
    if !view.filters.is_empty() {
        let chips: Vec<String> = view
            .filters
            .iter()
            .map(|f| format!("{}={}", f.label, f.value))
            .collect();
        out.push(format!("{} {}", "Filters:".bold(), chips.join(", ")));
    }

    match &view.results {
        ResultsView::Idle => {}
        ResultsView::Loading => out.push(LOADING.dimmed().to_string()),
        ResultsView::Empty { message } => out.push((*message).to_string()),
        ResultsView::Failed { message } => out.push(message.red().to_string()),
        ResultsView::Results { items } => {
            for block in items {
                out.push(String::new());
                out.push(block.title.bold().to_string());
                let mut meta = vec![block.kind.blue().to_string()];
                meta.extend(block.badges.iter().map(|b| b.cyan().to_string()));
                out.push(format!("  {}", meta.join("  ")));
                if let Some(desc) = &block.description {
                    out.push(format!("  {desc}"));
                }
                if !block.products.is_empty() {
                    out.push(format!("  {}", "Available Data Products:".dimmed()));
                    for p in &block.products {
                        let mark = if p.checked { "[x]" } else { "[ ]" };
                        out.push(format!("    {mark} #{} {}", p.id, p.label));
                    }
                }
            }
        }
    }

    if let Some(p) = &view.pagination {
        out.push(String::new());
        out.push(render_pagination(p));
    }

    if view.selection.actions_visible {
        out.push(format!("{} {}", "Selected:".bold(), view.selection.summary()));
    }

    out.join("\n")
}

pub fn render_collections_text(collections: &[Collection]) -> String {
    if collections.is_empty() {
        return NO_COLLECTIONS.to_string();
    }
    collections
        .iter()
        .map(|c| match c.description.as_deref().filter(|d| !d.is_empty()) {
            Some(desc) => format!("{:>5}  {}\n       {}", c.id, c.title.bold(), desc.dimmed()),
            None => format!("{:>5}  {}", c.id, c.title.bold()),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_saved_text(saved: &[SavedSearch]) -> String {
    if saved.is_empty() {
        return "No saved searches yet.".to_string();
    }
    saved
        .iter()
        .map(|s| {
            let category = s.category.as_deref().unwrap_or("all");
            let last_used = s
                .last_used
                .as_deref()
                .map(display_timestamp)
                .unwrap_or_else(|| "never".to_string());
            format!(
                "{:>5}  {}  {}  {} results, used {}x, last {}",
                s.id,
                s.query.as_deref().unwrap_or_default().bold(),
                category.cyan(),
                s.results_count.unwrap_or(0),
                s.use_count.unwrap_or(0),
                last_used.dimmed()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_history_text(history: &[HistoryEntry]) -> String {
    if history.is_empty() {
        return "No searches recorded yet.".to_string();
    }
    history
        .iter()
        .map(|h| {
            let when = h
                .created_at
                .as_deref()
                .map(display_timestamp)
                .unwrap_or_default();
            format!(
                "{:>5}  {}  {}  {} results  {}",
                h.id,
                h.query.as_deref().unwrap_or_default().bold(),
                h.category.as_deref().unwrap_or("all").cyan(),
                h.results_count.unwrap_or(0),
                when.dimmed()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::{DataProductRef, SearchResponse};
    use crate::session::Event;

    fn loaded(results: Vec<SearchResult>, total: Option<u64>) -> SearchSession {
        let mut s = SearchSession::new();
        s.add_term("aspirin").unwrap();
        s.apply(Event::SearchFinished(Ok(SearchResponse {
            results: Some(results),
            total,
        })));
        s
    }

    fn study(products: Vec<DataProductRef>) -> SearchResult {
        SearchResult {
            title: "Statin outcomes".into(),
            kind: "study".into(),
            phase: Some("III".into()),
            status: None,
            description: Some("Long-term follow-up".into()),
            data_products: if products.is_empty() {
                None
            } else {
                Some(products)
            },
        }
    }

    #[test]
    fn twenty_five_results_make_three_pages() {
        let first = pagination(Some(25), 1).unwrap();
        assert_eq!(first.total_pages, 3);
        assert!(first.prev_disabled);
        assert!(!first.next_disabled);
        assert_eq!(first.pages.iter().filter(|p| p.active).count(), 1);

        let middle = pagination(Some(25), 2).unwrap();
        assert!(!middle.prev_disabled);
        assert!(!middle.next_disabled);
        assert!(middle.pages[1].active);

        let last = pagination(Some(25), 3).unwrap();
        assert!(!last.prev_disabled);
        assert!(last.next_disabled);
    }

    #[test]
    fn single_page_or_missing_total_has_no_pagination() {
        assert!(pagination(None, 1).is_none());
        assert!(pagination(Some(0), 1).is_none());
        assert!(pagination(Some(10), 1).is_none());
        assert!(pagination(Some(11), 1).is_some());
    }

    #[test]
    fn empty_and_failed_states() {
        let s = loaded(vec![], Some(0));
        assert_eq!(
            results_view(&s),
            ResultsView::Empty {
                message: "No results found"
            }
        );

        let mut s = SearchSession::new();
        s.add_term("aspirin").unwrap();
        assert_eq!(results_view(&s), ResultsView::Loading);
        s.apply(Event::SearchFinished(Err(crate::api::ApiError::Decode(
            "expected value".into(),
        ))));
        assert_eq!(
            results_view(&s),
            ResultsView::Failed {
                message: "Search failed. Please try again."
            }
        );
    }

    #[test]
    fn blocks_carry_badges_and_checklist() {
        let mut s = loaded(
            vec![study(vec![DataProductRef {
                id: 3,
                title: "Lipid panel".into(),
                kind: "dataset".into(),
            }])],
            Some(1),
        );
        s.toggle_product(3).unwrap();
        let view = page_view(&s);
        let ResultsView::Results { items } = &view.results else {
            panic!("expected results");
        };
        assert_eq!(items[0].badges, vec!["Phase: III"]);
        assert_eq!(
            items[0].products,
            vec![ProductItem {
                id: 3,
                label: "Lipid panel (dataset)".into(),
                checked: true
            }]
        );
        assert!(view.selection.actions_visible);
        assert_eq!(view.selection.summary(), "Lipid panel (dataset)");
        assert!(view.pagination.is_none());
    }

    #[test]
    fn selection_summary_when_empty() {
        let s = loaded(vec![study(vec![])], Some(1));
        let view = selection_view(&s);
        assert!(!view.actions_visible);
        assert_eq!(view.summary(), "No items selected");
    }

    #[test]
    fn json_view_uses_wire_names() {
        let s = loaded(vec![study(vec![])], Some(25));
        let json = serde_json::to_value(page_view(&s)).unwrap();
        assert_eq!(json["results"]["state"], "results");
        assert_eq!(json["results"]["items"][0]["type"], "study");
        assert_eq!(json["pagination"]["total_pages"], 3);
        assert_eq!(json["category"], "all");
    }

    #[test]
    fn text_rendering_mentions_empty_collections() {
        colored::control::set_override(false);
        assert_eq!(render_collections_text(&[]), NO_COLLECTIONS);
        let text = render_collections_text(&[Collection {
            id: 2,
            title: "Trial Batch A".into(),
            description: None,
        }]);
        assert!(text.contains("Trial Batch A"));
    }

    #[test]
    fn saved_and_history_rows_render_without_query() {
        colored::control::set_override(false);
        let saved = render_saved_text(&[SavedSearch {
            id: 2,
            query: None,
            category: None,
            filters: None,
            results_count: None,
            last_used: None,
            use_count: None,
        }]);
        assert!(saved.contains("0 results"), "{saved}");
        assert!(saved.contains("last never"), "{saved}");

        let history = render_history_text(&[HistoryEntry {
            id: 5,
            query: Some("heparin".into()),
            category: Some("drugs".into()),
            filters: None,
            results_count: None,
            created_at: None,
        }]);
        assert!(history.contains("heparin"));
        assert!(history.contains("0 results"));
    }
}
