//! Ratatui search page driven by a [`SearchSession`].
//!
//! Key handling only mutates the session and collects [`Command`]s; the loop
//! hands those to the [`Dispatcher`] and applies completions between polls.

use anyhow::{Result, bail};
use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use crossterm::{ExecutableCommand, execute};
use ratatui::backend::TestBackend;
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::api::HttpBackend;
use crate::config::ClientConfig;
use crate::credentials::CredentialStore;
use crate::search::query::FilterField;
use crate::session::{Command, CollectionsView, Dispatcher, Notice, SearchSession};
use crate::ui::components::theme::ThemePalette;
use crate::ui::components::widgets::{
    category_tabs, collections_dialog, filter_chips, notice_line, pagination_line, result_lines,
    search_bar, selection_panel, suggestions_list,
};
use crate::ui::render::{PageView, page_view};
use crate::ui::shortcuts;

/// Where typed characters go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    Query,
    /// Editing the value of the `index`-th filter offered for the category.
    Filter { index: usize },
    CollectionTitle,
    CollectionDescription,
}

#[derive(Serialize, Deserialize, Default)]
struct TuiStatePersisted {
    theme: Option<String>,
    has_seen_help: Option<bool>,
}

fn help_lines(palette: ThemePalette) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    let add_section = |title: &str, items: &[String]| -> Vec<Line<'static>> {
        let mut v = Vec::new();
        v.push(Line::from(Span::styled(title.to_string(), palette.title())));
        for item in items {
            v.push(Line::from(format!("  {item}")));
        }
        v.push(Line::from(""));
        v
    };

    lines.extend(add_section(
        "Search",
        &[
            format!(
                "type a term, {} adds it (up to three, OR-joined)",
                shortcuts::ADD_TERM
            ),
            format!(
                "Backspace on empty input or {} removes the last term",
                shortcuts::REMOVE_LAST_TERM
            ),
            format!(
                "suggestions appear after two characters; Up/Down choose, {} accepts",
                shortcuts::ACCEPT_SUGGESTION
            ),
        ],
    ));
    lines.extend(add_section(
        "Category & Filters",
        &[
            format!("{} cycles All → Studies → Indications → Procedures", shortcuts::CATEGORY),
            format!(
                "{} edits filters: Tab/Up/Down switch field, Enter apply, empty value clears",
                shortcuts::FILTER_EDIT
            ),
            format!("{} resets every filter", shortcuts::CLEAR_FILTERS),
        ],
    ));
    lines.extend(add_section(
        "Results",
        &[
            format!(
                "Up/Down move between data products, {} checks one",
                shortcuts::TOGGLE_SELECT
            ),
            format!(
                "{} / {} change page, {} jumps to a page",
                shortcuts::PREV_PAGE,
                shortcuts::NEXT_PAGE,
                shortcuts::JUMP_PAGE
            ),
        ],
    ));
    lines.extend(add_section(
        "Collections",
        &[
            format!(
                "{} opens the collection picker for the checked products",
                shortcuts::ADD_TO_COLLECTION
            ),
            format!(
                "in the picker: Enter adds, {} creates a collection, Esc closes",
                shortcuts::NEW_COLLECTION
            ),
            format!("{} saves the current search", shortcuts::SAVE_SEARCH),
        ],
    ));
    lines.extend(add_section(
        "General",
        &[
            format!("{} toggles this help", shortcuts::HELP),
            format!("{} switches dark/light theme", shortcuts::THEME),
            format!("{} quits, Ctrl+C always quits", shortcuts::QUIT),
            "401 from the backend means: run `studyscope login`, then retry".to_string(),
        ],
    ));
    lines
}

fn render_help_overlay(frame: &mut Frame, palette: ThemePalette, scroll: u16) {
    let area = frame.area();
    let popup_area = centered_rect(70, 70, area);
    let lines = help_lines(palette);
    let block = Block::default()
        .title(Span::styled("Help / Shortcuts", palette.title()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent));

    frame.render_widget(Clear, popup_area);
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: true })
            .scroll((scroll, 0)),
        popup_area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1]);

    horizontal[1]
}

fn state_path_for(data_dir: &Path) -> PathBuf {
    // Non-secret UI preferences only.
    data_dir.join("tui_state.json")
}

fn load_state(path: &Path) -> TuiStatePersisted {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

fn save_state(path: &Path, state: &TuiStatePersisted) {
    if let Ok(body) = serde_json::to_string_pretty(state) {
        let _ = std::fs::write(path, body);
    }
}

pub fn footer_legend(show_help: bool) -> &'static str {
    if show_help {
        "Esc/F1 close help • Up/Down scroll • Ctrl+C quit"
    } else {
        "F1 help | Enter add term | Ctrl+W drop term | F2 category | F3 filters | F4 reset | PgUp/PgDn page | Ctrl+X check | Ctrl+A collect | Ctrl+S save | Esc quit"
    }
}

/// Interactive state around the session: cursors, overlays and input mode.
pub struct App {
    pub session: SearchSession,
    pub mode: InputMode,
    pub filter_buffer: String,
    pub product_cursor: usize,
    pub suggestion_cursor: Option<usize>,
    pub collection_cursor: usize,
    pub show_help: bool,
    pub help_scroll: u16,
    pub theme_dark: bool,
    pub quit: bool,
}

impl App {
    pub fn new(session: SearchSession) -> Self {
        Self {
            session,
            mode: InputMode::Query,
            filter_buffer: String::new(),
            product_cursor: 0,
            suggestion_cursor: None,
            collection_cursor: 0,
            show_help: false,
            help_scroll: 0,
            theme_dark: true,
            quit: false,
        }
    }

    fn palette(&self) -> ThemePalette {
        if self.theme_dark {
            ThemePalette::dark()
        } else {
            ThemePalette::light()
        }
    }

    /// Product ids in display order.
    fn product_ids(&self) -> Vec<i64> {
        self.session
            .response()
            .map(|r| {
                r.results()
                    .iter()
                    .flat_map(|res| res.products().iter().map(|p| p.id))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn cursor_product(&self) -> Option<i64> {
        self.product_ids().get(self.product_cursor).copied()
    }

    fn filter_fields(&self) -> Vec<FilterField> {
        FilterField::visible_for(self.session.query().category())
    }

    /// Apply finished backend calls. Returns whether anything changed.
    pub fn pump(&mut self, dispatcher: &mut Dispatcher) -> bool {
        if !dispatcher.drain(&mut self.session) {
            return false;
        }
        self.after_events();
        true
    }

    fn after_events(&mut self) {
        let products = self.product_ids().len();
        if self.product_cursor >= products {
            self.product_cursor = products.saturating_sub(1);
        }
        let suggestions = self.session.suggestions().len();
        if self.suggestion_cursor.is_some_and(|c| c >= suggestions) {
            self.suggestion_cursor = None;
        }
        let collections = self
            .session
            .collections()
            .items
            .as_ref()
            .map_or(0, Vec::len);
        if self.collection_cursor >= collections {
            self.collection_cursor = collections.saturating_sub(1);
        }
        if let Some(location) = self.session.take_redirect() {
            info!(%location, "login required");
            self.session.notify(
                Notice::error("Sign in required. Run `studyscope login` and retry.")
                    .with_link(location),
            );
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<Command> {
        let mut out = Vec::new();
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit = true;
            return out;
        }
        if self.show_help {
            match key.code {
                KeyCode::Esc | KeyCode::F(1) => self.show_help = false,
                KeyCode::Up => self.help_scroll = self.help_scroll.saturating_sub(1),
                KeyCode::Down => self.help_scroll = self.help_scroll.saturating_add(1),
                _ => {}
            }
            return out;
        }
        if self.session.collections().open {
            self.handle_dialog_key(key, &mut out);
            return out;
        }
        if let InputMode::Filter { index } = self.mode {
            self.handle_filter_key(index, key, &mut out);
            return out;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        match key.code {
            KeyCode::Esc => {
                if self.session.suggestions().is_empty() {
                    self.quit = true;
                } else {
                    self.session.hide_suggestions();
                    self.suggestion_cursor = None;
                }
            }
            KeyCode::F(10) => self.quit = true,
            KeyCode::F(1) => {
                self.show_help = true;
                self.help_scroll = 0;
            }
            KeyCode::F(2) => out.extend(self.session.cycle_category()),
            KeyCode::F(3) => self.enter_filter_mode(0),
            KeyCode::F(4) => out.extend(self.session.reset_filters()),
            KeyCode::F(5) => self.theme_dark = !self.theme_dark,
            KeyCode::Char('w') if ctrl => out.extend(self.session.remove_last_term()),
            KeyCode::Char('a') if ctrl => {
                self.collection_cursor = 0;
                out.push(self.session.open_collections());
            }
            KeyCode::Char('s') if ctrl => out.push(self.session.save_current_search()),
            KeyCode::Char('x') if ctrl => {
                if let Some(id) = self.cursor_product() {
                    let _ = self.session.toggle_product(id);
                }
            }
            KeyCode::Char(d) if alt && d.is_ascii_digit() => {
                if let Some(page) = d.to_digit(10).filter(|p| *p > 0) {
                    out.extend(self.session.go_to_page(page));
                }
            }
            KeyCode::Char(c) if !ctrl && !alt => {
                let mut text = self.session.input().to_string();
                text.push(c);
                self.suggestion_cursor = None;
                out.push(self.session.on_query_input(&text));
            }
            KeyCode::Backspace => {
                if self.session.input().is_empty() {
                    out.extend(self.session.remove_last_term());
                } else {
                    let mut text = self.session.input().to_string();
                    text.pop();
                    self.suggestion_cursor = None;
                    out.push(self.session.on_query_input(&text));
                }
            }
            KeyCode::Enter => {
                if let Some(index) = self.suggestion_cursor.take() {
                    out.extend(self.session.select_suggestion(index));
                } else if !self.session.input().trim().is_empty() {
                    out.push(Command::CancelSuggest);
                    if let Ok(command) = self.session.submit_input() {
                        out.extend(command);
                    }
                }
            }
            KeyCode::Tab => {
                if !self.session.suggestions().is_empty() {
                    let index = self.suggestion_cursor.take().unwrap_or(0);
                    out.extend(self.session.select_suggestion(index));
                }
            }
            KeyCode::Up => {
                if self.session.suggestions().is_empty() {
                    self.product_cursor = self.product_cursor.saturating_sub(1);
                } else {
                    self.suggestion_cursor = match self.suggestion_cursor {
                        None | Some(0) => None,
                        Some(i) => Some(i - 1),
                    };
                }
            }
            KeyCode::Down => {
                let suggestions = self.session.suggestions().len();
                if suggestions == 0 {
                    let products = self.product_ids().len();
                    if self.product_cursor + 1 < products {
                        self.product_cursor += 1;
                    }
                } else {
                    self.suggestion_cursor = Some(match self.suggestion_cursor {
                        None => 0,
                        Some(i) => (i + 1).min(suggestions - 1),
                    });
                }
            }
            KeyCode::PageUp => out.extend(self.session.prev_page()),
            KeyCode::PageDown => out.extend(self.session.next_page()),
            _ => {}
        }
        out
    }

    fn enter_filter_mode(&mut self, index: usize) {
        let fields = self.filter_fields();
        if fields.is_empty() {
            return;
        }
        let index = index % fields.len();
        self.filter_buffer = self
            .session
            .query()
            .filters()
            .get(fields[index])
            .unwrap_or_default()
            .to_string();
        self.mode = InputMode::Filter { index };
    }

    fn handle_filter_key(&mut self, index: usize, key: KeyEvent, out: &mut Vec<Command>) {
        let fields = self.filter_fields();
        let Some(field) = fields.get(index).copied() else {
            self.mode = InputMode::Query;
            return;
        };
        match key.code {
            KeyCode::Esc => self.mode = InputMode::Query,
            KeyCode::Tab | KeyCode::Down => self.enter_filter_mode(index + 1),
            KeyCode::BackTab | KeyCode::Up => {
                self.enter_filter_mode(index + fields.len() - 1);
            }
            KeyCode::Enter => {
                let value = std::mem::take(&mut self.filter_buffer);
                out.extend(self.session.set_filter(field, &value));
                self.mode = InputMode::Query;
            }
            KeyCode::Backspace => {
                self.filter_buffer.pop();
            }
            KeyCode::Char(c) => self.filter_buffer.push(c),
            _ => {}
        }
    }

    fn handle_dialog_key(&mut self, key: KeyEvent, out: &mut Vec<Command>) {
        match self.session.collections().view {
            CollectionsView::List => match key.code {
                KeyCode::Esc => self.session.close_collections(),
                KeyCode::Up => self.collection_cursor = self.collection_cursor.saturating_sub(1),
                KeyCode::Down => {
                    let count = self
                        .session
                        .collections()
                        .items
                        .as_ref()
                        .map_or(0, Vec::len);
                    if self.collection_cursor + 1 < count {
                        self.collection_cursor += 1;
                    }
                }
                KeyCode::Enter => {
                    let target = self
                        .session
                        .collections()
                        .items
                        .as_ref()
                        .and_then(|items| items.get(self.collection_cursor))
                        .map(|c| c.id);
                    if let Some(id) = target
                        && let Ok(command) = self.session.add_selected_to_collection(id)
                    {
                        out.push(command);
                    }
                }
                KeyCode::Char('n') | KeyCode::Char('N') => {
                    self.session.show_create_form();
                    self.mode = InputMode::CollectionTitle;
                }
                KeyCode::Char('r') | KeyCode::Char('R') => {
                    out.push(self.session.list_collections());
                }
                _ => {}
            },
            CollectionsView::CreateForm => match key.code {
                KeyCode::Esc => {
                    self.session.show_collections_list();
                    self.mode = InputMode::Query;
                }
                KeyCode::Tab | KeyCode::BackTab => {
                    self.mode = if self.mode == InputMode::CollectionDescription {
                        InputMode::CollectionTitle
                    } else {
                        InputMode::CollectionDescription
                    };
                }
                KeyCode::Enter => {
                    if let Ok(command) = self.session.submit_collection_form() {
                        out.push(command);
                        self.mode = InputMode::Query;
                    }
                }
                KeyCode::Backspace => {
                    self.form_field().pop();
                }
                KeyCode::Char(c) => self.form_field().push(c),
                _ => {}
            },
        }
    }

    fn form_field(&mut self) -> &mut String {
        if self.mode == InputMode::CollectionDescription {
            self.session.form_description_mut()
        } else {
            self.session.form_title_mut()
        }
    }

    pub fn draw(&self, frame: &mut Frame) {
        let palette = self.palette();
        let view: PageView = page_view(&self.session);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(frame.area());

        frame.render_widget(
            search_bar(&view.terms, &view.input, palette, self.mode == InputMode::Query),
            chunks[0],
        );
        frame.render_widget(category_tabs(view.category, palette), chunks[1]);

        let filter_line = match self.mode {
            InputMode::Filter { index } => {
                let label = self
                    .filter_fields()
                    .get(index)
                    .map_or("", |f| f.label());
                Line::from(vec![
                    Span::styled(format!("{label}: "), palette.title()),
                    Span::raw(format!("{}_", self.filter_buffer)),
                    Span::styled(
                        "  (Tab next field, Enter apply, Esc cancel)",
                        palette.hint_style(),
                    ),
                ])
            }
            _ => filter_chips(&view.filters, palette),
        };
        frame.render_widget(Paragraph::new(filter_line), chunks[2]);
        frame.render_widget(
            Paragraph::new(notice_line(view.notice.as_ref(), palette)),
            chunks[3],
        );

        let body = if view.selection.actions_visible {
            let split = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
                .split(chunks[4]);
            frame.render_widget(selection_panel(&view.selection, palette), split[1]);
            split[0]
        } else {
            chunks[4]
        };

        let lines = result_lines(&view.results, self.cursor_product(), palette);
        let cursor_line = lines.iter().position(|l| {
            l.spans
                .iter()
                .any(|s| s.style.add_modifier.contains(Modifier::REVERSED))
        });
        let inner_height = body.height.saturating_sub(2);
        let scroll = cursor_line
            .map(|line| (line as u16).saturating_sub(inner_height / 2))
            .unwrap_or(0);
        frame.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .scroll((scroll, 0))
                .block(
                    Block::default()
                        .title(Span::styled("Results", palette.title()))
                        .borders(Borders::ALL)
                        .border_style(palette.border_style()),
                ),
            body,
        );

        if let Some(p) = &view.pagination {
            frame.render_widget(Paragraph::new(pagination_line(p, palette)), chunks[5]);
        }
        frame.render_widget(
            Paragraph::new(footer_legend(self.show_help)).style(palette.hint_style()),
            chunks[6],
        );

        if !view.suggestions.is_empty() {
            let bar = chunks[0];
            let height = (view.suggestions.len() as u16 + 2).min(8);
            let area = Rect {
                x: bar.x + 1,
                y: bar.y + bar.height,
                width: bar.width.saturating_sub(2).min(60),
                height: height.min(frame.area().height.saturating_sub(bar.y + bar.height)),
            };
            frame.render_widget(Clear, area);
            frame.render_widget(
                suggestions_list(&view.suggestions, self.suggestion_cursor, palette),
                area,
            );
        }

        if let Some(dialog) = &view.collections {
            let area = centered_rect(60, 60, frame.area());
            let panel = self.session.collections();
            frame.render_widget(Clear, area);
            frame.render_widget(
                collections_dialog(
                    dialog,
                    self.collection_cursor,
                    (&panel.form_title, &panel.form_description),
                    self.mode == InputMode::CollectionDescription,
                    palette,
                ),
                area,
            );
        }

        if self.show_help {
            render_help_overlay(frame, palette, self.help_scroll);
        }
    }
}

fn connect(config: &ClientConfig) -> Result<HttpBackend> {
    let credentials = CredentialStore::in_data_dir(&config.data_dir);
    Ok(HttpBackend::new(
        &config.base_url,
        credentials,
        config.request_timeout,
    )?)
}

pub async fn run_tui(config: &ClientConfig, once: bool, reset_state: bool) -> Result<()> {
    let state_path = state_path_for(&config.data_dir);
    if reset_state && state_path.exists() {
        std::fs::remove_file(&state_path)?;
        info!(path = %state_path.display(), "tui state reset");
    }

    if once
        && std::env::var("TUI_HEADLESS")
            .map(|v| v == "1")
            .unwrap_or(false)
    {
        return run_tui_headless(config).await;
    }

    let backend = Arc::new(connect(config)?);
    let mut dispatcher = Dispatcher::new(backend, config.suggest_delay);
    let persisted = load_state(&state_path);
    let mut app = App::new(SearchSession::new());
    app.theme_dark = persisted.theme.as_deref() != Some("light");
    // Onboarding overlay until dismissed once.
    app.show_help = !persisted.has_seen_help.unwrap_or(false);

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    info!(base_url = %config.base_url, "tui_start");

    let result = event_loop(&mut terminal, &mut app, &mut dispatcher, once);

    let persisted_out = TuiStatePersisted {
        theme: Some(if app.theme_dark { "dark" } else { "light" }.into()),
        has_seen_help: Some(persisted.has_seen_help.unwrap_or(false) || !app.show_help),
    };
    if config.data_dir.exists() {
        save_state(&state_path, &persisted_out);
    }

    teardown_terminal()?;
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    dispatcher: &mut Dispatcher,
    once: bool,
) -> Result<()> {
    let tick_rate = Duration::from_millis(30);
    let mut needs_draw = true;

    loop {
        if app.pump(dispatcher) {
            needs_draw = true;
        }
        if app.session.expire_notice(Instant::now()) {
            needs_draw = true;
        }
        if needs_draw {
            terminal.draw(|f| app.draw(f))?;
            needs_draw = false;
        }
        if once {
            break;
        }

        if tokio::task::block_in_place(|| event::poll(tick_rate))? {
            match event::read()? {
                TermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                    let commands = app.handle_key(key);
                    debug!(code = ?key.code, commands = commands.len(), "key");
                    dispatcher.submit_all(commands);
                    needs_draw = true;
                }
                TermEvent::Resize(..) => needs_draw = true,
                _ => {}
            }
        }
        if app.quit {
            break;
        }
    }
    Ok(())
}

/// Non-interactive smoke path: check the backend and render one frame
/// off-screen.
async fn run_tui_headless(config: &ClientConfig) -> Result<()> {
    let backend = connect(config)?;
    if !backend.health().await? {
        bail!("backend at {} is not reachable", config.base_url);
    }
    let app = App::new(SearchSession::new());
    let mut terminal = Terminal::new(TestBackend::new(100, 30))?;
    terminal.draw(|f| app.draw(f))?;
    info!(base_url = %config.base_url, "tui headless check passed");
    Ok(())
}

fn teardown_terminal() -> Result<()> {
    let mut stdout = io::stdout();
    disable_raw_mode()?;
    execute!(stdout, LeaveAlternateScreen)?;
    if let Err(e) = stdout.execute(crossterm::cursor::Show) {
        warn!("restoring cursor: {e}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::{DataProductRef, SearchResponse, SearchResult};
    use crate::session::Event;
    use tempfile::TempDir;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_text(app: &mut App, text: &str) -> Vec<Command> {
        text.chars()
            .flat_map(|c| app.handle_key(press(KeyCode::Char(c))))
            .collect()
    }

    fn loaded_app() -> App {
        let mut app = App::new(SearchSession::new());
        type_text(&mut app, "aspirin");
        app.handle_key(press(KeyCode::Enter));
        app.session.apply(Event::SearchFinished(Ok(SearchResponse {
            results: Some(vec![SearchResult {
                title: "Aspirin primary prevention".into(),
                kind: "study".into(),
                phase: None,
                status: Some("Completed".into()),
                description: None,
                data_products: Some(vec![
                    DataProductRef {
                        id: 10,
                        title: "Labs".into(),
                        kind: "dataset".into(),
                    },
                    DataProductRef {
                        id: 11,
                        title: "Vitals".into(),
                        kind: "dataset".into(),
                    },
                ]),
            }]),
            total: Some(25),
        })));
        app
    }

    #[test]
    fn state_roundtrip_persists_theme_and_help() {
        let dir = TempDir::new().unwrap();
        let path = state_path_for(dir.path());

        let state = TuiStatePersisted {
            theme: Some("light".into()),
            has_seen_help: Some(true),
        };
        save_state(&path, &state);

        let loaded = load_state(&path);
        assert_eq!(loaded.theme.as_deref(), Some("light"));
        assert_eq!(loaded.has_seen_help, Some(true));
    }

    #[test]
    fn typing_arms_suggestions_after_two_chars() {
        let mut app = App::new(SearchSession::new());
        let commands = type_text(&mut app, "as");
        assert!(matches!(commands[0], Command::CancelSuggest));
        assert!(matches!(&commands[1], Command::Suggest { text, .. } if text == "as"));
        assert_eq!(app.session.input(), "as");
    }

    #[test]
    fn enter_adds_term_and_searches() {
        let mut app = App::new(SearchSession::new());
        type_text(&mut app, "aspirin");
        let commands = app.handle_key(press(KeyCode::Enter));
        assert!(commands.iter().any(|c| matches!(c, Command::Search(r) if r.query == "aspirin")));
        assert_eq!(app.session.query().terms(), ["aspirin"]);
        assert_eq!(app.session.input(), "");
    }

    #[test]
    fn ctrl_x_checks_product_under_cursor() {
        let mut app = loaded_app();
        app.handle_key(press(KeyCode::Down));
        app.handle_key(ctrl('x'));
        assert!(app.session.selection().contains(11));
        assert!(!app.session.selection().contains(10));
        assert!(app.session.actions_visible());
    }

    #[test]
    fn page_keys_issue_searches() {
        let mut app = loaded_app();
        let next = app.handle_key(press(KeyCode::PageDown));
        assert!(matches!(&next[..], [Command::Search(r)] if r.page == 2));
    }

    #[test]
    fn filter_mode_applies_value_on_enter() {
        let mut app = loaded_app();
        app.handle_key(press(KeyCode::F(3)));
        assert!(matches!(app.mode, InputMode::Filter { index: 0 }));
        let field = app.filter_fields()[0];
        type_text(&mut app, "III");
        let commands = app.handle_key(press(KeyCode::Enter));
        assert_eq!(app.mode, InputMode::Query);
        assert_eq!(app.session.query().filters().get(field), Some("III"));
        assert!(matches!(&commands[..], [Command::Search(_)]));
    }

    #[test]
    fn collection_dialog_creates_from_form() {
        let mut app = loaded_app();
        let open = app.handle_key(ctrl('a'));
        assert!(matches!(&open[..], [Command::ListCollections]));
        app.handle_key(press(KeyCode::Char('n')));
        assert_eq!(app.mode, InputMode::CollectionTitle);
        type_text(&mut app, "Cardio");
        app.handle_key(press(KeyCode::Tab));
        type_text(&mut app, "Heart studies");
        let commands = app.handle_key(press(KeyCode::Enter));
        match &commands[..] {
            [Command::CreateCollection(body)] => {
                assert_eq!(body.title, "Cardio");
                assert_eq!(body.description.as_deref(), Some("Heart studies"));
            }
            other => panic!("unexpected commands: {other:?}"),
        }
        app.handle_key(press(KeyCode::Esc));
        app.handle_key(press(KeyCode::Esc));
        assert!(!app.session.collections().open);
    }

    #[test]
    fn redirect_becomes_notice() {
        let mut app = loaded_app();
        app.session.apply(Event::CollectionsLoaded(Err(
            crate::api::ApiError::Unauthorized,
        )));
        app.after_events();
        assert!(app.session.redirect().is_none());
        let notice = app.session.notice().unwrap();
        assert_eq!(
            notice.link.as_deref(),
            Some("/auth/login?next=%2Fcollections")
        );
    }

    #[test]
    fn draw_renders_into_test_backend() {
        let app = loaded_app();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Aspirin primary prevention"));
        assert!(text.contains("Next"));
    }

    #[test]
    fn escape_quits_when_nothing_is_open() {
        let mut app = App::new(SearchSession::new());
        app.handle_key(press(KeyCode::Esc));
        assert!(app.quit);
    }
}
