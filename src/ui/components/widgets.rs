//! Reusable ratatui widgets built from [`crate::ui::render`] view models.

use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Tabs, Wrap};

use super::theme::ThemePalette;
use crate::search::query::Category;
use crate::ui::render::{
    CollectionsDialog, FilterChip, NoticeView, PaginationView, ResultsView, SelectionView,
    SuggestionItem,
};
use crate::session::CollectionsView;

/// Query input with the active terms rendered as pills in front of it.
pub fn search_bar<'a>(
    terms: &[String],
    input: &'a str,
    palette: ThemePalette,
    focused: bool,
) -> Paragraph<'a> {
    let mut spans: Vec<Span<'a>> = Vec::new();
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" OR ", palette.hint_style()));
        }
        spans.push(Span::styled(
            format!(" {term} ×"),
            Style::default()
                .fg(palette.bg)
                .bg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ));
    }
    if !terms.is_empty() {
        spans.push(Span::raw("  "));
    }
    if input.is_empty() {
        let hint = if terms.len() >= crate::search::query::MAX_TERMS {
            "term limit reached"
        } else {
            "type a term, Enter to add"
        };
        spans.push(Span::styled(hint, palette.hint_style()));
    } else {
        spans.push(Span::styled(input, Style::default().fg(palette.fg)));
    }

    let border = if focused {
        palette.border_focus_style()
    } else {
        palette.border_style()
    };
    Paragraph::new(Line::from(spans)).block(
        Block::default()
            .title(Span::styled("Search", palette.title()))
            .borders(Borders::ALL)
            .border_style(border),
    )
}

pub fn category_tabs(active: Category, palette: ThemePalette) -> Tabs<'static> {
    let titles: Vec<Line<'static>> = Category::ALL
        .iter()
        .map(|c| Line::from(c.label()))
        .collect();
    let selected = Category::ALL.iter().position(|c| *c == active).unwrap_or(0);
    Tabs::new(titles)
        .select(selected)
        .style(palette.hint_style())
        .highlight_style(palette.title())
        .divider("|")
}

pub fn filter_chips(chips: &[FilterChip], palette: ThemePalette) -> Line<'static> {
    if chips.is_empty() {
        return Line::from(Span::styled("no filters (F3 to edit)", palette.hint_style()));
    }
    let mut spans = Vec::new();
    for chip in chips {
        spans.push(Span::styled(
            format!("{}:{}", chip.label, chip.value),
            Style::default()
                .fg(palette.accent_alt)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw("  "));
    }
    Line::from(spans)
}

pub fn notice_line(notice: Option<&NoticeView>, palette: ThemePalette) -> Line<'static> {
    let Some(notice) = notice else {
        return Line::from("");
    };
    let mut spans = vec![Span::styled(
        notice.text.clone(),
        palette.notice_style(notice.level),
    )];
    if let Some(link) = &notice.link {
        spans.push(Span::styled(format!("  → {link}"), palette.hint_style()));
    }
    Line::from(spans)
}

/// Result blocks as lines; `cursor` is the product id under the cursor.
pub fn result_lines(
    view: &ResultsView,
    cursor: Option<i64>,
    palette: ThemePalette,
) -> Vec<Line<'static>> {
    match view {
        ResultsView::Idle => vec![Line::from(Span::styled(
            "Add up to three terms to search studies, indications and procedures.",
            palette.hint_style(),
        ))],
        ResultsView::Loading => vec![Line::from(Span::styled(
            crate::ui::render::LOADING,
            palette.hint_style(),
        ))],
        ResultsView::Empty { message } => vec![Line::from(*message).centered()],
        ResultsView::Failed { message } => vec![Line::from(Span::styled(
            *message,
            Style::default().fg(palette.error),
        ))],
        ResultsView::Results { items } => {
            let mut lines = Vec::new();
            for (idx, block) in items.iter().enumerate() {
                let stripe = palette.stripe(idx);
                lines.push(Line::from(Span::styled(
                    block.title.clone(),
                    palette.title_subtle(),
                )));
                let mut meta = vec![Span::styled(
                    format!("[{}]", block.kind),
                    palette.kind_style(&block.kind),
                )];
                for badge in &block.badges {
                    meta.push(Span::raw(" "));
                    meta.push(Span::styled(format!(" {badge} "), palette.badge_style()));
                }
                lines.push(Line::from(meta));
                if let Some(desc) = &block.description {
                    lines.push(Line::from(Span::styled(desc.clone(), palette.hint_style())));
                }
                if !block.products.is_empty() {
                    lines.push(Line::from(Span::styled(
                        "Available Data Products:",
                        palette.hint_style(),
                    )));
                    for product in &block.products {
                        let mark = if product.checked { "[x]" } else { "[ ]" };
                        let mut style = Style::default().fg(palette.fg);
                        if cursor == Some(product.id) {
                            style = style.add_modifier(Modifier::REVERSED);
                        }
                        lines.push(Line::from(vec![
                            Span::raw("  "),
                            Span::styled(format!("{mark} {}", product.label), style),
                        ]));
                    }
                }
                lines.push(Line::from("").style(stripe));
            }
            lines
        }
    }
}

pub fn pagination_line(p: &PaginationView, palette: ThemePalette) -> Line<'static> {
    let edge = |label: &'static str, disabled: bool| {
        if disabled {
            Span::styled(label, palette.disabled_style())
        } else {
            Span::styled(label, Style::default().fg(palette.accent))
        }
    };
    let mut spans = vec![edge("‹ Prev", p.prev_disabled), Span::raw("  ")];
    for link in &p.pages {
        let style = if link.active {
            palette.title().add_modifier(Modifier::REVERSED)
        } else {
            palette.hint_style()
        };
        spans.push(Span::styled(format!(" {} ", link.number), style));
    }
    spans.push(Span::raw("  "));
    spans.push(edge("Next ›", p.next_disabled));
    Line::from(spans).centered()
}

/// The actions affordance; callers only draw it while something is checked.
pub fn selection_panel(sel: &SelectionView, palette: ThemePalette) -> Paragraph<'static> {
    let mut lines = vec![Line::from(Span::styled(
        format!("{} selected", sel.items.len()),
        palette.title(),
    ))];
    for label in &sel.items {
        lines.push(Line::from(format!("• {label}")));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Ctrl+A add to collection",
        palette.hint_style(),
    )));
    Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .title("Actions")
            .borders(Borders::ALL)
            .border_style(palette.border_focus_style()),
    )
}

pub fn suggestions_list(
    items: &[SuggestionItem],
    cursor: Option<usize>,
    palette: ThemePalette,
) -> List<'static> {
    let rows: Vec<ListItem<'static>> = items
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let mut style = Style::default().fg(palette.fg);
            if cursor == Some(i) {
                style = style.add_modifier(Modifier::REVERSED);
            }
            ListItem::new(Line::from(vec![
                Span::styled(s.text.clone(), style),
                Span::raw("  "),
                Span::styled(s.kind.clone(), palette.hint_style()),
            ]))
        })
        .collect();
    List::new(rows).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(palette.border_style())
            .style(palette.surface_style()),
    )
}

/// Collection picker or create form, depending on the dialog view.
pub fn collections_dialog(
    dialog: &CollectionsDialog,
    cursor: usize,
    form: (&str, &str),
    editing_description: bool,
    palette: ThemePalette,
) -> Paragraph<'static> {
    let mut lines = vec![
        Line::from(Span::styled("Selected Items:", palette.title_subtle())),
        Line::from(dialog.selected.summary()),
        Line::from(""),
    ];
    match dialog.view {
        CollectionsView::List => {
            lines.push(Line::from(Span::styled(
                "Choose Collection:",
                palette.title_subtle(),
            )));
            if dialog.loading {
                lines.push(Line::from(Span::styled(
                    "Loading collections...",
                    palette.hint_style(),
                )));
            } else if let Some(message) = dialog.message {
                lines.push(Line::from(message));
            }
            for (i, option) in dialog.options.iter().enumerate() {
                let mut style = Style::default().fg(palette.fg);
                if i == cursor {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                lines.push(Line::from(Span::styled(option.title.clone(), style)));
                if !option.description.is_empty() {
                    lines.push(Line::from(Span::styled(
                        format!("  {}", option.description),
                        palette.hint_style(),
                    )));
                }
            }
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Enter add • N new collection • R reload • Esc close",
                palette.hint_style(),
            )));
        }
        CollectionsView::CreateForm => {
            let field = |label: &str, value: &str, active: bool| {
                let style = if active {
                    palette.border_focus_style().add_modifier(Modifier::BOLD)
                } else {
                    palette.hint_style()
                };
                Line::from(vec![
                    Span::styled(format!("{label}: "), style),
                    Span::raw(value.to_string()),
                ])
            };
            lines.push(field("Collection Title", form.0, !editing_description));
            lines.push(field("Description", form.1, editing_description));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Tab switch field • Enter create • Esc back to collections",
                palette.hint_style(),
            )));
        }
    }
    Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(Span::styled("Add to Collection", palette.title()))
            .borders(Borders::ALL)
            .border_style(palette.border_focus_style())
            .style(palette.surface_style()),
    )
}
