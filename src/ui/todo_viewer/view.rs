use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::storage::KeyValueStore;
use crate::task::{Task, TaskMint};
use crate::views::{self, Filter};

use super::app::{AppState, StatusKind};
use super::editor::{EditorKind, EditorState};

const DATE_WIDTH: usize = 16;
const HELP_KEY_WIDTH: usize = 12;
const BAR_WIDTH: usize = 20;
const COLOR_TEXT: Color = Color::Rgb(234, 236, 239);
const COLOR_MUTED: Color = Color::Rgb(160, 165, 172);
const COLOR_MUTED_DARK: Color = Color::Rgb(118, 124, 130);
const COLOR_BG_SELECTED: Color = Color::Rgb(52, 56, 60);
const COLOR_INFO: Color = Color::Rgb(116, 198, 219);
const COLOR_WARNING: Color = Color::Rgb(244, 200, 98);
const COLOR_ERROR: Color = Color::Rgb(255, 107, 107);
const COLOR_SUCCESS: Color = Color::Rgb(126, 210, 146);
const COLOR_ACCENT: Color = Color::Rgb(122, 170, 255);
const COLOR_BORDER_LIST: Color = Color::Rgb(92, 126, 166);
const COLOR_BORDER_STATS: Color = Color::Rgb(180, 156, 92);

pub fn render<S: KeyValueStore, M: TaskMint>(frame: &mut Frame, app: &AppState<S, M>) {
    let area = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(area);
    let tabs = chunks[0];
    let main = chunks[1];
    let footer = chunks[2];

    render_tabs(frame, app, tabs);

    if !app.show_stats {
        render_list(frame, app, main);
    } else if app.is_narrow() {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(8)].as_ref())
            .split(main);
        render_list(frame, app, chunks[0]);
        render_stats(frame, app, chunks[1]);
    } else {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)].as_ref())
            .split(main);
        render_list(frame, app, chunks[0]);
        render_stats(frame, app, chunks[1]);
    }

    render_footer(frame, app, footer);

    if let Some(editor) = app.editor.as_ref() {
        render_editor_modal(frame, area, editor);
    }
    if app.reset_confirm {
        render_reset_confirm_modal(frame, area, app.tasks().len());
    }
}

fn render_tabs<S: KeyValueStore, M: TaskMint>(frame: &mut Frame, app: &AppState<S, M>, area: Rect) {
    let mut spans = Vec::new();
    for (idx, filter) in Filter::ALL.into_iter().enumerate() {
        if idx > 0 {
            spans.push(Span::styled("  ", Style::default().fg(COLOR_MUTED_DARK)));
        }
        let text = format!("{} {} ({})", idx + 1, tab_label(filter), app.filter_count(filter));
        let style = if app.filter == filter {
            Style::default()
                .fg(tab_color(filter))
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(COLOR_MUTED)
        };
        spans.push(Span::styled(text, style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_list<S: KeyValueStore, M: TaskMint>(frame: &mut Frame, app: &AppState<S, M>, area: Rect) {
    let mut lines = Vec::new();
    let content_width = area.width.saturating_sub(2) as usize;
    let help_lines = if app.show_help {
        build_help_lines(content_width)
    } else {
        Vec::new()
    };
    let help_reserved = if help_lines.is_empty() {
        0
    } else {
        help_lines.len() + 1
    };

    if app.visible.is_empty() {
        let message = if app.tasks().is_empty() {
            "No tasks. Press a to add one.".to_string()
        } else {
            format!("No {} tasks", app.filter)
        };
        lines.push(Line::from(Span::styled(
            message,
            Style::default().fg(COLOR_MUTED),
        )));
    } else {
        let list_height = area
            .height
            .saturating_sub(2)
            .saturating_sub(help_reserved as u16) as usize;
        let (start, end) = list_window(app.visible.len(), app.selected_position(), list_height);
        for pos in start..end {
            let idx = app.visible[pos];
            if let Some(task) = app.tasks().get(idx) {
                lines.push(render_list_row(task, app.selected == Some(idx), content_width));
            }
        }
    }

    if !help_lines.is_empty() {
        lines.push(Line::from(""));
        lines.extend(help_lines);
    }

    let title = format!("Tasks: {}", app.filter);
    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(COLOR_BORDER_LIST)),
    );
    frame.render_widget(widget, area);
}

fn render_stats<S: KeyValueStore, M: TaskMint>(frame: &mut Frame, app: &AppState<S, M>, area: Rect) {
    let stats = app.stats();
    let content_width = area.width.saturating_sub(2) as usize;
    let mut lines = vec![
        stat_line("Total", stats.total.to_string()),
        stat_line("Done", stats.done.to_string()),
        stat_line("Active", stats.active.to_string()),
        Line::from(vec![
            label_span("Complete "),
            Span::styled(
                progress_bar(stats.done_percent, BAR_WIDTH.min(content_width.saturating_sub(14))),
                Style::default().fg(COLOR_SUCCESS),
            ),
            Span::styled(
                format!(" {}%", stats.done_percent),
                Style::default().fg(COLOR_TEXT).add_modifier(Modifier::BOLD),
            ),
        ]),
    ];
    if let Some(task) = views::earliest_created(app.tasks()) {
        lines.push(Line::from(""));
        lines.push(Line::from(label_span("Oldest task")));
        lines.push(Line::from(vec![
            Span::styled(
                truncate_text(&task.text, content_width.saturating_sub(DATE_WIDTH + 1)),
                Style::default().fg(COLOR_TEXT),
            ),
            Span::raw(" "),
            Span::styled(task.created_label(), Style::default().fg(COLOR_MUTED_DARK)),
        ]));
    }

    let widget = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Stats")
                .border_style(Style::default().fg(COLOR_BORDER_STATS)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(widget, area);
}

fn render_footer<S: KeyValueStore, M: TaskMint>(frame: &mut Frame, app: &AppState<S, M>, area: Rect) {
    let hint = app.footer_hint();
    let hint_span = Span::styled(hint, Style::default().fg(COLOR_INFO));
    let line = if let Some((status, kind)) = app.status_line() {
        let status_style = match kind {
            StatusKind::Error => Style::default()
                .fg(COLOR_ERROR)
                .add_modifier(Modifier::BOLD),
            StatusKind::Info => Style::default().fg(COLOR_WARNING),
        };
        Line::from(vec![
            hint_span,
            Span::raw("  |  "),
            Span::styled(status, status_style),
        ])
    } else {
        Line::from(hint_span)
    };
    let counts_line = Line::from(Span::styled(
        app.remaining_summary(),
        Style::default().fg(COLOR_ACCENT),
    ));
    let widget = Paragraph::new(vec![line, counts_line])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(COLOR_BORDER_LIST)),
        );
    frame.render_widget(widget, area);
}

fn render_editor_modal(frame: &mut Frame, area: Rect, editor: &EditorState) {
    let content_width = area.width.saturating_sub(8).min(72);
    let modal = centered_rect(content_width, 7, area);
    frame.render_widget(Clear, modal);

    let field_width = (content_width as usize).saturating_sub(4);
    let mut lines = vec![
        Line::from(value_with_caret_spans(
            editor.value(),
            editor.cursor(),
            field_width,
            Style::default().fg(COLOR_TEXT),
        )),
        Line::from(""),
    ];
    match editor.error() {
        Some(error) => lines.push(Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(COLOR_ERROR),
        ))),
        None => lines.push(Line::from(Span::styled(
            "enter save  esc cancel",
            Style::default().fg(COLOR_MUTED_DARK),
        ))),
    }

    let title = match editor.kind() {
        EditorKind::NewTask => "New Task",
        EditorKind::EditTask => "Edit Task",
    };
    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(COLOR_ACCENT)),
    );
    frame.render_widget(widget, modal);
}

fn render_reset_confirm_modal(frame: &mut Frame, area: Rect, total: usize) {
    let content_width = area.width.saturating_sub(8).min(56);
    let modal = centered_rect(content_width, 7, area);
    frame.render_widget(Clear, modal);

    let noun = if total == 1 { "task" } else { "tasks" };
    let lines = vec![
        Line::from(Span::styled(
            "Remove every task?",
            Style::default()
                .fg(COLOR_ERROR)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("{total} {noun} will be deleted from storage."),
            Style::default().fg(COLOR_WARNING),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "y confirm  any other key cancel",
            Style::default().fg(COLOR_MUTED_DARK),
        )),
    ];

    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Reset"))
        .wrap(Wrap { trim: true });
    frame.render_widget(widget, modal);
}

fn render_list_row(task: &Task, selected: bool, width: usize) -> Line<'static> {
    let marker = if selected { "> " } else { "  " };
    let checkbox = if task.done { "[x] " } else { "[ ] " };
    let prefix_width = marker.len() + checkbox.len();
    let show_date = width >= prefix_width + DATE_WIDTH + 12;
    let text_width = if show_date {
        width.saturating_sub(prefix_width + DATE_WIDTH + 1)
    } else {
        width.saturating_sub(prefix_width)
    };

    let mut text_style = Style::default().fg(COLOR_TEXT);
    if task.done {
        text_style = Style::default()
            .fg(COLOR_MUTED_DARK)
            .add_modifier(Modifier::CROSSED_OUT);
    }
    let checkbox_style = if task.done {
        Style::default().fg(COLOR_SUCCESS)
    } else {
        Style::default().fg(COLOR_MUTED)
    };

    let mut spans = vec![
        Span::styled(marker.to_string(), Style::default().fg(COLOR_ACCENT)),
        Span::styled(checkbox.to_string(), checkbox_style),
    ];
    if show_date {
        spans.push(Span::styled(pad_text(&task.text, text_width), text_style));
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            task.created_label(),
            Style::default().fg(COLOR_MUTED_DARK),
        ));
    } else {
        spans.push(Span::styled(truncate_text(&task.text, text_width), text_style));
    }

    let mut line = Line::from(spans);
    if selected {
        line = line.style(
            Style::default()
                .bg(COLOR_BG_SELECTED)
                .add_modifier(Modifier::BOLD),
        );
    }
    line
}

fn build_help_lines(width: usize) -> Vec<Line<'static>> {
    vec![
        help_header("Keys"),
        help_line("j/k", "move selection", width),
        help_line("space/x", "toggle done", width),
        help_line("a", "add task", width),
        help_line("e/enter", "edit task", width),
        help_line("d", "delete task", width),
        help_line("c", "clear completed", width),
        help_line("1/2/3, tab", "all / active / done", width),
        help_line("s", "show or hide stats", width),
        help_line("r", "reload from storage", width),
        help_line("R", "remove every task", width),
        help_line("ctrl+d/u", "page down/up", width),
        help_line("q/esc", "quit", width),
        help_line("?", "hide help", width),
    ]
}

fn help_header(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default().fg(COLOR_INFO).add_modifier(Modifier::BOLD),
    ))
}

fn help_line(keys: &str, desc: &str, width: usize) -> Line<'static> {
    let key_text = pad_text(keys, HELP_KEY_WIDTH.min(width));
    let desc_width = width.saturating_sub(HELP_KEY_WIDTH + 1);
    let desc_text = truncate_text(desc, desc_width);
    Line::from(vec![
        Span::styled(
            key_text,
            Style::default()
                .fg(COLOR_ACCENT)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(desc_text, Style::default().fg(COLOR_MUTED)),
    ])
}

fn stat_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        label_span(&format!("{label:<9}")),
        Span::styled(value, Style::default().fg(COLOR_TEXT).add_modifier(Modifier::BOLD)),
    ])
}

fn progress_bar(percent: u32, width: usize) -> String {
    let filled = (width * percent.min(100) as usize) / 100;
    format!("{}{}", "#".repeat(filled), ".".repeat(width - filled))
}

fn value_with_caret_spans(
    value: &str,
    cursor: usize,
    width: usize,
    style: Style,
) -> Vec<Span<'static>> {
    if width == 0 {
        return vec![Span::raw("")];
    }
    let chars: Vec<char> = value.chars().collect();
    let len = chars.len();
    let cursor = cursor.min(len);
    let caret_style = style.add_modifier(Modifier::REVERSED);

    let available = width.saturating_sub(1).max(1);
    let start = cursor.saturating_sub(available);
    let end = (start + available).min(len);

    let before: String = chars[start..cursor].iter().collect();
    let caret_char = chars.get(cursor).copied().unwrap_or(' ');
    let after: String = if cursor < end {
        chars[cursor + 1..end].iter().collect()
    } else {
        String::new()
    };

    let mut spans = Vec::new();
    if !before.is_empty() {
        spans.push(Span::styled(before, style));
    }
    spans.push(Span::styled(caret_char.to_string(), caret_style));
    if !after.is_empty() {
        spans.push(Span::styled(after, style));
    }
    spans
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width.saturating_sub(2));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn list_window(total: usize, selected: Option<usize>, height: usize) -> (usize, usize) {
    if total == 0 || height == 0 {
        return (0, 0);
    }
    if total <= height {
        return (0, total);
    }
    let selected = selected.unwrap_or(0);
    let mut start = selected.saturating_sub(height / 2);
    if start + height > total {
        start = total - height;
    }
    (start, start + height)
}

fn tab_label(filter: Filter) -> &'static str {
    match filter {
        Filter::All => "All",
        Filter::Active => "Active",
        Filter::Done => "Done",
    }
}

fn tab_color(filter: Filter) -> Color {
    match filter {
        Filter::All => COLOR_INFO,
        Filter::Active => COLOR_ACCENT,
        Filter::Done => COLOR_SUCCESS,
    }
}

fn pad_text(value: &str, width: usize) -> String {
    let text = truncate_text(value, width);
    let len = text.chars().count();
    format!("{text}{}", " ".repeat(width.saturating_sub(len)))
}

fn truncate_text(value: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= max {
        return value.to_string();
    }
    if max <= 3 {
        return chars[..max].iter().collect();
    }
    let mut out: String = chars[..(max - 3)].iter().collect();
    out.push_str("...");
    out
}

fn label_span(label: &str) -> Span<'static> {
    Span::styled(label.to_string(), Style::default().fg(COLOR_MUTED_DARK))
}
