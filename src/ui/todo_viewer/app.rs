use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::Terminal;

use crate::error::Result;
use crate::storage::KeyValueStore;
use crate::task::{Action, Task, TaskMint, TaskStore, UlidMint};
use crate::views::{self, CompletionStats, Filter};

use super::editor::{EditorAction, EditorKind, EditorState};
use super::model;
use super::view;

pub(crate) const NARROW_WIDTH: u16 = 80;
const EVENT_POLL_MS: u64 = 250;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StatusKind {
    Error,
    Info,
}

#[derive(Default, Clone, Copy)]
struct Viewport {
    width: u16,
    height: u16,
}

pub struct AppState<S, M = UlidMint> {
    pub(crate) filter: Filter,
    pub(crate) visible: Vec<usize>,
    pub(crate) selected: Option<usize>,
    pub(crate) editor: Option<EditorState>,
    pub(crate) reset_confirm: bool,
    pub(crate) show_stats: bool,
    pub(crate) show_help: bool,
    status_message: Option<String>,
    info_message: Option<String>,
    viewport: Viewport,
    store: TaskStore<S, M>,
}

impl<S: KeyValueStore, M: TaskMint> AppState<S, M> {
    pub fn new(store: TaskStore<S, M>, filter: Filter, show_stats: bool) -> Self {
        let mut app = Self {
            filter,
            visible: Vec::new(),
            selected: None,
            editor: None,
            reset_confirm: false,
            show_stats,
            show_help: false,
            status_message: None,
            info_message: None,
            viewport: Viewport::default(),
            store,
        };
        app.refresh(None, 0);
        app
    }

    pub fn store(&self) -> &TaskStore<S, M> {
        &self.store
    }

    pub(crate) fn tasks(&self) -> &[Task] {
        self.store.tasks()
    }

    pub(crate) fn selected_task(&self) -> Option<&Task> {
        self.selected.and_then(|idx| self.tasks().get(idx))
    }

    pub(crate) fn selected_position(&self) -> Option<usize> {
        model::position_of(&self.visible, self.selected)
    }

    pub(crate) fn stats(&self) -> CompletionStats {
        views::completion_stats(self.tasks())
    }

    pub(crate) fn filter_count(&self, filter: Filter) -> usize {
        self.tasks().iter().filter(|task| filter.matches(task)).count()
    }

    fn update_viewport(&mut self, width: u16, height: u16) {
        self.viewport = Viewport { width, height };
    }

    pub(crate) fn is_narrow(&self) -> bool {
        self.viewport.width > 0 && self.viewport.width < NARROW_WIDTH
    }

    pub(crate) fn status_line(&self) -> Option<(String, StatusKind)> {
        if let Some(message) = self.status_message.as_ref() {
            return Some((message.clone(), StatusKind::Error));
        }
        self.info_message
            .as_ref()
            .map(|info| (info.clone(), StatusKind::Info))
    }

    pub(crate) fn footer_hint(&self) -> String {
        if self.reset_confirm {
            return "y remove every task  any other key cancel".to_string();
        }
        if self.editor.is_some() {
            return "enter save  ctrl+u clear  esc cancel".to_string();
        }
        "j/k move  space toggle  a add  e edit  d delete  c clear done  tab filter  ? help  q quit"
            .to_string()
    }

    pub(crate) fn remaining_summary(&self) -> String {
        let stats = self.stats();
        format!(
            "{}  done: {}/{} ({}%)",
            views::remaining_label(stats.active),
            stats.done,
            stats.total,
            stats.done_percent
        )
    }

    /// Recompute the visible rows, keeping the selection where possible.
    fn refresh(&mut self, previous_id: Option<String>, previous_pos: usize) {
        self.visible = model::visible_indices(self.store.tasks(), self.filter);
        self.selected = model::select_by_id(
            self.store.tasks(),
            &self.visible,
            previous_id.as_deref(),
            previous_pos,
        );
    }

    fn set_filter(&mut self, filter: Filter) {
        if self.filter == filter {
            return;
        }
        let previous = self.selected_task().map(|task| task.id.clone());
        self.filter = filter;
        self.refresh(previous, 0);
        self.set_info(format!("showing {filter}"));
    }

    fn move_selection(&mut self, delta: isize) {
        if self.visible.is_empty() {
            self.selected = None;
            return;
        }
        let current = self.selected_position().unwrap_or(0);
        let max = self.visible.len().saturating_sub(1);
        let next = (current as isize + delta).clamp(0, max as isize) as usize;
        self.selected = Some(self.visible[next]);
    }

    fn list_jump(&self) -> isize {
        (self.viewport.height.saturating_sub(6) / 2).max(1) as isize
    }

    fn set_error(&mut self, message: String) {
        self.status_message = Some(message);
        self.info_message = None;
    }

    fn set_info(&mut self, message: String) {
        self.info_message = Some(message);
        self.status_message = None;
    }

    /// Run `action` through the store and refresh the view.
    fn dispatch(&mut self, action: Action, done_message: &str, noop_message: &str) {
        let previous = self.selected_task().map(|task| task.id.clone());
        let previous_pos = self.selected_position().unwrap_or(0);
        match self.store.apply(action) {
            Ok(true) => {
                self.refresh(previous, previous_pos);
                self.set_info(done_message.to_string());
            }
            Ok(false) => self.set_info(noop_message.to_string()),
            Err(err) => self.set_error(err.to_string()),
        }
    }

    fn reload(&mut self) {
        let previous = self.selected_task().map(|task| task.id.clone());
        let previous_pos = self.selected_position().unwrap_or(0);
        match self.store.reload() {
            Ok(()) => {
                self.refresh(previous, previous_pos);
                self.set_info(format!("reloaded {} tasks", self.tasks().len()));
            }
            Err(err) => self.set_error(err.to_string()),
        }
    }

    fn reset(&mut self) {
        match self.store.reset() {
            Ok(()) => {
                self.refresh(None, 0);
                self.set_info("all tasks removed".to_string());
            }
            Err(err) => self.set_error(err.to_string()),
        }
    }

    fn submit_editor(&mut self, editor: EditorState) {
        let text = editor.submit_text();
        match (editor.kind(), editor.task_id()) {
            (EditorKind::EditTask, Some(id)) => {
                let action = Action::Edit {
                    id: id.to_string(),
                    text,
                };
                self.dispatch(action, "task updated", "nothing changed");
            }
            _ => {
                self.dispatch(Action::Add(text), "task added", "nothing to add");
                // New tasks are prepended; follow them when they are visible.
                if let Some(first) = self.visible.first().copied() {
                    if first == 0 {
                        self.selected = Some(0);
                    }
                }
            }
        }
    }
}

pub fn run<S: KeyValueStore, M: TaskMint>(
    store: TaskStore<S, M>,
    filter: Filter,
    show_stats: bool,
) -> Result<()> {
    let mut app = AppState::new(store, filter, show_stats);
    run_terminal(&mut app)
}

fn run_terminal<S: KeyValueStore, M: TaskMint>(app: &mut AppState<S, M>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let size = terminal.size()?;
    app.update_viewport(size.width, size.height);

    let result = run_loop(&mut terminal, app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_loop<B: Backend, S: KeyValueStore, M: TaskMint>(
    terminal: &mut Terminal<B>,
    app: &mut AppState<S, M>,
) -> Result<()> {
    let mut dirty = true;
    loop {
        if dirty {
            draw(terminal, app)?;
            dirty = false;
        }

        if event::poll(Duration::from_millis(EVENT_POLL_MS))? {
            match event::read()? {
                Event::Key(key) => {
                    if handle_key(app, key) {
                        break;
                    }
                    dirty = true;
                }
                Event::Resize(width, height) => {
                    app.update_viewport(width, height);
                    dirty = true;
                }
                _ => {}
            }
        }
    }
    Ok(())
}

pub(crate) fn draw<B: Backend, S: KeyValueStore, M: TaskMint>(
    terminal: &mut Terminal<B>,
    app: &mut AppState<S, M>,
) -> Result<()> {
    terminal.draw(|frame| {
        app.update_viewport(frame.size().width, frame.size().height);
        view::render(frame, app);
    })?;
    Ok(())
}

/// Handle one key press. Returns `true` when the viewer should exit.
pub(crate) fn handle_key<S: KeyValueStore, M: TaskMint>(
    app: &mut AppState<S, M>,
    key: KeyEvent,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }

    if app.reset_confirm {
        app.reset_confirm = false;
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.reset(),
            _ => app.set_info("cancelled".to_string()),
        }
        return false;
    }

    if let Some(mut editor) = app.editor.take() {
        match editor.handle_key(key) {
            EditorAction::None => app.editor = Some(editor),
            EditorAction::Cancel => app.set_info("cancelled".to_string()),
            EditorAction::Submit => app.submit_editor(editor),
        }
        return false;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('d') => app.move_selection(app.list_jump()),
            KeyCode::Char('u') => app.move_selection(-app.list_jump()),
            _ => {}
        }
        return false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Esc => {
            if app.show_help {
                app.show_help = false;
            } else {
                return true;
            }
        }
        KeyCode::Char('j') | KeyCode::Down => app.move_selection(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_selection(-1),
        KeyCode::Char('g') | KeyCode::Home => app.move_selection(isize::MIN / 2),
        KeyCode::Char('G') | KeyCode::End => app.move_selection(isize::MAX / 2),
        KeyCode::Char(' ') | KeyCode::Char('x') => {
            let Some(id) = app.selected_task().map(|task| task.id.clone()) else {
                app.set_info("no task selected".to_string());
                return false;
            };
            app.dispatch(Action::Toggle(id), "task toggled", "no matching task");
        }
        KeyCode::Char('a') | KeyCode::Char('n') => {
            app.editor = Some(EditorState::new_task());
        }
        KeyCode::Char('e') | KeyCode::Enter => {
            let Some(editor) = app.selected_task().map(EditorState::edit_task) else {
                app.set_info("no task selected".to_string());
                return false;
            };
            app.editor = Some(editor);
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            let Some(id) = app.selected_task().map(|task| task.id.clone()) else {
                app.set_info("no task selected".to_string());
                return false;
            };
            app.dispatch(Action::Delete(id), "task deleted", "no matching task");
        }
        KeyCode::Char('c') => {
            app.dispatch(Action::ClearDone, "completed tasks cleared", "no completed tasks");
        }
        KeyCode::Char('1') => app.set_filter(Filter::All),
        KeyCode::Char('2') => app.set_filter(Filter::Active),
        KeyCode::Char('3') => app.set_filter(Filter::Done),
        KeyCode::Tab => app.set_filter(app.filter.next()),
        KeyCode::Char('s') => app.show_stats = !app.show_stats,
        KeyCode::Char('?') => app.show_help = !app.show_help,
        KeyCode::Char('r') => app.reload(),
        KeyCode::Char('R') => {
            if app.tasks().is_empty() {
                app.set_info("nothing to reset".to_string());
            } else {
                app.reset_confirm = true;
            }
        }
        _ => {}
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::task::tests::{memory_store, SeqMint};
    use ratatui::backend::TestBackend;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text<S: KeyValueStore, M: TaskMint>(app: &mut AppState<S, M>, text: &str) {
        for ch in text.chars() {
            assert!(!handle_key(app, key(KeyCode::Char(ch))));
        }
    }

    fn add_task<S: KeyValueStore, M: TaskMint>(app: &mut AppState<S, M>, text: &str) {
        handle_key(app, key(KeyCode::Char('a')));
        type_text(app, text);
        handle_key(app, key(KeyCode::Enter));
    }

    fn app() -> AppState<MemoryStore, SeqMint> {
        AppState::new(memory_store(), Filter::All, true)
    }

    fn screen<S: KeyValueStore, M: TaskMint>(app: &mut AppState<S, M>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 24)).expect("terminal");
        draw(&mut terminal, app).expect("draw");
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn add_toggle_and_filter_flow() {
        let mut app = app();
        add_task(&mut app, "buy milk");
        add_task(&mut app, "walk dog");
        assert_eq!(app.tasks().len(), 2);
        assert_eq!(app.selected_task().map(|t| t.text.as_str()), Some("walk dog"));

        handle_key(&mut app, key(KeyCode::Char('j')));
        assert_eq!(app.selected_task().map(|t| t.text.as_str()), Some("buy milk"));
        handle_key(&mut app, key(KeyCode::Char(' ')));
        assert!(app.tasks()[1].done);

        handle_key(&mut app, key(KeyCode::Char('2')));
        assert_eq!(app.filter, Filter::Active);
        assert_eq!(app.visible, vec![0]);

        assert_eq!(app.store().storage().load(), app.tasks().to_vec());
        assert_eq!(app.store().storage().backend().writes(), 3);
    }

    #[test]
    fn empty_editor_submission_is_refused() {
        let mut app = app();
        handle_key(&mut app, key(KeyCode::Char('a')));
        type_text(&mut app, "  ");
        handle_key(&mut app, key(KeyCode::Enter));
        assert!(app.editor.is_some());
        assert_eq!(
            app.editor.as_ref().and_then(|e| e.error()),
            Some("text is required")
        );
        handle_key(&mut app, key(KeyCode::Esc));
        assert!(app.editor.is_none());
        assert!(app.tasks().is_empty());
        assert_eq!(app.store().storage().backend().writes(), 0);
    }

    #[test]
    fn typing_q_in_editor_does_not_quit() {
        let mut app = app();
        handle_key(&mut app, key(KeyCode::Char('a')));
        type_text(&mut app, "quiz");
        handle_key(&mut app, key(KeyCode::Enter));
        assert_eq!(app.tasks()[0].text, "quiz");
        assert!(handle_key(&mut app, key(KeyCode::Char('q'))));
    }

    #[test]
    fn edit_and_delete_selected() {
        let mut app = app();
        add_task(&mut app, "first");
        add_task(&mut app, "second");

        handle_key(&mut app, key(KeyCode::Char('e')));
        handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL),
        );
        type_text(&mut app, "renamed");
        handle_key(&mut app, key(KeyCode::Enter));
        assert_eq!(app.tasks()[0].text, "renamed");

        handle_key(&mut app, key(KeyCode::Char('d')));
        assert_eq!(app.tasks().len(), 1);
        assert_eq!(app.selected_task().map(|t| t.text.as_str()), Some("first"));
    }

    #[test]
    fn clear_done_and_reset_confirm() {
        let mut app = app();
        add_task(&mut app, "a");
        add_task(&mut app, "b");
        handle_key(&mut app, key(KeyCode::Char(' ')));
        handle_key(&mut app, key(KeyCode::Char('c')));
        assert_eq!(app.tasks().len(), 1);
        assert_eq!(app.tasks()[0].text, "a");

        handle_key(&mut app, key(KeyCode::Char('R')));
        assert!(app.reset_confirm);
        handle_key(&mut app, key(KeyCode::Char('n')));
        assert!(!app.reset_confirm);
        assert_eq!(app.tasks().len(), 1);

        handle_key(&mut app, key(KeyCode::Char('R')));
        handle_key(&mut app, key(KeyCode::Char('y')));
        assert!(app.tasks().is_empty());
        assert!(app.store().storage().read_raw().expect("read").is_none());
    }

    #[test]
    fn tab_cycles_filters_and_quit_keys() {
        let mut app = app();
        handle_key(&mut app, key(KeyCode::Tab));
        assert_eq!(app.filter, Filter::Active);
        handle_key(&mut app, key(KeyCode::Tab));
        assert_eq!(app.filter, Filter::Done);
        handle_key(&mut app, key(KeyCode::Tab));
        assert_eq!(app.filter, Filter::All);

        handle_key(&mut app, key(KeyCode::Char('?')));
        assert!(app.show_help);
        assert!(!handle_key(&mut app, key(KeyCode::Esc)));
        assert!(!app.show_help);
        assert!(handle_key(&mut app, key(KeyCode::Esc)));
    }

    #[test]
    fn render_shows_tabs_rows_and_remaining() {
        let mut app = app();
        add_task(&mut app, "buy milk");
        add_task(&mut app, "walk dog");
        handle_key(&mut app, key(KeyCode::Char('j')));
        handle_key(&mut app, key(KeyCode::Char(' ')));

        let text = screen(&mut app);
        assert!(text.contains("1 All (2)"));
        assert!(text.contains("2 Active (1)"));
        assert!(text.contains("3 Done (1)"));
        assert!(text.contains("walk dog"));
        assert!(text.contains("[x] buy milk"));
        assert!(text.contains("1 item left"));
        assert!(text.contains("Stats"));
        assert!(text.contains("50%"));
    }

    #[test]
    fn render_empty_list_and_modals() {
        let mut app = app();
        let text = screen(&mut app);
        assert!(text.contains("No tasks"));

        handle_key(&mut app, key(KeyCode::Char('a')));
        let text = screen(&mut app);
        assert!(text.contains("New Task"));

        handle_key(&mut app, key(KeyCode::Esc));
        add_task(&mut app, "x");
        handle_key(&mut app, key(KeyCode::Char('R')));
        let text = screen(&mut app);
        assert!(text.contains("Remove every task?"));
    }
}
