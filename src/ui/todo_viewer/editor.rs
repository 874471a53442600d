use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::task::{normalize_text, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKind {
    NewTask,
    EditTask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    None,
    Cancel,
    Submit,
}

/// Single-line text field for adding or editing a task.
#[derive(Debug, Clone)]
pub struct EditorState {
    kind: EditorKind,
    value: String,
    /// Cursor position in chars
    cursor: usize,
    error: Option<String>,
    task_id: Option<String>,
}

impl EditorState {
    pub fn new_task() -> Self {
        Self {
            kind: EditorKind::NewTask,
            value: String::new(),
            cursor: 0,
            error: None,
            task_id: None,
        }
    }

    pub fn edit_task(task: &Task) -> Self {
        Self {
            kind: EditorKind::EditTask,
            value: task.text.clone(),
            cursor: task.text.chars().count(),
            error: None,
            task_id: Some(task.id.clone()),
        }
    }

    pub fn kind(&self) -> EditorKind {
        self.kind
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Trimmed text to submit. Only meaningful after `Submit`.
    pub fn submit_text(&self) -> String {
        self.value.trim().to_string()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> EditorAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('u') => {
                    self.value.clear();
                    self.cursor = 0;
                    self.error = None;
                }
                KeyCode::Char('a') => self.cursor = 0,
                KeyCode::Char('e') => self.cursor = self.len(),
                _ => {}
            }
            return EditorAction::None;
        }

        match key.code {
            KeyCode::Esc => return EditorAction::Cancel,
            KeyCode::Enter => return self.attempt_submit(),
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.remove_at(self.cursor);
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.len() {
                    self.remove_at(self.cursor);
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.len(),
            KeyCode::Char(ch) => {
                let at = self.byte_offset(self.cursor);
                self.value.insert(at, ch);
                self.cursor += 1;
                self.error = None;
            }
            _ => {}
        }
        EditorAction::None
    }

    fn attempt_submit(&mut self) -> EditorAction {
        if normalize_text(&self.value).is_none() {
            self.error = Some("text is required".to_string());
            return EditorAction::None;
        }
        EditorAction::Submit
    }

    fn len(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_offset(&self, char_pos: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_pos)
            .map(|(offset, _)| offset)
            .unwrap_or(self.value.len())
    }

    fn remove_at(&mut self, char_pos: usize) {
        let at = self.byte_offset(char_pos);
        if at < self.value.len() {
            self.value.remove(at);
        }
    }
}
