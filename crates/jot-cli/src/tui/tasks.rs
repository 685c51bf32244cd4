//! Task-list screen: an input line for new tasks above the live list.
//!
//! Key bindings (normal mode): `a`/`i` edit the input line, j/k or arrows
//! move, space/enter/`x` toggle, `p` opens the profile, `q` quits.
//! While editing: type, Backspace, Enter submits, Esc leaves the input.

use super::Action;
use crossterm::event::{KeyCode, KeyEvent};
use jot_core::model::TaskRecord;
use jot_core::view::TaskListModel;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Normal,
    Editing,
}

pub struct TaskListScreen {
    model: TaskListModel,
    input: String,
    input_mode: InputMode,
    table_state: TableState,
}

impl TaskListScreen {
    pub fn new(model: TaskListModel) -> Self {
        Self {
            model,
            input: String::new(),
            input_mode: InputMode::Normal,
            table_state: TableState::default(),
        }
    }

    /// Surface a storage fault raised by a background write.
    pub fn poll_fault(&mut self) -> anyhow::Result<()> {
        self.model.poll_fault()
    }

    pub fn is_editing(&self) -> bool {
        self.input_mode == InputMode::Editing
    }

    fn selected_task(&self) -> Option<TaskRecord> {
        let snapshot = self.model.tasks();
        let index = self.table_state.selected()?;
        snapshot.tasks().get(index).cloned()
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.model.tasks().len();
        if len == 0 {
            self.table_state.select(None);
            return;
        }
        let current = self.table_state.selected().unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(len - 1);
        self.table_state.select(Some(next));
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        match self.input_mode {
            InputMode::Editing => {
                self.handle_input_key(key);
                Action::None
            }
            InputMode::Normal => self.handle_normal_key(key),
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.input_mode = InputMode::Normal,
            KeyCode::Enter => {
                let text = std::mem::take(&mut self.input);
                self.model.add_task(text);
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('q') => return Action::Quit,
            KeyCode::Char('p') => return Action::OpenProfile,
            KeyCode::Char('a' | 'i') => self.input_mode = InputMode::Editing,
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char(' ' | 'x') | KeyCode::Enter => {
                if let Some(task) = self.selected_task() {
                    self.model.toggle_task(task);
                }
            }
            _ => {}
        }
        Action::None
    }

    pub fn render(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_input(frame, chunks[0]);
        self.render_table(frame, chunks[1]);

        let help = if self.is_editing() {
            "enter add  esc done"
        } else {
            "a add  space toggle  j/k move  p profile  q quit"
        };
        frame.render_widget(
            Paragraph::new(Span::styled(help, Style::default().fg(Color::DarkGray))),
            chunks[2],
        );
    }

    fn render_input(&self, frame: &mut Frame<'_>, area: Rect) {
        let (border_style, text) = if self.is_editing() {
            (Style::default().fg(Color::Yellow), format!("{}_", self.input))
        } else {
            (Style::default().fg(Color::DarkGray), self.input.clone())
        };
        let input = Paragraph::new(text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_set(border::ROUNDED)
                .border_style(border_style)
                .title(" New task "),
        );
        frame.render_widget(input, area);
    }

    fn render_table(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let snapshot = self.model.tasks();
        match self.table_state.selected() {
            _ if snapshot.is_empty() => self.table_state.select(None),
            None => self.table_state.select(Some(0)),
            Some(index) if index >= snapshot.len() => self.table_state.select(Some(snapshot.len() - 1)),
            Some(_) => {}
        }

        let rows: Vec<Row<'static>> = snapshot.tasks().iter().map(build_row).collect();
        let title = format!(" jot — {} tasks, {} done ", snapshot.len(), snapshot.completed());
        let table = Table::new(rows, [Constraint::Min(10)])
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_set(border::ROUNDED)
                    .border_style(Style::default().fg(Color::Green))
                    .title(title)
                    .title_style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
            )
            .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
            .highlight_symbol(" ");

        frame.render_stateful_widget(table, area, &mut self.table_state);
    }
}

fn build_row(task: &TaskRecord) -> Row<'static> {
    let text_style = if task.is_completed {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default()
    };
    Row::new([Cell::from(Line::from(vec![
        Span::styled(task.marker(), Style::default().fg(Color::Cyan)),
        Span::raw(" "),
        Span::styled(task.text.clone(), text_style),
    ]))])
}
