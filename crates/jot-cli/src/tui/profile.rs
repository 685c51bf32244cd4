//! Profile screen. Mounting it starts one fetch; leaving it drops the model,
//! which cancels a fetch still in flight.

use super::Action;
use crossterm::event::{KeyCode, KeyEvent};
use jot_core::model::ProfileView;
use jot_core::view::ProfileModel;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

pub struct ProfileScreen {
    model: ProfileModel,
    handle: String,
}

impl ProfileScreen {
    pub fn new(model: ProfileModel, handle: impl Into<String>) -> Self {
        Self {
            model,
            handle: handle.into(),
        }
    }

    pub fn poll_fault(&mut self) -> anyhow::Result<()> {
        self.model.poll_fault()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => Action::Back,
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Char('r') => {
                self.model.load(self.handle.clone());
                Action::None
            }
            _ => Action::None,
        }
    }

    pub fn render(&self, frame: &mut Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_set(border::ROUNDED)
            .border_style(Style::default().fg(Color::Green))
            .title(format!(" profile — {} ", self.handle))
            .title_style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));

        let body = Paragraph::new(profile_lines(&self.model.view()))
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(body, chunks[0]);

        frame.render_widget(
            Paragraph::new(Span::styled(
                "r reload  esc back  q quit",
                Style::default().fg(Color::DarkGray),
            )),
            chunks[1],
        );
    }
}

fn profile_lines(view: &ProfileView) -> Vec<Line<'static>> {
    let label = Style::default().fg(Color::DarkGray);
    match view {
        ProfileView::Loading => vec![Line::from("Loading...")],
        ProfileView::Failed(message) => vec![Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Red),
        ))],
        ProfileView::Loaded(profile) => vec![
            Line::from(vec![
                Span::styled("avatar  ", label),
                Span::raw(profile.avatar_url.clone()),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                format!("@{}", profile.handle),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(profile.display_name_or_default().to_string()),
            Line::from(""),
            Line::from(profile.bio_or_default().to_string()),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::testing::{StaticSource, buffer_text, key, wait_until};
    use jot_core::model::Profile;
    use ratatui::{Terminal, backend::TestBackend};
    use std::sync::Arc;

    fn draw(screen: &ProfileScreen) -> Terminal<TestBackend> {
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).expect("terminal");
        terminal
            .draw(|frame| screen.render(frame, frame.area()))
            .expect("draw");
        terminal
    }

    #[tokio::test]
    async fn loaded_profile_shows_placeholders() {
        let source = StaticSource::ok(Profile {
            handle: "octocat".into(),
            avatar_url: "https://x/octocat.png".into(),
            display_name: None,
            bio: None,
        });
        let screen = ProfileScreen::new(ProfileModel::mount(Arc::new(source), "octocat"), "octocat");
        wait_until(|| screen.model.view().profile().is_some()).await;

        let text = buffer_text(&draw(&screen));
        assert!(text.contains("https://x/octocat.png"));
        assert!(text.contains("@octocat"));
        assert!(text.contains("No name"));
        assert!(text.contains("No bio"));
    }

    #[tokio::test]
    async fn failure_is_shown_in_red() {
        let source = StaticSource::failing("request timed out");
        let screen = ProfileScreen::new(ProfileModel::mount(Arc::new(source), "octocat"), "octocat");
        wait_until(|| screen.model.view().error().is_some()).await;

        let terminal = draw(&screen);
        let text = buffer_text(&terminal);
        assert!(text.contains("request timed out"));

        let buffer = terminal.backend().buffer();
        let red = (0..buffer.area.height).any(|y| {
            (0..buffer.area.width).any(|x| {
                buffer
                    .cell((x, y))
                    .is_some_and(|cell| cell.symbol() == "r" && cell.fg == Color::Red)
            })
        });
        assert!(red, "error text should be red:\n{text}");
    }

    #[test]
    fn loading_renders_placeholder() {
        let lines = profile_lines(&ProfileView::Loading);
        assert_eq!(lines, vec![Line::from("Loading...")]);
    }

    #[tokio::test]
    async fn back_and_reload_keys() {
        let source = StaticSource::failing("nope");
        let mut screen = ProfileScreen::new(ProfileModel::new(Arc::new(source)), "octocat");
        assert_eq!(screen.handle_key(key(KeyCode::Esc)), Action::Back);
        assert_eq!(screen.handle_key(key(KeyCode::Char('b'))), Action::Back);
        assert_eq!(screen.handle_key(key(KeyCode::Char('q'))), Action::Quit);

        assert!(screen.model.view().is_loading());
        assert_eq!(screen.handle_key(key(KeyCode::Char('r'))), Action::None);
        wait_until(|| screen.model.view().error() == Some("nope")).await;
    }
}
