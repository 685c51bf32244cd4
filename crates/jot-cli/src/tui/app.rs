//! Screen routing for the TUI.
//!
//! The task list is the root screen and stays mounted for the whole session.
//! The profile screen is pushed on top of it; going back drops it together
//! with its view scope.

use super::Action;
use super::profile::ProfileScreen;
use super::tasks::TaskListScreen;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use jot_core::context::AppContext;
use ratatui::Frame;
use tracing::debug;

pub struct App {
    ctx: AppContext,
    tasks: TaskListScreen,
    profile: Option<ProfileScreen>,
    should_quit: bool,
}

impl App {
    /// Mount the root screen. Requires a tokio runtime context.
    pub fn new(ctx: AppContext) -> Self {
        let tasks = TaskListScreen::new(ctx.task_list_model());
        Self {
            ctx,
            tasks,
            profile: None,
            should_quit: false,
        }
    }

    pub const fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Propagate a fault from any mounted screen's background tasks.
    pub fn poll_fault(&mut self) -> anyhow::Result<()> {
        self.tasks.poll_fault()?;
        if let Some(profile) = self.profile.as_mut() {
            profile.poll_fault()?;
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        let action = match self.profile.as_mut() {
            Some(profile) => profile.handle_key(key),
            None => self.tasks.handle_key(key),
        };
        self.apply(action);
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Quit => self.should_quit = true,
            Action::OpenProfile => {
                let handle = self.ctx.default_handle().to_string();
                debug!(handle, "opening profile screen");
                let model = self.ctx.profile_model(&handle);
                self.profile = Some(ProfileScreen::new(model, handle));
            }
            Action::Back => {
                debug!("closing profile screen");
                self.profile = None;
            }
        }
    }

    pub fn render(&mut self, frame: &mut Frame<'_>) {
        let area = frame.area();
        match self.profile.as_ref() {
            Some(profile) => profile.render(frame, area),
            None => self.tasks.render(frame, area),
        }
    }
}
