//! Terminal user interface (TUI) for jot.
//!
//! Two screens: the task list (root) and the profile viewer.
//!
//! ## Entry points
//!
//! - [`run`] — full-screen session on the current terminal.

mod app;
mod profile;
mod tasks;

use anyhow::Result;
use app::App;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use jot_core::context::AppContext;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::info;

/// Redraw interval; store snapshots and fetch outcomes show up within one tick.
const TICK: Duration = Duration::from_millis(100);

/// What a screen asks the router to do after handling a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    OpenProfile,
    Back,
}

type Term = Terminal<CrosstermBackend<Stdout>>;

/// Run the TUI until the user quits or a background task faults.
///
/// Screens spawn their work on `runtime`; the event loop itself runs on the
/// calling thread.
///
/// # Errors
///
/// Returns an error if the terminal cannot be driven or a storage fault
/// surfaces from a screen's background tasks.
pub fn run(ctx: &AppContext, runtime: &Runtime) -> Result<()> {
    let _guard = runtime.enter();
    let mut app = App::new(ctx.clone());

    let mut terminal = setup_terminal()?;
    install_panic_hook();
    info!("tui started");

    let result = event_loop(&mut terminal, &mut app);
    let restored = restore_terminal(&mut terminal);
    drop(app);
    info!("tui stopped");

    result?;
    restored
}

fn event_loop(terminal: &mut Term, app: &mut App) -> Result<()> {
    while !app.should_quit() {
        app.poll_fault()?;
        terminal.draw(|frame| app.render(frame))?;

        if event::poll(TICK)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.handle_key(key);
        }
    }
    Ok(())
}

fn setup_terminal() -> Result<Term> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));
}
