//! Interactive TUI for creating and working through a plan.

pub mod app;
mod ui;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use planbuddy_core::{PlanSource, Session};
use planbuddy_store::PlanStore;

use app::{Action, App};

const TICK_RATE: Duration = Duration::from_millis(250);

/// Launch the interactive planner.
pub async fn run_app(store: PlanStore, source: Arc<dyn PlanSource>) -> Result<()> {
    let session = Session::start(store, source).await;
    let mut app = App::new(session);

    // Set up terminal.
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_event_loop(&mut terminal, &mut app).await;

    // Restore terminal.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::render(f, app))?;

        if event::poll(TICK_RATE)? {
            if let Event::Key(key) = event::read()? {
                // Windows reports releases too.
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.handle_key(key).await == Action::Submit {
                    app.session.begin_submit();
                    terminal.draw(|f| ui::render(f, app))?;
                    app.submit().await;
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
