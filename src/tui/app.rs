//! TUI Application - terminal setup and run loop
//!
//! One `select!` loop multiplexes three sources: the engine event stream,
//! keyboard input read on a blocking thread, and a redraw tick.

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::{debug, info, warn};

use super::events::{handle_key_event, Action};
use super::state::{AppState, ViewMode};
use super::theme::DeployTheme;
use super::widgets::{ActivityLog, Details, Footer, Header, HelpOverlay, ItemList, Overview};
use crate::config::UiConfig;
use crate::deploy::DeployTree;
use crate::engine::{DeployEngine, DeployEventStream};
use crate::error::{DeployViewError, Result};
use crate::event::DeployEvent;

/// Rows of the activity pane, borders included
const ACTIVITY_HEIGHT: u16 = 8;

/// TUI Application
pub struct TuiApp {
    state: AppState,
    theme: DeployTheme,
    engine: Arc<dyn DeployEngine>,
    config: UiConfig,
}

impl TuiApp {
    pub fn new(engine: Arc<dyn DeployEngine>, tree: DeployTree, config: UiConfig) -> Self {
        Self {
            state: AppState::new(tree),
            theme: DeployTheme::new(),
            engine,
            config,
        }
    }

    /// Run until the user quits, returning the tree as last seen
    pub async fn run(mut self) -> Result<DeployTree> {
        let mut terminal = setup_terminal()?;

        let result = self.main_loop(&mut terminal).await;

        restore_terminal(&mut terminal)?;

        result.map(|()| self.state.tree)
    }

    async fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let instance_id = self.state.tree.root_instance_id().map(str::to_string);
        let mut stream = match self.engine.stream_deploy_events(instance_id.as_deref()).await {
            Ok(stream) => Some(stream),
            Err(e) => {
                warn!(error = %e, "could not subscribe to deploy events");
                self.state.stream_ended(Some(&e));
                None
            }
        };
        info!(instance = ?instance_id, "tui started");

        let mut keys = read_events();
        let mut ticker =
            tokio::time::interval(Duration::from_millis(self.config.tick_rate_ms.max(10)));

        loop {
            terminal
                .draw(|frame| self.render(frame))
                .map_err(|e| DeployViewError::Terminal(e.to_string()))?;

            tokio::select! {
                next = next_event(&mut stream) => match next {
                    Some(Ok(event)) => {
                        self.state.apply_event(&event);
                        if self.state.tree.is_finished() {
                            stream = None;
                            self.fetch_instance_state().await;
                        }
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "deploy event stream failed");
                        self.state.stream_ended(Some(&e));
                        stream = None;
                    }
                    None => {
                        self.state.stream_ended(None);
                        stream = None;
                    }
                },

                Some(event) = keys.recv() => {
                    if let Event::Key(key) = event {
                        if handle_key_event(key, &mut self.state) == Action::Quit {
                            self.state.should_quit = true;
                        }
                    }
                }

                _ = ticker.tick() => self.state.tick(),
            }

            if self.state.should_quit {
                break;
            }
        }

        Ok(())
    }

    async fn fetch_instance_state(&mut self) {
        let Some(root) = self.state.tree.root_instance_id().map(str::to_string) else {
            return;
        };
        match self.engine.get_blueprint_instance(&root).await {
            Ok(instance) => self.state.tree.attach_instance_state(instance),
            Err(e) => debug!(error = %e, "instance state unavailable"),
        }
    }

    fn render(&mut self, frame: &mut Frame) {
        draw(frame, &mut self.state, &self.theme, self.config.list_width_pct);
    }
}

/// Lay out and render the whole screen
pub fn draw(frame: &mut Frame, state: &mut AppState, theme: &DeployTheme, list_width_pct: u16) {
    let area = frame.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(5),    // Body
            Constraint::Length(1), // Footer
        ])
        .split(area);

    match state.mode {
        ViewMode::Items => {
            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Percentage(list_width_pct),
                    Constraint::Percentage(100 - list_width_pct.min(100)),
                ])
                .split(main_chunks[1]);
            let right = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(5), Constraint::Length(ACTIVITY_HEIGHT)])
                .split(body[1]);

            state.ensure_visible(body[0].height.saturating_sub(2) as usize);

            frame.render_widget(ItemList::new(state, theme), body[0]);
            frame.render_widget(Details::new(state, theme), right[0]);
            frame.render_widget(ActivityLog::new(state, theme), right[1]);
        }
        ViewMode::Overview => {
            frame.render_widget(Overview::new(state, theme), main_chunks[1]);
        }
    }

    frame.render_widget(Header::new(state, theme), main_chunks[0]);
    frame.render_widget(Footer::new(state, theme), main_chunks[2]);

    if state.show_help {
        frame.render_widget(HelpOverlay::new(theme), area);
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().map_err(|e| DeployViewError::Terminal(e.to_string()))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Next engine event; pends forever once the stream is gone
async fn next_event(stream: &mut Option<DeployEventStream>) -> Option<Result<DeployEvent>> {
    match stream {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

/// Blocking crossterm reads forwarded onto a channel the loop can select on
fn read_events() -> UnboundedReceiver<Event> {
    let (event_tx, event_rx) = unbounded_channel();

    std::thread::spawn(move || loop {
        if let Ok(event) = crossterm::event::read() {
            if event_tx.send(event).is_err() {
                break;
            }
        }
    });

    event_rx
}
