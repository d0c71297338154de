//! TUI Module - interactive deployment view
//!
//! Architecture:
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        UI LAYER (widgets/)                          │
//! │  Pure rendering. Header, item list, details, activity, overview.    │
//! └─────────────────────────────────────────────────────────────────────┘
//!                               ▲
//!                               │ &AppState
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                 DOMAIN LAYER (state.rs, events.rs)                  │
//! │  Navigation over the DeployTree. Keys → Actions, events → tree.     │
//! └─────────────────────────────────────────────────────────────────────┘
//!                               ▲
//!                               │ DeployEvent stream
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                  CONNECTOR LAYER (crate::engine)                    │
//! │  DeployEngine trait. MockEngine + ReplayEngine.                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

mod app;
mod events;
mod state;
mod theme;

pub mod widgets;

pub use app::{draw, TuiApp};
pub use events::{handle_key_event, Action};
pub use state::{ActivityEvent, AppState, StreamStatus, ViewMode};
pub use theme::{icons, DeployTheme};

use std::sync::Arc;

use crate::config::UiConfig;
use crate::deploy::DeployTree;
use crate::engine::DeployEngine;
use crate::error::Result;

/// Run the interactive view until the user quits
pub async fn run(
    engine: Arc<dyn DeployEngine>,
    tree: DeployTree,
    config: UiConfig,
) -> Result<DeployTree> {
    TuiApp::new(engine, tree, config).run().await
}
