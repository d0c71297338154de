//! deploy-view - watch blueprint deployments from the terminal
//!
//! A [`DeployTree`] is seeded from a changeset and driven by the event
//! stream of a [`DeployEngine`]. The tree is shown either as an
//! interactive split-pane view ([`tui`]) or as a plain line log
//! ([`headless`]).

pub mod changeset;
pub mod config;
pub mod deploy;
pub mod engine;
pub mod error;
pub mod event;
pub mod headless;
pub mod instance;
pub mod tui;

pub use changeset::{Action, BlueprintChanges};
pub use config::DeployViewConfig;
pub use deploy::{DeployItem, DeploySummary, DeployTree, ItemKind, TreeChange};
pub use engine::{DeployEngine, MockEngine, ReplayEngine};
pub use error::{DeployViewError, FixSuggestion, Result};
pub use event::{parse_event_line, parse_events, DeployEvent, StatusClass};
pub use headless::{run_headless, HeadlessPrinter};
pub use instance::InstanceState;
