//! Deploy Theme - Visual Design System
//!
//! Dark palette with one colour per status class and per planned action.

use ratatui::style::{Color, Modifier, Style};

use crate::changeset::Action;
use crate::event::StatusClass;

/// Deploy view colour palette
pub struct DeployTheme {
    // Primary palette
    pub accent_violet: Color,
    pub amber_gold: Color,
    pub cyan_teal: Color,
    pub deep_space: Color,
    pub star_white: Color,

    // Status colors
    pub success_green: Color,
    pub warning_orange: Color,
    pub error_red: Color,
    pub rollback_magenta: Color,

    // Dimmed versions
    pub dim_gray: Color,
    pub dim_violet: Color,
}

impl Default for DeployTheme {
    fn default() -> Self {
        Self {
            accent_violet: Color::Rgb(138, 43, 226), // #8A2BE2
            amber_gold: Color::Rgb(255, 191, 0),     // #FFBF00
            cyan_teal: Color::Rgb(0, 200, 200),      // #00C8C8
            deep_space: Color::Rgb(13, 17, 23),      // #0D1117
            star_white: Color::Rgb(230, 237, 243),   // #E6EDF3

            success_green: Color::Rgb(63, 185, 80),    // #3FB950
            warning_orange: Color::Rgb(210, 153, 34),  // #D29922
            error_red: Color::Rgb(248, 81, 73),        // #F85149
            rollback_magenta: Color::Rgb(219, 97, 162), // #DB61A2

            dim_gray: Color::Rgb(128, 128, 128),
            dim_violet: Color::Rgb(88, 28, 143),
        }
    }
}

impl DeployTheme {
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Status / action colors
    // ─────────────────────────────────────────────────────────────────────

    pub fn status_color(&self, class: StatusClass) -> Color {
        match class {
            StatusClass::Pending => self.dim_gray,
            StatusClass::InProgress => self.cyan_teal,
            StatusClass::Succeeded => self.success_green,
            StatusClass::Failed | StatusClass::RollbackFailed => self.error_red,
            StatusClass::Interrupted => self.warning_orange,
            StatusClass::RollingBack | StatusClass::RolledBack => self.rollback_magenta,
        }
    }

    pub fn status(&self, class: StatusClass) -> Style {
        let style = Style::default().fg(self.status_color(class));
        if class.is_failure() {
            style.add_modifier(Modifier::BOLD)
        } else {
            style
        }
    }

    pub fn action(&self, action: Action) -> Style {
        let color = match action {
            Action::Create => self.success_green,
            Action::Update => self.amber_gold,
            Action::Delete => self.error_red,
            Action::Recreate => self.warning_orange,
            Action::NoChange => self.dim_gray,
        };
        Style::default().fg(color)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Styles
    // ─────────────────────────────────────────────────────────────────────

    pub fn text(&self) -> Style {
        Style::default().fg(self.star_white)
    }

    pub fn dimmed(&self) -> Style {
        Style::default().fg(self.dim_gray)
    }

    pub fn header(&self) -> Style {
        Style::default()
            .fg(self.accent_violet)
            .add_modifier(Modifier::BOLD)
    }

    pub fn accent(&self) -> Style {
        Style::default().fg(self.amber_gold)
    }

    pub fn highlight(&self) -> Style {
        Style::default()
            .fg(self.cyan_teal)
            .add_modifier(Modifier::BOLD)
    }

    /// Selected row in the item list
    pub fn selected(&self) -> Style {
        Style::default()
            .bg(self.dim_violet)
            .fg(self.star_white)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border(&self, focused: bool) -> Style {
        if focused {
            self.highlight()
        } else {
            Style::default().fg(self.accent_violet)
        }
    }

    pub fn error(&self) -> Style {
        Style::default()
            .fg(self.error_red)
            .add_modifier(Modifier::BOLD)
    }

    /// Background of popups drawn over the body
    pub fn overlay(&self) -> Style {
        Style::default().bg(self.deep_space)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Icons and Symbols
// ─────────────────────────────────────────────────────────────────────────────

/// UI Icons used throughout the TUI
pub mod icons {
    use crate::event::StatusClass;

    pub const PENDING: &str = "○";
    pub const SUCCESS: &str = "✔";
    pub const FAILED: &str = "✖";
    pub const INTERRUPTED: &str = "⚠";
    pub const ROLLING_BACK: &str = "↺";
    pub const ROLLED_BACK: &str = "↩";
    pub const SKIPPED: &str = "⊘";

    pub const CHILD: &str = "▸";
    pub const BREADCRUMB_SEP: &str = " › ";

    pub const BAR_FULL: char = '█';
    pub const BAR_EMPTY: char = '░';

    /// Spinner frames for items in progress
    pub const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

    /// Icon for a status class (`frame` drives the spinner)
    pub fn status(class: StatusClass, frame: usize) -> &'static str {
        match class {
            StatusClass::Pending => PENDING,
            StatusClass::InProgress => SPINNER_FRAMES[frame % SPINNER_FRAMES.len()],
            StatusClass::Succeeded => SUCCESS,
            StatusClass::Failed | StatusClass::RollbackFailed => FAILED,
            StatusClass::Interrupted => INTERRUPTED,
            StatusClass::RollingBack => ROLLING_BACK,
            StatusClass::RolledBack => ROLLED_BACK,
        }
    }
}
