//! Footer Widget - key hints for the current mode

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::tui::state::{AppState, ViewMode};
use crate::tui::theme::DeployTheme;

pub struct Footer<'a> {
    state: &'a AppState,
    theme: &'a DeployTheme,
}

impl<'a> Footer<'a> {
    pub fn new(state: &'a AppState, theme: &'a DeployTheme) -> Self {
        Self { state, theme }
    }

    fn hints(&self) -> &'static [(&'static str, &'static str)] {
        match self.state.mode {
            ViewMode::Items => &[
                ("[↑↓]", " select  "),
                ("[Enter]", " open  "),
                ("[Esc]", " back  "),
                ("[PgUp/PgDn]", " scroll  "),
                ("[o]", "verview  "),
                ("[?]", " help  "),
                ("[q]", "uit"),
            ],
            ViewMode::Overview => &[
                ("[o]", " items  "),
                ("[PgUp/PgDn]", " scroll  "),
                ("[?]", " help  "),
                ("[q]", "uit"),
            ],
        }
    }
}

impl Widget for Footer<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans = vec![Span::raw(" ")];
        for (key, label) in self.hints() {
            spans.push(Span::styled(*key, self.theme.accent()));
            spans.push(Span::styled(*label, self.theme.dimmed()));
        }
        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}
