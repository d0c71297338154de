//! Activity Widget - most recent updates first

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use super::utils::truncate;
use crate::tui::state::AppState;
use crate::tui::theme::{icons, DeployTheme};

pub struct ActivityLog<'a> {
    state: &'a AppState,
    theme: &'a DeployTheme,
}

impl<'a> ActivityLog<'a> {
    pub fn new(state: &'a AppState, theme: &'a DeployTheme) -> Self {
        Self { state, theme }
    }
}

impl Widget for ActivityLog<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border(false))
            .title(Span::styled(" ACTIVITY ", self.theme.header()));
        let inner = block.inner(area);
        let width = inner.width.saturating_sub(10) as usize;

        let lines: Vec<Line> = self
            .state
            .activity
            .iter()
            .take(inner.height as usize)
            .map(|event| {
                let age = event.timestamp.elapsed().as_secs();
                Line::from(vec![
                    Span::styled(format!("{:>4}s ", age), self.theme.dimmed()),
                    Span::styled(icons::status(event.class, 0), self.theme.status(event.class)),
                    Span::raw(" "),
                    Span::styled(truncate(&event.message, width), self.theme.text()),
                ])
            })
            .collect();

        Paragraph::new(lines).block(block).render(area, buf);
    }
}
