//! Help Overlay - keybinding reference drawn over the body

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use super::utils::centered_rect;
use crate::tui::theme::DeployTheme;

const BINDINGS: &[(&str, &str)] = &[
    ("↑ / k", "previous item"),
    ("↓ / j", "next item"),
    ("g / G", "first / last item"),
    ("Enter / → / l", "open child blueprint"),
    ("Esc / ← / h / Backspace", "back to parent blueprint"),
    ("PgUp / PgDn", "scroll details"),
    ("o", "toggle deployment overview"),
    ("?", "toggle this help"),
    ("q / Ctrl+C", "quit"),
];

pub struct HelpOverlay<'a> {
    theme: &'a DeployTheme,
}

impl<'a> HelpOverlay<'a> {
    pub fn new(theme: &'a DeployTheme) -> Self {
        Self { theme }
    }
}

impl Widget for HelpOverlay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let popup = centered_rect(60, 60, area);
        Clear.render(popup, buf);

        let mut lines = vec![Line::default()];
        lines.extend(BINDINGS.iter().map(|(keys, description)| {
            Line::from(vec![
                Span::styled(format!("  {:<26}", keys), self.theme.accent()),
                Span::styled(*description, self.theme.text()),
            ])
        }));

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border(true))
            .style(self.theme.overlay())
            .title(Span::styled(" HELP ", self.theme.header()));
        Paragraph::new(lines).block(block).render(popup, buf);
    }
}
