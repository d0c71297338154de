//! Header Widget - deployment name, root status, clock and progress

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use super::utils::{format_duration, progress_bar};
use crate::tui::state::{AppState, StreamStatus};
use crate::tui::theme::DeployTheme;

pub struct Header<'a> {
    state: &'a AppState,
    theme: &'a DeployTheme,
}

impl<'a> Header<'a> {
    pub fn new(state: &'a AppState, theme: &'a DeployTheme) -> Self {
        Self { state, theme }
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let tree = &self.state.tree;
        let status = tree.root_status();
        let (done, total) = tree.progress();

        let stream_style = match self.state.stream {
            StreamStatus::Failed(_) | StreamStatus::Closed => self.theme.error(),
            StreamStatus::Finished => self.theme.dimmed(),
            _ => self.theme.highlight(),
        };

        let line = Line::from(vec![
            Span::styled(tree.display_name().to_string(), self.theme.accent()),
            Span::raw("  │  "),
            Span::styled(status.label(), self.theme.status(status.class())),
            Span::raw("  │  "),
            Span::styled(
                format!("⏱ {}", format_duration(self.state.elapsed.as_secs())),
                self.theme.text(),
            ),
            Span::raw("  │  "),
            Span::styled(progress_bar(done, total, 12), self.theme.accent()),
            Span::styled(format!(" {}/{}", done, total), self.theme.text()),
            Span::raw("  │  "),
            Span::styled(self.state.stream.label().to_string(), stream_style),
        ]);

        let title = if status.is_destroy() {
            " DESTROY "
        } else {
            " DEPLOY "
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border(false))
            .title(Span::styled(title, self.theme.header()));

        Paragraph::new(line).block(block).render(area, buf);
    }
}
