//! Item List Widget
//!
//! Items of the current blueprint level, one per row:
//!
//! ```text
//! ✔ + ordersTable              created
//! ⠹ ~ apiGateway               updating
//! ○ + networking ▸             pending
//! ```
//!
//! The block title carries the breadcrumbs of the levels drilled into.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use super::utils::truncate;
use crate::deploy::{DeployItem, ItemKind};
use crate::tui::state::AppState;
use crate::tui::theme::{icons, DeployTheme};

pub struct ItemList<'a> {
    state: &'a AppState,
    theme: &'a DeployTheme,
}

impl<'a> ItemList<'a> {
    pub fn new(state: &'a AppState, theme: &'a DeployTheme) -> Self {
        Self { state, theme }
    }

    fn row(&self, item: &DeployItem, width: usize, selected: bool) -> Line<'static> {
        let icon = if item.skipped {
            icons::SKIPPED
        } else {
            icons::status(item.class(), self.state.frame)
        };
        let status = item.status_label();
        let marker = if item.kind == ItemKind::Child {
            format!(" {}", icons::CHILD)
        } else {
            String::new()
        };

        // icon + space + symbol + space + name + marker + gap + status
        let fixed = 4 + marker.chars().count() + 1 + status.chars().count();
        let name_width = width.saturating_sub(fixed).max(4);
        let name = truncate(&item.name, name_width);
        let pad = name_width.saturating_sub(name.chars().count());

        let mut spans = vec![
            Span::styled(icon, self.theme.status(item.class())),
            Span::raw(" "),
            Span::styled(item.action.symbol(), self.theme.action(item.action)),
            Span::raw(" "),
            Span::styled(name, self.theme.text()),
            Span::styled(marker, self.theme.dimmed()),
            Span::raw(" ".repeat(pad + 1)),
            Span::styled(status, self.theme.status(item.class())),
        ];
        if selected {
            let style = self.theme.selected();
            spans = spans
                .into_iter()
                .map(|span| {
                    let patched = span.style.patch(style);
                    span.style(patched)
                })
                .collect();
        }
        Line::from(spans)
    }
}

impl Widget for ItemList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let crumbs = self.state.breadcrumbs().join(icons::BREADCRUMB_SEP);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border(true))
            .title(Span::styled(format!(" {} ", crumbs), self.theme.header()));

        let inner = block.inner(area);
        let height = inner.height as usize;
        let width = inner.width as usize;

        let level = self.state.level();
        let lines: Vec<Line> = if level.is_empty() {
            vec![Line::from(Span::styled(
                "  waiting for deploy events...",
                self.theme.dimmed(),
            ))]
        } else {
            level
                .iter()
                .skip(self.state.list_offset)
                .take(height)
                .filter_map(|&id| {
                    let item = self.state.tree.item(id)?;
                    Some(self.row(item, width, self.state.selected == Some(id)))
                })
                .collect()
        };

        Paragraph::new(lines).block(block).render(area, buf);
    }
}
