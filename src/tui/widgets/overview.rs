//! Overview Widget - deployment-wide outcome
//!
//! Shown instead of the item panes when toggled with `o`. Once the
//! deployment has finished this is the place to read failure reasons
//! across every level and the exported values of the instance.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::deploy::{format_duration_ms, ItemKind, KindCounts};
use crate::tui::state::AppState;
use crate::tui::theme::{icons, DeployTheme};

pub struct Overview<'a> {
    state: &'a AppState,
    theme: &'a DeployTheme,
}

impl<'a> Overview<'a> {
    pub fn new(state: &'a AppState, theme: &'a DeployTheme) -> Self {
        Self { state, theme }
    }

    fn section(&self, title: &str) -> Line<'static> {
        Line::from(Span::styled(
            title.to_string(),
            self.theme.accent().add_modifier(Modifier::BOLD),
        ))
    }

    fn counts_line(&self, label: &str, counts: &KindCounts) -> Line<'static> {
        let mut parts = Vec::new();
        for (n, word) in [
            (counts.succeeded, "succeeded"),
            (counts.failed, "failed"),
            (counts.rollback_failed, "rollback failed"),
            (counts.rolled_back, "rolled back"),
            (counts.interrupted, "interrupted"),
            (counts.in_progress, "in progress"),
            (counts.pending, "pending"),
            (counts.skipped, "skipped"),
            (counts.no_change, "no change"),
        ] {
            if n > 0 {
                parts.push(format!("{} {}", n, word));
            }
        }
        let style = if counts.failures() > 0 {
            self.theme.error()
        } else {
            self.theme.text()
        };
        Line::from(vec![
            Span::styled(format!("  {:<12}", label), self.theme.dimmed()),
            Span::styled(parts.join(", "), style),
        ])
    }

    pub fn lines(&self) -> Vec<Line<'static>> {
        let tree = &self.state.tree;
        let status = tree.root_status();
        let mut lines = Vec::new();

        let mut headline = vec![
            Span::styled(tree.display_name().to_string(), self.theme.highlight()),
            Span::raw("  "),
            Span::styled(status.label(), self.theme.status(status.class())),
        ];
        if let Some(ms) = tree.elapsed_ms() {
            headline.push(Span::styled(
                format!("  in {}", format_duration_ms(ms)),
                self.theme.dimmed(),
            ));
        }
        lines.push(Line::from(headline));

        if let Some(finish) = tree.finish() {
            for reason in &finish.failure_reasons {
                lines.push(Line::from(Span::styled(
                    format!("  ↳ {}", reason),
                    self.theme.error(),
                )));
            }
        } else {
            lines.push(Line::from(Span::styled(
                "  deployment still running",
                self.theme.dimmed(),
            )));
        }

        lines.push(Line::default());
        lines.push(self.section("Items"));
        let summary = tree.summary();
        for (label, kind) in [
            ("resources", ItemKind::Resource),
            ("children", ItemKind::Child),
            ("links", ItemKind::Link),
        ] {
            let counts = summary.kind(kind);
            if counts.total() > 0 {
                lines.push(self.counts_line(label, counts));
            }
        }

        let failures = tree.failures();
        if !failures.is_empty() {
            lines.push(Line::default());
            lines.push(self.section("Failures"));
            for item in failures {
                let class = item.class();
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("  {} ", icons::status(class, 0)),
                        self.theme.status(class),
                    ),
                    Span::styled(format!("{} ", item.kind.label()), self.theme.dimmed()),
                    Span::styled(item.path.clone(), self.theme.text()),
                    Span::styled(format!("  {}", item.status_label()), self.theme.status(class)),
                ]));
                for reason in &item.failure_reasons {
                    lines.push(Line::from(Span::styled(
                        format!("      ↳ {}", reason),
                        self.theme.error(),
                    )));
                }
            }
        }

        if let Some(state) = tree.instance_state() {
            if !state.exports.is_empty() {
                lines.push(Line::default());
                lines.push(self.section("Exports"));
                for (name, value) in &state.exports {
                    let shown = match value {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    lines.push(Line::from(vec![
                        Span::styled(format!("  {:<16}", name), self.theme.dimmed()),
                        Span::styled(shown, self.theme.text()),
                    ]));
                }
            }
        }

        let pending = tree.pending_events();
        if pending > 0 {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                format!("  {} event(s) for unknown child instances were never placed", pending),
                self.theme.error(),
            )));
        }

        lines
    }
}

impl Widget for Overview<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border(true))
            .title(Span::styled(" OVERVIEW ", self.theme.header()));

        Paragraph::new(self.lines())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((self.state.detail_scroll, 0))
            .render(area, buf);
    }
}
