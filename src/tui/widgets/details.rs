//! Details Widget - everything known about the selected item
//!
//! Sections, top to bottom: identity, status and timing, failure reasons,
//! planned field changes, child blueprint totals, resolved spec data.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use serde_json::Value;

use crate::changeset::{Action, FieldChange};
use crate::deploy::{format_duration_ms, DeployItem, ItemDurations, ItemKind};
use crate::tui::state::AppState;
use crate::tui::theme::DeployTheme;

pub struct Details<'a> {
    state: &'a AppState,
    theme: &'a DeployTheme,
}

impl<'a> Details<'a> {
    pub fn new(state: &'a AppState, theme: &'a DeployTheme) -> Self {
        Self { state, theme }
    }

    fn field(&self, label: &str, value: impl Into<String>) -> Line<'static> {
        Line::from(vec![
            Span::styled(format!("{:<14}", label), self.theme.dimmed()),
            Span::styled(value.into(), self.theme.text()),
        ])
    }

    fn section(&self, title: &str) -> Line<'static> {
        Line::from(Span::styled(
            title.to_string(),
            self.theme.accent().add_modifier(Modifier::BOLD),
        ))
    }

    /// Render lines for one item
    pub fn lines(&self, item: &DeployItem) -> Vec<Line<'static>> {
        let class = item.class();
        let mut lines = vec![
            Line::from(vec![
                Span::styled(format!("{} ", item.kind.label()), self.theme.dimmed()),
                Span::styled(item.name.clone(), self.theme.highlight()),
            ]),
            Line::default(),
            self.field("path", item.path.clone()),
            Line::from(vec![
                Span::styled(format!("{:<14}", "action"), self.theme.dimmed()),
                Span::styled(
                    format!("{} {}", item.action.symbol(), item.action.label()),
                    self.theme.action(item.action),
                ),
                Span::styled(
                    if item.from_changeset { "" } else { "  (not in changeset)" },
                    self.theme.dimmed(),
                ),
            ]),
        ];

        let mut status = vec![
            Span::styled(format!("{:<14}", "status"), self.theme.dimmed()),
            Span::styled(item.status_label(), self.theme.status(class)),
        ];
        if let Some(precise) = item.status.precise_label() {
            status.push(Span::styled(format!(" ({})", precise), self.theme.dimmed()));
        }
        if item.interrupted {
            status.push(Span::styled(" - deployment ended", self.theme.dimmed()));
        }
        lines.push(Line::from(status));

        if let Some((a, b)) = item.link_endpoints() {
            lines.push(self.field("resource A", a));
            lines.push(self.field("resource B", b));
        }
        if let Some(id) = &item.element_id {
            let label = match item.kind {
                ItemKind::Resource => "resource id",
                ItemKind::Child => "instance id",
                ItemKind::Link => "link id",
            };
            lines.push(self.field(label, id.clone()));
        }
        if let Some(resource_type) = &item.resource_type {
            lines.push(self.field("type", resource_type.clone()));
        }
        if let Some(group) = item.group {
            lines.push(self.field("group", group.to_string()));
        }
        if item.attempt > 1 || item.can_retry {
            let retry = if item.can_retry { " (retryable)" } else { "" };
            lines.push(self.field("attempt", format!("{}{}", item.attempt, retry)));
        }
        if let Some(ts) = item.last_update {
            if let Some(time) = chrono::DateTime::from_timestamp(ts, 0) {
                let local = time.with_timezone(&chrono::Local);
                lines.push(self.field("last update", local.format("%H:%M:%S").to_string()));
            }
        }

        self.push_durations(item, &mut lines);

        if !item.failure_reasons.is_empty() {
            lines.push(Line::default());
            lines.push(self.section("Failure reasons"));
            for reason in &item.failure_reasons {
                lines.push(Line::from(Span::styled(
                    format!("  • {}", reason),
                    self.theme.error(),
                )));
            }
        }

        if item.has_field_changes() {
            lines.push(Line::default());
            lines.push(self.section("Changes"));
            for change in &item.modified_fields {
                lines.push(self.change_line("~", change, true));
            }
            for change in &item.new_fields {
                lines.push(self.change_line("+", change, false));
            }
            for path in &item.removed_fields {
                lines.push(Line::from(vec![
                    Span::styled("  - ", self.theme.action(Action::Delete)),
                    Span::styled(path.clone(), self.theme.text()),
                ]));
            }
        }

        if item.kind == ItemKind::Child {
            let summary = self.state.tree.subtree_summary(&item.path);
            lines.push(Line::default());
            lines.push(self.section("Blueprint"));
            for (label, counts) in [
                ("resources", summary.resources),
                ("children", summary.children),
                ("links", summary.links),
            ] {
                if counts.total() == 0 {
                    continue;
                }
                lines.push(self.field(
                    label,
                    format!(
                        "{} total, {} succeeded, {} failed, {} in progress",
                        counts.total(),
                        counts.succeeded,
                        counts.failures(),
                        counts.in_progress
                    ),
                ));
            }
            lines.push(Line::from(Span::styled(
                "  enter to open",
                self.theme.dimmed(),
            )));
        }

        if let Some(spec) = &item.spec_data {
            lines.push(Line::default());
            lines.push(self.section("Spec"));
            let pretty = serde_json::to_string_pretty(spec).unwrap_or_else(|_| spec.to_string());
            for line in pretty.lines() {
                lines.push(Line::from(Span::styled(
                    format!("  {}", line),
                    self.theme.text(),
                )));
            }
        }

        lines
    }

    fn push_durations(&self, item: &DeployItem, lines: &mut Vec<Line<'static>>) {
        let Some(durations) = &item.durations else {
            return;
        };
        if let Some(total) = durations.total_ms() {
            lines.push(self.field("duration", format_duration_ms(total)));
        }
        match durations {
            ItemDurations::Resource(d) => {
                if let Some(ms) = d.config_complete_ms {
                    lines.push(self.field("config done", format_duration_ms(ms)));
                }
                if d.attempt_ms.len() > 1 {
                    let attempts: Vec<String> =
                        d.attempt_ms.iter().map(|ms| format_duration_ms(*ms)).collect();
                    lines.push(self.field("attempts", attempts.join(", ")));
                }
            }
            ItemDurations::Child(d) => {
                if let Some(ms) = d.prepare_ms {
                    lines.push(self.field("prepare", format_duration_ms(ms)));
                }
            }
            ItemDurations::Link(d) => {
                for (label, stage) in [
                    ("resource A", &d.resource_a_update),
                    ("resource B", &d.resource_b_update),
                    ("intermediary", &d.intermediary_resources),
                ] {
                    if let Some(ms) = stage.as_ref().and_then(|s| s.total_ms) {
                        lines.push(self.field(label, format_duration_ms(ms)));
                    }
                }
            }
        }
    }

    fn change_line(&self, symbol: &str, change: &FieldChange, show_prev: bool) -> Line<'static> {
        let action = if symbol == "~" {
            Action::Update
        } else {
            Action::Create
        };
        let mut spans = vec![
            Span::styled(format!("  {} ", symbol), self.theme.action(action)),
            Span::styled(change.field_path.clone(), self.theme.text()),
        ];
        if show_prev {
            spans.push(Span::styled(
                format!(": {} → ", display_value(change.prev_value.as_ref())),
                self.theme.dimmed(),
            ));
        } else {
            spans.push(Span::styled(": ", self.theme.dimmed()));
        }
        spans.push(Span::styled(
            display_value(change.new_value.as_ref()),
            self.theme.text(),
        ));
        if change.must_recreate {
            spans.push(Span::styled(" (recreate)", self.theme.error()));
        }
        Line::from(spans)
    }
}

/// Compact JSON for field values; unknown values show as `(known on deploy)`
fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "(known on deploy)".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

impl Widget for Details<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border(false))
            .title(Span::styled(" DETAILS ", self.theme.header()));

        let lines = match self.state.selected_item() {
            Some(item) => self.lines(item),
            None => vec![Line::from(Span::styled(
                "nothing selected",
                self.theme.dimmed(),
            ))],
        };

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((self.state.detail_scroll, 0))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(None), "(known on deploy)");
        assert_eq!(display_value(Some(&json!("v2"))), "v2");
        assert_eq!(display_value(Some(&json!(512))), "512");
    }
}
