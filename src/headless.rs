//! Headless mode - plain text deployment log
//!
//! Used when stdout is not a terminal (CI logs, pipes) or when asked for.
//! One line per update:
//!
//! ```text
//! [14:02:11] resource ordersTable created (6.4s)
//! [14:02:12] child    networking deploying
//! [14:02:15] link     apiGateway::processOrderFn create failed
//!     ↳ AccessDenied: not authorized
//! ```
//!
//! followed by a summary block once the deployment finishes.

use std::io::Write;

use colored::{Color, Colorize};
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::config::HeadlessConfig;
use crate::deploy::{format_duration_ms, DeployItem, DeployTree, KindCounts, TreeChange};
use crate::engine::DeployEngine;
use crate::error::{DeployViewError, Result};
use crate::event::StatusClass;

/// Writes deployment progress as text lines
pub struct HeadlessPrinter<W: Write> {
    out: W,
    color: bool,
    timestamps: bool,
}

impl<W: Write> HeadlessPrinter<W> {
    pub fn new(out: W, config: &HeadlessConfig) -> Self {
        Self {
            out,
            color: config.color,
            timestamps: config.timestamps,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, text: &str, class: StatusClass) -> String {
        if !self.color {
            return text.to_string();
        }
        text.color(class_color(class)).to_string()
    }

    fn dim(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn prefix(&self, timestamp: Option<i64>) -> String {
        if !self.timestamps {
            return String::new();
        }
        let clock = timestamp
            .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
            .map(|t| t.with_timezone(&chrono::Local).format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "--:--:--".to_string());
        format!("{} ", self.dim(&format!("[{}]", clock)))
    }

    /// Print one tree change
    pub fn print_change(&mut self, tree: &DeployTree, change: &TreeChange) -> Result<()> {
        match change {
            TreeChange::Item { id, .. } => {
                if let Some(item) = tree.item(*id) {
                    self.print_item(item)?;
                }
            }
            TreeChange::Instance { status, timestamp } => {
                let line = format!(
                    "{}{:<8} {} {}",
                    self.prefix((*timestamp > 0).then_some(*timestamp)),
                    "instance",
                    tree.display_name(),
                    self.paint(status.label(), status.class()),
                );
                writeln!(self.out, "{}", line)?;
            }
            TreeChange::Finished => {
                if let Some(finish) = tree.finish() {
                    let line = format!(
                        "{}{:<8} {} {}",
                        self.prefix(Some(finish.finish_timestamp)),
                        "instance",
                        tree.display_name(),
                        self.paint(finish.status.label(), finish.status.class()),
                    );
                    writeln!(self.out, "{}", line)?;
                }
            }
        }
        Ok(())
    }

    fn print_item(&mut self, item: &DeployItem) -> Result<()> {
        let duration = item
            .total_duration_ms()
            .filter(|_| item.class().is_terminal())
            .map(|ms| format!(" ({})", format_duration_ms(ms)))
            .unwrap_or_default();
        let attempt = if item.attempt > 1 && !item.class().is_terminal() {
            self.dim(&format!(" attempt {}", item.attempt))
        } else {
            String::new()
        };
        let line = format!(
            "{}{:<8} {} {}{}{}",
            self.prefix(item.last_update),
            item.kind.label(),
            item.path,
            self.paint(item.status_label(), item.class()),
            attempt,
            self.dim(&duration),
        );
        writeln!(self.out, "{}", line)?;
        for reason in &item.failure_reasons {
            writeln!(self.out, "    ↳ {}", reason)?;
        }
        Ok(())
    }

    /// Print the closing summary block
    pub fn print_summary(&mut self, tree: &DeployTree) -> Result<()> {
        writeln!(self.out)?;
        let status = match tree.finish() {
            Some(finish) => self.paint(finish.status.label(), finish.status.class()),
            None => self.paint("did not finish", StatusClass::Interrupted),
        };
        let elapsed = tree
            .elapsed_ms()
            .map(|ms| format!(" in {}", format_duration_ms(ms)))
            .unwrap_or_default();
        writeln!(
            self.out,
            "{} {}{}",
            self.bold(&format!("Deployment {}", tree.display_name())),
            status,
            elapsed
        )?;

        let summary = tree.summary();
        for (label, counts) in [
            ("resources", &summary.resources),
            ("children", &summary.children),
            ("links", &summary.links),
        ] {
            if counts.total() > 0 {
                writeln!(self.out, "  {:<10} {}", label, self.describe_counts(counts))?;
            }
        }

        if let Some(finish) = tree.finish() {
            for reason in &finish.failure_reasons {
                writeln!(self.out, "  ↳ {}", reason)?;
            }
        }

        let failures = tree.failures();
        if !failures.is_empty() {
            writeln!(self.out)?;
            writeln!(self.out, "{}", self.bold("Failures:"))?;
            for item in failures {
                writeln!(
                    self.out,
                    "  {} {}: {}",
                    item.kind.label(),
                    item.path,
                    self.paint(item.status_label(), item.class())
                )?;
                for reason in &item.failure_reasons {
                    writeln!(self.out, "    ↳ {}", reason)?;
                }
            }
        }

        if let Some(state) = tree.instance_state() {
            if !state.exports.is_empty() {
                writeln!(self.out)?;
                writeln!(self.out, "{}", self.bold("Exports:"))?;
                for (name, value) in &state.exports {
                    writeln!(self.out, "  {} = {}", name, value)?;
                }
            }
        }

        if tree.pending_events() > 0 {
            writeln!(
                self.out,
                "{}",
                self.dim(&format!(
                    "{} event(s) for unknown instances were never placed",
                    tree.pending_events()
                ))
            )?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn describe_counts(&self, counts: &KindCounts) -> String {
        let parts: Vec<String> = [
            (counts.succeeded, "succeeded", StatusClass::Succeeded),
            (counts.failed, "failed", StatusClass::Failed),
            (counts.interrupted, "interrupted", StatusClass::Interrupted),
            (counts.rolled_back, "rolled back", StatusClass::RolledBack),
            (counts.rollback_failed, "rollback failed", StatusClass::RollbackFailed),
            (counts.in_progress, "in progress", StatusClass::InProgress),
            (counts.pending, "pending", StatusClass::Pending),
            (counts.skipped, "skipped", StatusClass::Pending),
            (counts.no_change, "no change", StatusClass::Pending),
        ]
        .into_iter()
        .filter(|(n, _, _)| *n > 0)
        .map(|(n, label, class)| self.paint(&format!("{} {}", n, label), class))
        .collect();
        parts.join(", ")
    }
}

fn class_color(class: StatusClass) -> Color {
    match class {
        StatusClass::Pending => Color::BrightBlack,
        StatusClass::InProgress => Color::Cyan,
        StatusClass::Succeeded => Color::Green,
        StatusClass::Failed | StatusClass::RollbackFailed => Color::Red,
        StatusClass::Interrupted => Color::Yellow,
        StatusClass::RollingBack | StatusClass::RolledBack => Color::Magenta,
    }
}

/// Drive a deployment stream to completion, printing as it goes.
///
/// Returns the final tree; check [`DeployTree::succeeded`] for the outcome.
/// A stream that ends before the root instance finishes is a
/// [`DeployViewError::StreamClosed`] (the partial summary is still printed).
pub async fn run_headless<W: Write>(
    engine: &dyn DeployEngine,
    mut tree: DeployTree,
    config: &HeadlessConfig,
    out: W,
) -> Result<DeployTree> {
    let mut printer = HeadlessPrinter::new(out, config);
    let instance_id = tree.root_instance_id().map(str::to_string);
    let mut stream = engine.stream_deploy_events(instance_id.as_deref()).await?;
    info!(instance = ?instance_id, "streaming deploy events");

    while let Some(event) = stream.next().await {
        let event = event?;
        debug!(event = %event.description(), "event");
        for change in tree.apply(&event) {
            printer.print_change(&tree, &change)?;
        }
        if tree.is_finished() {
            break;
        }
    }

    if !tree.is_finished() {
        warn!("event stream ended before the deployment finished");
        printer.print_summary(&tree)?;
        return Err(DeployViewError::StreamClosed);
    }

    if let Some(root) = tree.root_instance_id().map(str::to_string) {
        match engine.get_blueprint_instance(&root).await {
            Ok(state) => tree.attach_instance_state(state),
            Err(e) => debug!(error = %e, "instance state unavailable"),
        }
    }

    printer.print_summary(&tree)?;
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changeset::Action;
    use crate::deploy::ItemKind;
    use crate::engine::{demo_changeset, MockEngine, DEMO_INSTANCE_ID};
    use std::time::Duration;

    fn plain() -> HeadlessConfig {
        HeadlessConfig {
            always: true,
            color: false,
            timestamps: false,
        }
    }

    fn output(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_item_line_format() {
        let mut tree = DeployTree::new(Some("i-1".into()));
        let event: crate::event::DeployEvent = serde_json::from_str(
            r#"{"type":"resource","instance_id":"i-1","resource_name":"api","status":"create_failed",
                "failure_reasons":["quota exceeded"],"durations":{"total_ms":1500},"update_timestamp":1}"#,
        )
        .unwrap();
        let changes = tree.apply(&event);

        let mut printer = HeadlessPrinter::new(Vec::new(), &plain());
        printer.print_change(&tree, &changes[0]).unwrap();
        assert_eq!(
            output(printer.into_inner()),
            "resource api create failed (1.5s)\n    ↳ quota exceeded\n"
        );
    }

    #[test]
    fn test_timestamp_prefix() {
        let config = HeadlessConfig {
            timestamps: true,
            ..plain()
        };
        let printer = HeadlessPrinter::new(Vec::new(), &config);
        let prefix = printer.prefix(None);
        assert_eq!(prefix, "[--:--:--] ");
        assert_eq!(printer.prefix(Some(1_700_000_000)).len(), "[00:00:00] ".len());
    }

    #[test]
    fn test_instance_line_uses_event_timestamp() {
        let config = HeadlessConfig {
            timestamps: true,
            ..plain()
        };
        let mut tree = DeployTree::new(Some("i-1".into()));
        let event: crate::event::DeployEvent = serde_json::from_str(
            r#"{"type":"instance","instance_id":"i-1","status":"deploying","update_timestamp":1700000000}"#,
        )
        .unwrap();
        let changes = tree.apply(&event);

        let mut printer = HeadlessPrinter::new(Vec::new(), &config);
        printer.print_change(&tree, &changes[0]).unwrap();
        let line = output(printer.into_inner());
        assert!(!line.starts_with("[--:--:--]"), "{}", line);
        assert!(line.ends_with("instance i-1 deploying\n"));
    }

    #[test]
    fn test_event_without_timestamp_prints_no_clock() {
        let config = HeadlessConfig {
            timestamps: true,
            ..plain()
        };
        let mut tree = DeployTree::new(Some("i-1".into()));
        let event: crate::event::DeployEvent = serde_json::from_str(
            r#"{"type":"resource","instance_id":"i-1","resource_name":"api","status":"creating"}"#,
        )
        .unwrap();
        let changes = tree.apply(&event);

        let mut printer = HeadlessPrinter::new(Vec::new(), &config);
        printer.print_change(&tree, &changes[0]).unwrap();
        assert_eq!(output(printer.into_inner()), "[--:--:--] resource api creating\n");
    }

    #[test]
    fn test_summary_for_unfinished_tree() {
        let tree = DeployTree::from_changeset(Some("i-1".into()), &demo_changeset());
        let mut printer = HeadlessPrinter::new(Vec::new(), &plain());
        printer.print_summary(&tree).unwrap();
        let text = output(printer.into_inner());
        assert!(text.contains("Deployment i-1 did not finish"));
        assert!(text.contains("resources  8 pending, 1 no change"));
        assert!(tree.get(ItemKind::Resource, "ordersRole").unwrap().action == Action::NoChange);
    }

    #[tokio::test]
    async fn test_run_headless_successful_demo() {
        let engine = MockEngine::new().with_pace(Duration::ZERO);
        let tree = DeployTree::from_changeset(Some(DEMO_INSTANCE_ID.into()), &demo_changeset());

        let mut out = Vec::new();
        let tree = run_headless(&engine, tree, &plain(), &mut out).await.unwrap();
        let text = output(out);

        assert!(tree.succeeded());
        assert!(text.contains("resource ordersTable created (6.4s)"));
        assert!(text.contains("resource networking/dns/hostedZone created"));
        assert!(text.contains("resource processOrderFn creating attempt 2"));
        assert!(text.contains("Deployment orders-api deployed"));
        assert!(text.contains("Exports:\n  apiUrl = \"https://api.orders.example.com/v2\""));
        assert!(!text.contains("Failures:"));
    }

    #[tokio::test]
    async fn test_run_headless_failed_demo() {
        let engine = MockEngine::new().with_pace(Duration::ZERO).with_failure(true);
        let tree = DeployTree::from_changeset(Some(DEMO_INSTANCE_ID.into()), &demo_changeset());

        let mut out = Vec::new();
        let tree = run_headless(&engine, tree, &plain(), &mut out).await.unwrap();
        let text = output(out);

        assert!(!tree.succeeded());
        assert!(text.contains("Failures:\n  resource apiGateway: update failed"));
        assert!(text.contains("↳ AccessDenied"));
        assert!(text.contains("skipped"));
    }
}
