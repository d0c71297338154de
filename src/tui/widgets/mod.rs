//! TUI Widgets - UI Components
//!
//! Each widget is a stateless renderer that borrows the AppState and theme
//! and produces Ratatui primitives. Navigation logic stays in state.rs.

mod activity;
mod details;
mod footer;
mod header;
mod help;
mod item_list;
mod overview;

pub use activity::ActivityLog;
pub use details::Details;
pub use footer::Footer;
pub use header::Header;
pub use help::HelpOverlay;
pub use item_list::ItemList;
pub use overview::Overview;

/// Common widget utilities
pub mod utils {
    use ratatui::layout::{Constraint, Direction, Layout, Rect};

    use crate::tui::theme::icons;

    /// Format duration as HH:MM:SS
    pub fn format_duration(secs: u64) -> String {
        format!(
            "{:02}:{:02}:{:02}",
            secs / 3600,
            (secs % 3600) / 60,
            secs % 60
        )
    }

    /// Truncate string with ellipsis (counts chars, not bytes)
    pub fn truncate(s: &str, max_len: usize) -> String {
        let len = s.chars().count();
        if len <= max_len {
            s.to_string()
        } else if max_len <= 3 {
            s.chars().take(max_len).collect()
        } else {
            let head: String = s.chars().take(max_len - 3).collect();
            format!("{}...", head)
        }
    }

    /// `[████░░░░]` for `done` of `total`
    pub fn progress_bar(done: usize, total: usize, width: usize) -> String {
        let filled = if total == 0 {
            0
        } else {
            (done * width / total).min(width)
        };
        format!(
            "[{}{}]",
            icons::BAR_FULL.to_string().repeat(filled),
            icons::BAR_EMPTY.to_string().repeat(width - filled)
        )
    }

    /// Rect of `percent_x` x `percent_y` centered in `area`
    pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ])
            .split(area);
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ])
            .split(vertical[1])[1]
    }
}

#[cfg(test)]
mod tests {
    use super::utils::*;
    use ratatui::layout::Rect;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "00:00:00");
        assert_eq!(format_duration(61), "00:01:01");
        assert_eq!(format_duration(3661), "01:01:01");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("hi", 2), "hi");
        assert_eq!(truncate("ünïcödé-name", 6), "ünï...");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(5, 10, 10), "[█████░░░░░]");
        assert_eq!(progress_bar(0, 0, 4), "[░░░░]");
        assert_eq!(progress_bar(3, 3, 4), "[████]");
    }

    #[test]
    fn test_centered_rect_is_inside() {
        let area = Rect::new(0, 0, 100, 40);
        let popup = centered_rect(60, 50, area);
        assert_eq!(popup.width, 60);
        assert_eq!(popup.height, 20);
        assert_eq!(popup.x, 20);
    }
}
