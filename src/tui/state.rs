//! TUI State - navigation and view state over the deploy tree
//!
//! Selection is kept by [`ItemId`] rather than by row, so rows that appear
//! while the deployment runs do not move the cursor to another item.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::deploy::{DeployItem, DeployTree, ItemId, ItemKind, TreeChange};
use crate::error::DeployViewError;
use crate::event::{DeployEvent, StatusClass};

const MAX_ACTIVITY: usize = 200;

/// What the body area shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Items,
    Overview,
}

/// Connection state of the engine event stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamStatus {
    Connecting,
    Streaming,
    /// Root instance reported its final status
    Finished,
    /// Stream ended before the deployment finished
    Closed,
    Failed(String),
}

impl StreamStatus {
    pub fn label(&self) -> &str {
        match self {
            StreamStatus::Connecting => "connecting",
            StreamStatus::Streaming => "streaming",
            StreamStatus::Finished => "finished",
            StreamStatus::Closed => "stream closed",
            StreamStatus::Failed(_) => "stream error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ActivityEvent {
    pub timestamp: Instant,
    pub class: StatusClass,
    pub message: String,
}

impl ActivityEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            timestamp: Instant::now(),
            class: StatusClass::Pending,
            message: message.into(),
        }
    }

    pub fn item(item: &DeployItem) -> Self {
        Self {
            timestamp: Instant::now(),
            class: item.class(),
            message: format!("{} {} {}", item.kind.label(), item.path, item.status_label()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            timestamp: Instant::now(),
            class: StatusClass::Failed,
            message: message.into(),
        }
    }
}

/// Application state
pub struct AppState {
    pub tree: DeployTree,
    /// Child paths drilled into, innermost last
    pub nav: Vec<String>,
    pub selected: Option<ItemId>,
    pub mode: ViewMode,
    pub show_help: bool,
    pub detail_scroll: u16,
    /// First visible row of the item list
    pub list_offset: usize,
    pub stream: StreamStatus,
    pub activity: VecDeque<ActivityEvent>,
    pub start_time: Instant,
    pub elapsed: Duration,
    /// Animation frame for spinners
    pub frame: usize,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(tree: DeployTree) -> Self {
        let mut state = Self {
            tree,
            nav: Vec::new(),
            selected: None,
            mode: ViewMode::default(),
            show_help: false,
            detail_scroll: 0,
            list_offset: 0,
            stream: StreamStatus::Connecting,
            activity: VecDeque::new(),
            start_time: Instant::now(),
            elapsed: Duration::ZERO,
            frame: 0,
            should_quit: false,
        };
        state.selected = state.level().first().copied();
        state
    }

    /// Child path currently shown (`""` for the root blueprint)
    pub fn current_path(&self) -> &str {
        self.nav.last().map(String::as_str).unwrap_or("")
    }

    /// Items of the current level in display order
    pub fn level(&self) -> Vec<ItemId> {
        self.tree.level(self.current_path())
    }

    pub fn selected_index(&self) -> Option<usize> {
        let selected = self.selected?;
        self.level().iter().position(|&id| id == selected)
    }

    pub fn selected_item(&self) -> Option<&DeployItem> {
        self.selected.and_then(|id| self.tree.item(id))
    }

    /// Breadcrumb labels from the root blueprint down to the current level
    pub fn breadcrumbs(&self) -> Vec<String> {
        let mut crumbs = vec![self.tree.display_name().to_string()];
        if let Some(path) = self.nav.last() {
            crumbs.extend(path.split('/').map(str::to_string));
        }
        crumbs
    }

    // ─────────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────────

    pub fn move_selection(&mut self, delta: isize) {
        let level = self.level();
        if level.is_empty() {
            self.selected = None;
            return;
        }
        let current = self.selected_index().unwrap_or(0);
        let next = current
            .saturating_add_signed(delta)
            .min(level.len() - 1);
        self.select(level[next]);
    }

    pub fn select_first(&mut self) {
        if let Some(&id) = self.level().first() {
            self.select(id);
        }
    }

    pub fn select_last(&mut self) {
        if let Some(&id) = self.level().last() {
            self.select(id);
        }
    }

    fn select(&mut self, id: ItemId) {
        if self.selected != Some(id) {
            self.selected = Some(id);
            self.detail_scroll = 0;
        }
    }

    /// Enter the selected child blueprint. Returns false when the selection
    /// is not a child.
    pub fn drill_in(&mut self) -> bool {
        let Some(item) = self.selected_item() else {
            return false;
        };
        if item.kind != ItemKind::Child {
            return false;
        }
        let path = item.path.clone();
        self.nav.push(path);
        self.list_offset = 0;
        self.detail_scroll = 0;
        self.selected = self.level().first().copied();
        true
    }

    /// Go back to the parent level, reselecting the child we came from
    pub fn go_back(&mut self) -> bool {
        let Some(path) = self.nav.pop() else {
            return false;
        };
        self.list_offset = 0;
        self.detail_scroll = 0;
        self.selected = self
            .tree
            .find(ItemKind::Child, &path)
            .or_else(|| self.level().first().copied());
        true
    }

    pub fn scroll_details(&mut self, delta: i16) {
        self.detail_scroll = self.detail_scroll.saturating_add_signed(delta);
    }

    pub fn toggle_overview(&mut self) {
        self.mode = match self.mode {
            ViewMode::Items => ViewMode::Overview,
            ViewMode::Overview => ViewMode::Items,
        };
        self.detail_scroll = 0;
    }

    /// Keep the selected row inside a list viewport of `height` rows
    pub fn ensure_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        let Some(row) = self.selected_index() else {
            self.list_offset = 0;
            return;
        };
        let bottom = self.list_offset + height - 1;
        if row < self.list_offset {
            self.list_offset = row;
        } else if row > bottom {
            self.list_offset = row + 1 - height;
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Engine updates
    // ─────────────────────────────────────────────────────────────

    pub fn apply_event(&mut self, event: &DeployEvent) {
        if self.stream == StreamStatus::Connecting {
            self.stream = StreamStatus::Streaming;
        }
        for change in self.tree.apply(event) {
            match change {
                TreeChange::Item { id, .. } => {
                    if let Some(item) = self.tree.item(id) {
                        let entry = ActivityEvent::item(item);
                        self.push_event(entry);
                    }
                }
                TreeChange::Instance { status, .. } => {
                    let message = format!("instance {}", status.label());
                    self.push_event(ActivityEvent {
                        timestamp: Instant::now(),
                        class: status.class(),
                        message,
                    });
                }
                TreeChange::Finished => {
                    self.stream = StreamStatus::Finished;
                    let message = match self.tree.finish() {
                        Some(finish) => format!("deployment {}", finish.status.label()),
                        None => "deployment finished".to_string(),
                    };
                    self.push_event(ActivityEvent::info(message));
                }
            }
        }

        // First rows can show up after startup when there is no changeset
        if self.selected.is_none() {
            self.selected = self.level().first().copied();
        }
    }

    /// The engine stream ended (cleanly or not)
    pub fn stream_ended(&mut self, error: Option<&DeployViewError>) {
        match error {
            Some(e) => {
                self.stream = StreamStatus::Failed(e.to_string());
                self.push_event(ActivityEvent::error(e.to_string()));
            }
            None if !self.tree.is_finished() => {
                self.stream = StreamStatus::Closed;
                self.push_event(ActivityEvent::error(
                    "event stream closed before the deployment finished",
                ));
            }
            None => {}
        }
    }

    pub fn push_event(&mut self, event: ActivityEvent) {
        self.activity.push_front(event);
        if self.activity.len() > MAX_ACTIVITY {
            self.activity.pop_back();
        }
    }

    /// Advance clocks and animation; the clock stops once the deployment ends
    pub fn tick(&mut self) {
        self.frame = self.frame.wrapping_add(1);
        if !self.tree.is_finished() {
            self.elapsed = self.start_time.elapsed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{demo_changeset, MockEngine, DEMO_INSTANCE_ID};

    fn demo_state() -> AppState {
        let tree = DeployTree::from_changeset(Some(DEMO_INSTANCE_ID.into()), &demo_changeset());
        AppState::new(tree)
    }

    fn selected_name(state: &AppState) -> &str {
        state.selected_item().map(|i| i.name.as_str()).unwrap_or("")
    }

    #[test]
    fn test_initial_selection_is_first_row() {
        let state = demo_state();
        // resources first, by name
        assert_eq!(selected_name(&state), "apiGateway");
        assert_eq!(state.breadcrumbs(), vec![DEMO_INSTANCE_ID.to_string()]);
    }

    #[test]
    fn test_move_selection_clamps() {
        let mut state = demo_state();
        state.move_selection(-1);
        assert_eq!(selected_name(&state), "apiGateway");

        state.move_selection(100);
        assert_eq!(selected_name(&state), "processOrderFn::ordersTable");

        state.select_first();
        state.move_selection(1);
        assert_eq!(selected_name(&state), "legacyWorker");
    }

    #[test]
    fn test_drill_in_and_back() {
        let mut state = demo_state();
        assert!(!state.drill_in(), "resources cannot be entered");

        let networking = state.tree.find(ItemKind::Child, "networking").unwrap();
        state.selected = Some(networking);
        assert!(state.drill_in());
        assert_eq!(state.current_path(), "networking");
        assert_eq!(selected_name(&state), "privateSubnet");

        state.select_last();
        assert_eq!(selected_name(&state), "dns");
        assert!(state.drill_in());
        assert_eq!(
            state.breadcrumbs(),
            vec![DEMO_INSTANCE_ID.to_string(), "networking".into(), "dns".into()]
        );

        assert!(state.go_back());
        assert_eq!(selected_name(&state), "dns");
        assert!(state.go_back());
        assert_eq!(state.selected, Some(networking));
        assert!(!state.go_back());
    }

    #[test]
    fn test_selection_survives_new_rows() {
        let mut state = demo_state();
        state.select_last();
        let before = state.selected;

        for event in MockEngine::new().script(1_700_000_000) {
            state.apply_event(&event);
        }
        assert_eq!(state.selected, before);
        assert_eq!(state.stream, StreamStatus::Finished);
        assert!(!state.activity.is_empty());
    }

    #[test]
    fn test_stream_closed_early() {
        let mut state = demo_state();
        state.stream_ended(None);
        assert_eq!(state.stream, StreamStatus::Closed);

        state.stream_ended(Some(&DeployViewError::StreamClosed));
        assert!(matches!(state.stream, StreamStatus::Failed(_)));
    }

    #[test]
    fn test_ensure_visible() {
        let mut state = demo_state();
        state.select_last();
        let row = state.selected_index().unwrap();
        state.ensure_visible(3);
        assert_eq!(state.list_offset, row + 1 - 3);

        state.select_first();
        state.ensure_visible(3);
        assert_eq!(state.list_offset, 0);
    }

    #[test]
    fn test_activity_is_bounded() {
        let mut state = demo_state();
        for i in 0..(MAX_ACTIVITY + 10) {
            state.push_event(ActivityEvent::info(format!("event {}", i)));
        }
        assert_eq!(state.activity.len(), MAX_ACTIVITY);
        assert_eq!(state.activity.front().unwrap().message, "event 209");
    }

    #[test]
    fn test_detail_scroll_saturates() {
        let mut state = demo_state();
        state.scroll_details(-5);
        assert_eq!(state.detail_scroll, 0);
        state.scroll_details(10);
        assert_eq!(state.detail_scroll, 10);
    }
}
