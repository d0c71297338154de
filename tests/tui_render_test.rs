//! TUI Render Tests
//!
//! Widgets rendered into a ratatui `Buffer` and compared as plain text.

use pretty_assertions::assert_eq;
use ratatui::{backend::TestBackend, buffer::Buffer, layout::Rect, widgets::Widget, Terminal};

use deploy_view::deploy::{DeployTree, ItemKind};
use deploy_view::engine::{demo_changeset, MockEngine, DEMO_INSTANCE_ID};
use deploy_view::parse_event_line;
use deploy_view::tui::widgets::{Footer, Header, HelpOverlay, ItemList, Overview};
use deploy_view::tui::{draw, AppState, DeployTheme};

// =============================================================================
// HELPERS
// =============================================================================

fn render_widget_to_string<W: Widget>(widget: W, width: u16, height: u16) -> String {
    let area = Rect::new(0, 0, width, height);
    let mut buffer = Buffer::empty(area);
    widget.render(area, &mut buffer);
    buffer_to_string(&buffer)
}

fn buffer_to_string(buffer: &Buffer) -> String {
    let mut result = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            result.push_str(buffer[(x, y)].symbol());
        }
        result.push('\n');
    }
    result
}

fn demo_state() -> AppState {
    AppState::new(DeployTree::from_changeset(
        Some(DEMO_INSTANCE_ID.into()),
        &demo_changeset(),
    ))
}

fn finished_state(fail: bool) -> AppState {
    let mut state = demo_state();
    for event in MockEngine::new().with_failure(fail).script(1_700_000_000) {
        state.apply_event(&event);
    }
    state
}

// =============================================================================
// ITEM LIST
// =============================================================================

#[test]
fn test_item_list_rows_in_level_order() {
    let state = demo_state();
    let theme = DeployTheme::new();
    let output = render_widget_to_string(ItemList::new(&state, &theme), 50, 14);

    // resources by name, then children, then links
    let position = |name: &str| output.find(name).unwrap();
    assert!(position("apiGateway") < position("legacyWorker"));
    assert!(position("legacyWorker") < position("ordersQueue"));
    assert!(position("processOrderFn") < position("networking"));
    assert!(position("networking") < position("processOrderFn::ordersTable"));
    assert!(output.contains(DEMO_INSTANCE_ID), "breadcrumb title");
}

#[test]
fn test_item_list_breadcrumbs_after_drill_in() {
    let mut state = demo_state();
    state.selected = state.tree.find(ItemKind::Child, "networking");
    assert!(state.drill_in());

    let theme = DeployTheme::new();
    let output = render_widget_to_string(ItemList::new(&state, &theme), 50, 8);
    let title = output.lines().next().unwrap();
    assert!(title.contains("networking"));
    assert!(title.contains("›"));
    assert!(output.contains("vpc"));
    assert!(!output.contains("ordersTable"));
}

#[test]
fn test_empty_level_shows_waiting_hint() {
    let state = AppState::new(DeployTree::new(None));
    let theme = DeployTheme::new();
    let output = render_widget_to_string(ItemList::new(&state, &theme), 50, 5);
    assert!(output.contains("waiting for deploy events"));
    assert!(output.contains("blueprint"));
}

// =============================================================================
// HEADER / FOOTER
// =============================================================================

#[test]
fn test_header_progress_after_success() {
    let state = finished_state(false);
    let theme = DeployTheme::new();
    let output = render_widget_to_string(Header::new(&state, &theme), 120, 3);

    let (done, total) = state.tree.progress();
    assert_eq!(done, total);
    assert!(output.contains(&format!("{}/{}", done, total)));
    assert!(output.contains("deployed"));
    assert!(output.contains("finished"));
}

#[test]
fn test_header_title_for_destroy() {
    let theme = DeployTheme::new();
    let deploying = demo_state();
    let output = render_widget_to_string(Header::new(&deploying, &theme), 120, 3);
    assert!(output.contains(" DEPLOY "));

    let mut state = AppState::new(DeployTree::new(Some("i-1".into())));
    let event = parse_event_line(
        r#"{"type":"instance","instance_id":"i-1","status":"destroying","update_timestamp":5}"#,
        1,
    )
    .unwrap()
    .unwrap();
    state.apply_event(&event);
    let output = render_widget_to_string(Header::new(&state, &theme), 120, 3);
    assert!(output.contains(" DESTROY "));
    assert!(output.contains("destroying"));
}

#[test]
fn test_footer_hints_follow_mode() {
    let mut state = demo_state();
    let theme = DeployTheme::new();
    let items = render_widget_to_string(Footer::new(&state, &theme), 100, 1);
    assert!(items.contains("[Enter] open"));

    state.toggle_overview();
    let overview = render_widget_to_string(Footer::new(&state, &theme), 100, 1);
    assert!(overview.contains("[o] items"));
    assert!(!overview.contains("[Enter]"));
}

// =============================================================================
// OVERVIEW
// =============================================================================

#[test]
fn test_overview_lists_failures_with_reasons() {
    let state = finished_state(true);
    let theme = DeployTheme::new();
    let output = render_widget_to_string(Overview::new(&state, &theme), 100, 30);

    assert!(output.contains("deploy rolled back"));
    assert!(output.contains("Failures"));
    assert!(output.contains("apiGateway"));
    assert!(output.contains("AccessDenied"));
}

// =============================================================================
// FULL SCREEN
// =============================================================================

#[test]
fn test_full_screen_selection_details() {
    let mut state = finished_state(false);
    state.selected = state.tree.find(ItemKind::Resource, "processOrderFn");

    let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
    let theme = DeployTheme::new();
    terminal
        .draw(|frame| draw(frame, &mut state, &theme, 40))
        .unwrap();
    let output = buffer_to_string(terminal.backend().buffer());

    assert!(output.contains("DETAILS"));
    assert!(output.contains("aws/lambda/function"));
    assert!(output.contains("ACTIVITY"));
}

#[test]
fn test_help_overlay_has_own_background() {
    let theme = DeployTheme::new();
    let area = Rect::new(0, 0, 80, 24);
    let mut buffer = Buffer::empty(area);
    HelpOverlay::new(&theme).render(area, &mut buffer);

    let text = buffer_to_string(&buffer);
    assert!(text.contains("HELP"));
    assert_eq!(buffer[(40, 12)].bg, theme.deep_space);
    assert_ne!(buffer[(0, 0)].bg, theme.deep_space);
}
