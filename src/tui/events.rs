//! Event Handling - Keyboard input processing

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::state::{AppState, ViewMode};

/// Lines moved by PgUp / PgDn in the detail pane
const PAGE: i16 = 10;

/// Actions that can be triggered by user input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Select,
    DrillIn,
    Back,
    ScrollDetails,
    ToggleOverview,
    Help,
    None,
}

/// Handle keyboard events
pub fn handle_key_event(key: KeyEvent, state: &mut AppState) -> Action {
    if key.kind == KeyEventKind::Release {
        return Action::None;
    }

    // Global keybindings (work in any mode)
    match (key.modifiers, key.code) {
        (_, KeyCode::Char('q')) => return Action::Quit,
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => return Action::Quit,
        (_, KeyCode::Char('?')) | (_, KeyCode::F(1)) => {
            state.show_help = !state.show_help;
            return Action::Help;
        }
        _ => {}
    }

    // Help overlay swallows everything else; Esc closes it
    if state.show_help {
        if key.code == KeyCode::Esc {
            state.show_help = false;
            return Action::Help;
        }
        return Action::None;
    }

    if key.code == KeyCode::Char('o') {
        state.toggle_overview();
        return Action::ToggleOverview;
    }

    match key.code {
        KeyCode::PageUp => {
            state.scroll_details(-PAGE);
            return Action::ScrollDetails;
        }
        KeyCode::PageDown => {
            state.scroll_details(PAGE);
            return Action::ScrollDetails;
        }
        _ => {}
    }

    if state.mode == ViewMode::Overview {
        if matches!(key.code, KeyCode::Esc | KeyCode::Backspace) {
            state.toggle_overview();
            return Action::ToggleOverview;
        }
        return Action::None;
    }

    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            state.move_selection(-1);
            Action::Select
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.move_selection(1);
            Action::Select
        }
        KeyCode::Home | KeyCode::Char('g') => {
            state.select_first();
            Action::Select
        }
        KeyCode::End | KeyCode::Char('G') => {
            state.select_last();
            Action::Select
        }
        KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
            if state.drill_in() {
                Action::DrillIn
            } else {
                Action::None
            }
        }
        KeyCode::Esc | KeyCode::Left | KeyCode::Char('h') | KeyCode::Backspace => {
            if state.go_back() {
                Action::Back
            } else {
                Action::None
            }
        }
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::{DeployTree, ItemKind};
    use crate::engine::{demo_changeset, DEMO_INSTANCE_ID};

    fn state() -> AppState {
        AppState::new(DeployTree::from_changeset(
            Some(DEMO_INSTANCE_ID.into()),
            &demo_changeset(),
        ))
    }

    fn press(state: &mut AppState, code: KeyCode) -> Action {
        handle_key_event(KeyEvent::new(code, KeyModifiers::NONE), state)
    }

    #[test]
    fn test_quit_action() {
        let mut state = state();
        assert_eq!(press(&mut state, KeyCode::Char('q')), Action::Quit);
    }

    #[test]
    fn test_ctrl_c_quit() {
        let mut state = state();
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key_event(key, &mut state), Action::Quit);
    }

    #[test]
    fn test_vim_and_arrow_navigation() {
        let mut state = state();
        let first = state.selected;
        press(&mut state, KeyCode::Char('j'));
        press(&mut state, KeyCode::Down);
        assert_eq!(state.selected_index(), Some(2));
        press(&mut state, KeyCode::Char('k'));
        assert_eq!(state.selected_index(), Some(1));
        press(&mut state, KeyCode::Char('G'));
        assert_eq!(state.selected_index(), Some(state.level().len() - 1));
        press(&mut state, KeyCode::Char('g'));
        assert_eq!(state.selected, first);
    }

    #[test]
    fn test_enter_and_escape_move_between_levels() {
        let mut state = state();
        state.selected = state.tree.find(ItemKind::Child, "networking");

        assert_eq!(press(&mut state, KeyCode::Enter), Action::DrillIn);
        assert_eq!(state.current_path(), "networking");
        assert_eq!(press(&mut state, KeyCode::Esc), Action::Back);
        assert_eq!(state.current_path(), "");
        assert_eq!(press(&mut state, KeyCode::Char('h')), Action::None);
    }

    #[test]
    fn test_help_overlay_swallows_navigation() {
        let mut state = state();
        assert_eq!(press(&mut state, KeyCode::Char('?')), Action::Help);
        assert!(state.show_help);

        let before = state.selected;
        assert_eq!(press(&mut state, KeyCode::Down), Action::None);
        assert_eq!(state.selected, before);

        press(&mut state, KeyCode::Esc);
        assert!(!state.show_help);
    }

    #[test]
    fn test_overview_toggle() {
        let mut state = state();
        assert_eq!(press(&mut state, KeyCode::Char('o')), Action::ToggleOverview);
        assert_eq!(state.mode, ViewMode::Overview);
        assert_eq!(press(&mut state, KeyCode::Down), Action::None);
        press(&mut state, KeyCode::Esc);
        assert_eq!(state.mode, ViewMode::Items);
    }

    #[test]
    fn test_page_keys_scroll_details() {
        let mut state = state();
        press(&mut state, KeyCode::PageDown);
        assert_eq!(state.detail_scroll, 10);
        press(&mut state, KeyCode::PageUp);
        press(&mut state, KeyCode::PageUp);
        assert_eq!(state.detail_scroll, 0);
    }
}
