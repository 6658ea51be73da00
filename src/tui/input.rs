// ABOUTME: Keyboard input handling for the TUI — translates key events into actions.
// ABOUTME: Handles typing, submission, the new-topic control, scrolling, and the streaming lock.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::state::TuiState;

/// The result of processing a key event.
#[derive(Debug, PartialEq)]
pub enum InputResult {
    /// No action needed.
    None,
    /// User submitted a message.
    Send(String),
    /// User asked for a different topic.
    NewTopic,
    /// User wants to quit.
    Quit,
}

/// Process a key event against the current TUI state and return the resulting action.
pub fn handle_key(state: &mut TuiState, key: KeyEvent) -> InputResult {
    // Ctrl+C always quits
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return InputResult::Quit;
    }

    // Scrolling works in every mode.
    if handle_scroll_key(state, key.code) {
        return InputResult::None;
    }

    // One turn at a time: everything else waits for the loop to finish.
    if state.streaming {
        return InputResult::None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('n') => InputResult::NewTopic,
            KeyCode::Char('a') => {
                state.move_cursor_home();
                InputResult::None
            }
            KeyCode::Char('e') => {
                state.move_cursor_end();
                InputResult::None
            }
            KeyCode::Char('u') => {
                state.input.clear();
                state.cursor_pos = 0;
                InputResult::None
            }
            _ => InputResult::None,
        };
    }

    match key.code {
        KeyCode::Enter => {
            if let Some(text) = state.submit_input() {
                InputResult::Send(text)
            } else {
                InputResult::None
            }
        }
        KeyCode::Char(c) => {
            state.insert_char_at_cursor(c);
            InputResult::None
        }
        KeyCode::Backspace => {
            state.backspace_char();
            InputResult::None
        }
        KeyCode::Delete => {
            state.delete_char_at_cursor();
            InputResult::None
        }
        KeyCode::Left => {
            state.move_cursor_left();
            InputResult::None
        }
        KeyCode::Right => {
            state.move_cursor_right();
            InputResult::None
        }
        KeyCode::Home => {
            state.move_cursor_home();
            InputResult::None
        }
        KeyCode::End => {
            state.move_cursor_end();
            InputResult::None
        }
        KeyCode::Esc => InputResult::Quit,
        _ => InputResult::None,
    }
}

fn handle_scroll_key(state: &mut TuiState, key: KeyCode) -> bool {
    match key {
        KeyCode::PageUp => {
            state.scroll_offset = state.scroll_offset.saturating_add(10);
            true
        }
        KeyCode::PageDown => {
            state.scroll_offset = state.scroll_offset.saturating_sub(10);
            true
        }
        KeyCode::Up => {
            state.scroll_offset = state.scroll_offset.saturating_add(1);
            true
        }
        KeyCode::Down => {
            state.scroll_offset = state.scroll_offset.saturating_sub(1);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn typing_appends_to_input() {
        let mut state = TuiState::new("m".to_string());
        let result = handle_key(&mut state, make_key(KeyCode::Char('h')));
        assert_eq!(result, InputResult::None);
        assert_eq!(state.input, "h");
        assert_eq!(state.cursor_pos, 1);

        handle_key(&mut state, make_key(KeyCode::Char('i')));
        assert_eq!(state.input, "hi");
        assert_eq!(state.cursor_pos, 2);
    }

    #[test]
    fn enter_submits_input() {
        let mut state = TuiState::new("m".to_string());
        state.input = "반대합니다".to_string();
        state.cursor_pos = 5;
        let result = handle_key(&mut state, make_key(KeyCode::Enter));
        assert_eq!(result, InputResult::Send("반대합니다".to_string()));
        assert_eq!(state.input, "");
        assert_eq!(state.cursor_pos, 0);
    }

    #[test]
    fn enter_on_empty_does_nothing() {
        let mut state = TuiState::new("m".to_string());
        let result = handle_key(&mut state, make_key(KeyCode::Enter));
        assert_eq!(result, InputResult::None);
    }

    #[test]
    fn backspace_deletes() {
        let mut state = TuiState::new("m".to_string());
        state.input = "abc".to_string();
        state.cursor_pos = 3;
        let result = handle_key(&mut state, make_key(KeyCode::Backspace));
        assert_eq!(result, InputResult::None);
        assert_eq!(state.input, "ab");
        assert_eq!(state.cursor_pos, 2);
    }

    #[test]
    fn ctrl_n_requests_new_topic() {
        let mut state = TuiState::new("m".to_string());
        state.input = "draft".to_string();
        assert_eq!(handle_key(&mut state, ctrl('n')), InputResult::NewTopic);
        assert_eq!(state.input, "draft");
    }

    #[test]
    fn ctrl_c_and_esc_quit() {
        let mut state = TuiState::new("m".to_string());
        assert_eq!(handle_key(&mut state, ctrl('c')), InputResult::Quit);
        assert_eq!(handle_key(&mut state, make_key(KeyCode::Esc)), InputResult::Quit);
    }

    #[test]
    fn ctrl_u_clears_input() {
        let mut state = TuiState::new("m".to_string());
        state.input = "abc".to_string();
        state.cursor_pos = 2;
        handle_key(&mut state, ctrl('u'));
        assert_eq!(state.input, "");
        assert_eq!(state.cursor_pos, 0);
    }

    #[test]
    fn streaming_ignores_input_and_topic_reset() {
        let mut state = TuiState::new("m".to_string());
        state.streaming = true;
        assert_eq!(handle_key(&mut state, make_key(KeyCode::Char('x'))), InputResult::None);
        assert_eq!(handle_key(&mut state, ctrl('n')), InputResult::None);
        assert_eq!(handle_key(&mut state, make_key(KeyCode::Enter)), InputResult::None);
        assert_eq!(state.input, "");
    }

    #[test]
    fn streaming_still_allows_quit_and_scroll() {
        let mut state = TuiState::new("m".to_string());
        state.streaming = true;
        handle_key(&mut state, make_key(KeyCode::PageUp));
        assert_eq!(state.scroll_offset, 10);
        handle_key(&mut state, make_key(KeyCode::Down));
        assert_eq!(state.scroll_offset, 9);
        assert_eq!(handle_key(&mut state, ctrl('c')), InputResult::Quit);
    }
}
