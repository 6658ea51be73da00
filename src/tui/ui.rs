// ABOUTME: Main TUI rendering function — assembles header, topic line, chat, input, and status bar.
// ABOUTME: Splits the terminal frame into vertical layout chunks and delegates to widgets.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Position};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

use crate::tui::state::TuiState;
use crate::tui::widgets::chat::{render_banner_lines, render_chat_lines};
use crate::tui::widgets::status::{StatusBarParams, status_line};

pub const TITLE: &str = " 🗣️ 토론 메이트 - 오늘의 주제 한마디";
pub const NEW_TOPIC_HINT: &str = " Enter 전송 · Ctrl+N 🔄 다른 주제 주세요 · Esc 종료 ";
pub const INPUT_PLACEHOLDER: &str = "당신의 생각은 어떠신가요?";

/// Render the full TUI screen layout to the given frame.
pub fn render(frame: &mut Frame, state: &mut TuiState) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Length(1), // Current topic
            Constraint::Min(3),    // Chat area
            Constraint::Length(3), // Input area
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    // Header
    let header = Line::from(Span::styled(
        TITLE,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    ));
    frame.render_widget(Paragraph::new(header), chunks[0]);

    let topic = Line::from(vec![
        Span::styled(" 주제: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            state.topic.clone(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
    ]);
    frame.render_widget(Paragraph::new(topic), chunks[1]);

    // Chat area
    let mut chat_lines = render_banner_lines(state.banner.as_ref());
    chat_lines.extend(render_chat_lines(&state.messages));

    let chat_chunk = chunks[2];
    let visible_height = chat_chunk.height;

    // line_count() matches ratatui's own wrapping, so the scroll bound is exact.
    let chat_paragraph = Paragraph::new(chat_lines).wrap(Wrap { trim: false });
    let total_lines = clamp_line_count(chat_paragraph.line_count(chat_chunk.width));
    let max_scroll = total_lines.saturating_sub(visible_height);

    if state.scroll_offset > max_scroll {
        state.scroll_offset = max_scroll;
    }

    // scroll_offset is lines scrolled up from the bottom (0 = at bottom)
    let scroll = max_scroll.saturating_sub(state.scroll_offset);
    frame.render_widget(chat_paragraph.scroll((scroll, 0)), chat_chunk);

    // Input area
    let input_chunk = chunks[3];
    let title = if state.streaming {
        " streaming... "
    } else {
        NEW_TOPIC_HINT
    };
    let input_block = Block::default()
        .borders(Borders::TOP | Borders::BOTTOM)
        .title(Span::styled(title, Style::default().fg(Color::DarkGray)));

    let input_line = if state.input.is_empty() && !state.streaming {
        Span::styled(INPUT_PLACEHOLDER, Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(state.input.clone())
    };

    // Keep the cursor visible by scrolling long input horizontally.
    state.clamp_cursor();
    let max_visual_col = input_chunk.width.saturating_sub(1) as usize;
    let visual_col = UnicodeWidthStr::width(state.input_before_cursor());
    let h_scroll = visual_col.saturating_sub(max_visual_col) as u16;

    let input = Paragraph::new(input_line)
        .block(input_block)
        .scroll((0, h_scroll));
    frame.render_widget(input, input_chunk);

    if !state.streaming && input_chunk.width > 0 && input_chunk.height > 1 {
        let cursor_col = visual_col.min(max_visual_col);
        let cursor_x = input_chunk.x.saturating_add(cursor_col as u16);
        // +1 for the top border.
        let cursor_y = input_chunk.y.saturating_add(1);
        frame.set_cursor_position(Position::new(cursor_x, cursor_y));
    }

    // Status bar
    let status = status_line(&StatusBarParams {
        model: &state.model,
        turn_count: state.turn_count,
        topic_change_count: state.topic_change_count,
        elapsed: state.session_start.elapsed(),
        streaming: state.streaming,
    });
    frame.render_widget(Paragraph::new(status), chunks[4]);
}

/// Scroll positions are u16; a longer transcript pins to the last reachable line.
fn clamp_line_count(lines: usize) -> u16 {
    u16::try_from(lines).unwrap_or(u16::MAX)
}
