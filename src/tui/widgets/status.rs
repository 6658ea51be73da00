// ABOUTME: Status bar widget — renders model, turn number, topic changes, elapsed time, and streaming state.
// ABOUTME: Displayed at the bottom of the TUI as a single-line summary.

use std::time::Duration;

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

/// Inputs for the status bar.
pub struct StatusBarParams<'a> {
    pub model: &'a str,
    pub turn_count: u32,
    pub topic_change_count: u32,
    pub elapsed: Duration,
    pub streaming: bool,
}

/// Render the status bar line.
pub fn status_line(params: &StatusBarParams<'_>) -> Line<'static> {
    let dim = Style::default().fg(Color::DarkGray);
    let mut spans = vec![
        Span::styled(format!(" {} ", params.model), Style::default().fg(Color::Cyan)),
        Span::styled("| ", dim),
        Span::styled(
            format!("{}턴 ", params.turn_count),
            Style::default().fg(Color::White),
        ),
        Span::styled("| ", dim),
        Span::styled(
            format!("주제 변경 {}회 ", params.topic_change_count),
            Style::default().fg(Color::White),
        ),
        Span::styled("| ", dim),
        Span::styled(
            format!("{} ", format_elapsed(params.elapsed)),
            Style::default().fg(Color::White),
        ),
    ];

    if params.streaming {
        spans.push(Span::styled("| ", dim));
        spans.push(Span::styled(
            "streaming... ",
            Style::default().fg(Color::Yellow),
        ));
    }

    Line::from(spans)
}

/// Format elapsed time as M:SS, or H:MM:SS past an hour.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}
