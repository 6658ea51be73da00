// ABOUTME: Chat widget — renders chat messages into styled ratatui Lines.
// ABOUTME: User, assistant, and system messages each have distinct visual styling.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::tui::state::{Banner, ChatMessage, ChatMessageKind};

const USER_PREFIX: &str = "🧑 ";
const ASSISTANT_PREFIX: &str = "🤖 ";

/// Render the optional banner into Lines shown above the chat.
pub fn render_banner_lines(banner: Option<&Banner>) -> Vec<Line<'static>> {
    match banner {
        None => Vec::new(),
        Some(Banner::Text(text)) => {
            let mut lines: Vec<Line<'static>> = text
                .lines()
                .map(|l| {
                    Line::from(Span::styled(
                        l.to_string(),
                        Style::default().fg(Color::Cyan),
                    ))
                })
                .collect();
            lines.push(Line::from(""));
            lines
        }
        Some(Banner::Warning(text)) => vec![
            Line::from(Span::styled(
                format!("⚠️ {}", text),
                Style::default().fg(Color::Yellow),
            )),
            Line::from(""),
        ],
    }
}

/// Render a slice of chat messages into styled Lines for display.
pub fn render_chat_lines(messages: &[ChatMessage]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for (idx, msg) in messages.iter().enumerate() {
        if idx > 0 {
            lines.push(Line::from(""));
        }

        match &msg.kind {
            ChatMessageKind::User => {
                prefixed_lines(&mut lines, USER_PREFIX, Color::Green, &msg.content);
            }
            ChatMessageKind::Assistant => {
                prefixed_lines(&mut lines, ASSISTANT_PREFIX, Color::Cyan, &msg.content);
            }
            ChatMessageKind::System => {
                lines.push(Line::from(Span::styled(
                    format!("[system] {}", msg.content),
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                )));
            }
        }
    }

    lines
}

/// First line gets the styled prefix, subsequent lines are plain.
fn prefixed_lines(lines: &mut Vec<Line<'static>>, prefix: &'static str, color: Color, content: &str) {
    for (i, text) in content.split('\n').enumerate() {
        if i == 0 {
            lines.push(Line::from(vec![
                Span::styled(
                    prefix,
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::raw(strip_bold(text)),
            ]));
        } else {
            lines.push(Line::from(Span::raw(strip_bold(text))));
        }
    }
}

/// Drop markdown bold markers; the terminal has no markdown renderer.
fn strip_bold(text: &str) -> String {
    text.replace("**", "")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(kind: ChatMessageKind, content: &str) -> ChatMessage {
        ChatMessage {
            kind,
            content: content.to_string(),
        }
    }

    #[test]
    fn user_message_has_green_prefix() {
        let lines = render_chat_lines(&[msg(ChatMessageKind::User, "hello")]);
        assert_eq!(lines.len(), 1);
        let spans = &lines[0].spans;
        assert!(spans.len() >= 2);
        assert_eq!(spans[0].content, USER_PREFIX);
        assert_eq!(spans[0].style.fg, Some(Color::Green));
    }

    #[test]
    fn assistant_message_has_cyan_prefix() {
        let lines = render_chat_lines(&[msg(ChatMessageKind::Assistant, "hi there")]);
        assert_eq!(lines.len(), 1);
        let spans = &lines[0].spans;
        assert_eq!(spans[0].content, ASSISTANT_PREFIX);
        assert_eq!(spans[0].style.fg, Some(Color::Cyan));
    }

    #[test]
    fn multiline_greeting_keeps_lines_and_drops_bold() {
        let lines = render_chat_lines(&[msg(
            ChatMessageKind::Assistant,
            "안녕하세요\n\n**오늘의 주제: X**",
        )]);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2].spans[0].content, "오늘의 주제: X");
    }

    #[test]
    fn system_message_is_italic_gray() {
        let lines = render_chat_lines(&[msg(ChatMessageKind::System, "connected")]);
        assert_eq!(lines.len(), 1);
        let spans = &lines[0].spans;
        assert_eq!(spans[0].style.fg, Some(Color::DarkGray));
        assert!(spans[0].style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn blank_separator_between_messages() {
        let lines = render_chat_lines(&[
            msg(ChatMessageKind::User, "hi"),
            msg(ChatMessageKind::Assistant, "hello"),
        ]);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].spans.len(), 0);
    }

    #[test]
    fn banner_lines() {
        assert!(render_banner_lines(None).is_empty());

        let text = Banner::Text("토론\n메이트".to_string());
        assert_eq!(render_banner_lines(Some(&text)).len(), 3);

        let warning = Banner::Warning("missing".to_string());
        let lines = render_banner_lines(Some(&warning));
        assert_eq!(lines[0].spans[0].style.fg, Some(Color::Yellow));
    }
}
