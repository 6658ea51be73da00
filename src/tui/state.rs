// ABOUTME: TUI state types — chat messages, loop/user events, input buffer, and session counters.
// ABOUTME: Mirrors what the debate loop reports; the loop's Session stays the source of truth.

use std::time::Instant;

/// The kind of a single chat message displayed in the TUI.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatMessageKind {
    User,
    Assistant,
    System,
}

/// A single message in the chat history.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub kind: ChatMessageKind,
    pub content: String,
}

/// Events sent from the debate loop to the TUI via an mpsc channel.
#[derive(Debug)]
pub enum AgentEvent {
    /// A topic is in play: at session start or after a reset.
    TopicStarted {
        topic: String,
        greeting: String,
        topic_change_count: u32,
    },
    /// The loop accepted a user message as turn `turn`.
    TurnStarted { turn: u32 },
    /// Streaming text fragment from the completion service.
    TextDelta(String),
    /// Streaming text is complete.
    TextDone,
    /// The completion failed; the payload replaces any partial reply.
    ReplyFailed(String),
    /// One or more log sinks rejected the turn.
    LogFailed(String),
    /// The loop finished processing the last user event.
    Done,
}

/// Events sent from the TUI to the debate loop.
#[derive(Debug, PartialEq)]
pub enum UserEvent {
    /// User submitted a chat message.
    Message(String),
    /// User asked for a different topic.
    NewTopic,
    /// User requested to quit.
    Quit,
}

/// Optional text shown above the chat.
#[derive(Debug, Clone, PartialEq)]
pub enum Banner {
    Text(String),
    Warning(String),
}

/// Full TUI application state.
pub struct TuiState {
    pub messages: Vec<ChatMessage>,
    pub input: String,
    pub cursor_pos: usize,
    pub scroll_offset: u16,
    /// A user event is in flight; input is locked until `Done`.
    pub streaming: bool,
    /// The current reply has received at least one fragment.
    pub reply_open: bool,
    pub model: String,
    pub topic: String,
    pub turn_count: u32,
    pub topic_change_count: u32,
    pub banner: Option<Banner>,
    pub session_start: Instant,
}

impl TuiState {
    /// Create a new empty TUI state for the given model name.
    pub fn new(model: String) -> Self {
        Self {
            messages: Vec::new(),
            input: String::new(),
            cursor_pos: 0,
            scroll_offset: 0,
            streaming: false,
            reply_open: false,
            model,
            topic: String::new(),
            turn_count: 0,
            topic_change_count: 0,
            banner: None,
            session_start: Instant::now(),
        }
    }

    /// Add a message to the chat history and reset scroll to bottom.
    pub fn push_message(&mut self, kind: ChatMessageKind, content: String) {
        self.messages.push(ChatMessage { kind, content });
        self.scroll_offset = 0;
    }

    /// Append text to the last assistant message, or create a new one if needed.
    pub fn append_to_last_assistant(&mut self, text: &str) {
        if let Some(msg) = self.messages.last_mut() {
            if msg.kind == ChatMessageKind::Assistant {
                msg.content.push_str(text);
                return;
            }
        }
        self.push_message(ChatMessageKind::Assistant, text.to_string());
    }

    /// Apply one event from the debate loop.
    pub fn apply_agent_event(&mut self, event: AgentEvent) {
        match event {
            AgentEvent::TopicStarted {
                topic,
                greeting,
                topic_change_count,
            } => {
                self.messages.clear();
                self.push_message(ChatMessageKind::Assistant, greeting);
                self.topic = topic;
                self.topic_change_count = topic_change_count;
                self.turn_count = 0;
                self.reply_open = false;
            }
            AgentEvent::TurnStarted { turn } => {
                self.turn_count = turn;
                self.reply_open = false;
            }
            AgentEvent::TextDelta(text) => {
                if self.reply_open {
                    self.append_to_last_assistant(&text);
                } else {
                    self.push_message(ChatMessageKind::Assistant, text);
                    self.reply_open = true;
                }
            }
            AgentEvent::TextDone => {
                self.reply_open = false;
            }
            AgentEvent::ReplyFailed(text) => {
                if self.reply_open {
                    if let Some(last) = self.messages.last_mut() {
                        last.content = text;
                    }
                } else {
                    self.push_message(ChatMessageKind::Assistant, text);
                }
                self.reply_open = false;
            }
            AgentEvent::LogFailed(reason) => {
                self.push_message(
                    ChatMessageKind::System,
                    format!("기록 저장 실패: {}", reason),
                );
            }
            AgentEvent::Done => {
                self.streaming = false;
                self.reply_open = false;
            }
        }
    }

    /// Submit the current input buffer. Returns the trimmed text if non-empty.
    pub fn submit_input(&mut self) -> Option<String> {
        let trimmed = self.input.trim().to_string();
        if trimmed.is_empty() {
            return None;
        }
        self.input.clear();
        self.cursor_pos = 0;
        Some(trimmed)
    }

    /// Clamp the cursor position to the valid character range of the input buffer.
    pub fn clamp_cursor(&mut self) {
        self.cursor_pos = self.cursor_pos.min(self.input_char_len());
    }

    /// Return the current cursor byte index in the UTF-8 input buffer.
    pub fn cursor_byte_index(&self) -> usize {
        char_index_to_byte_index(&self.input, self.cursor_pos)
    }

    /// Return the total number of characters in the input buffer.
    pub fn input_char_len(&self) -> usize {
        self.input.chars().count()
    }

    /// Insert a character at the cursor and advance by one character.
    pub fn insert_char_at_cursor(&mut self, c: char) {
        self.clamp_cursor();
        let byte_index = self.cursor_byte_index();
        self.input.insert(byte_index, c);
        self.cursor_pos += 1;
    }

    /// Insert pasted text at the cursor. Newlines become spaces.
    pub fn insert_str_at_cursor(&mut self, text: &str) {
        for c in text.chars() {
            self.insert_char_at_cursor(if c == '\n' || c == '\r' { ' ' } else { c });
        }
    }

    /// Delete the character before the cursor (backspace behavior).
    pub fn backspace_char(&mut self) {
        self.clamp_cursor();
        if self.cursor_pos == 0 {
            return;
        }

        let end = self.cursor_byte_index();
        let start = char_index_to_byte_index(&self.input, self.cursor_pos - 1);
        self.input.replace_range(start..end, "");
        self.cursor_pos -= 1;
    }

    /// Delete the character at the cursor (delete behavior).
    pub fn delete_char_at_cursor(&mut self) {
        self.clamp_cursor();
        if self.cursor_pos >= self.input_char_len() {
            return;
        }

        let start = self.cursor_byte_index();
        let end = char_index_to_byte_index(&self.input, self.cursor_pos + 1);
        self.input.replace_range(start..end, "");
    }

    pub fn move_cursor_left(&mut self) {
        self.clamp_cursor();
        self.cursor_pos = self.cursor_pos.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        self.clamp_cursor();
        if self.cursor_pos < self.input_char_len() {
            self.cursor_pos += 1;
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor_pos = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor_pos = self.input_char_len();
    }

    /// Text of the input buffer before the cursor.
    pub fn input_before_cursor(&self) -> &str {
        &self.input[..self.cursor_byte_index()]
    }
}

fn char_index_to_byte_index(s: &str, char_index: usize) -> usize {
    if char_index == 0 {
        return 0;
    }

    match s.char_indices().nth(char_index) {
        Some((idx, _)) => idx,
        None => s.len(),
    }
}
