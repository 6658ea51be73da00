// ABOUTME: Per-session debate state — topic, transcript, turn and topic-change counters.
// ABOUTME: Owned by the debate loop; the only mutators are the three operations below.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::session::message::{Message, Role};
use crate::topic::TopicPool;

/// Greeting shown at the start of every topic. Not a turn and never logged.
pub fn greeting(topic: &str) -> String {
    format!(
        "안녕하세요, 저는 오늘의 주제를 함께 이야기 나누는 '토론 메이트'예요! 🤖\n\n\
         🗣️ **오늘의 주제: {topic}**\n\n\
         이 주제에 대해 어떻게 생각하시나요? 찬성/반대 또는 다른 관점에서 자유롭게 이야기해 주세요."
    )
}

/// Ephemeral state for one interactive session.
#[derive(Debug, Clone)]
pub struct Session {
    session_id: String,
    current_topic: String,
    messages: Vec<Message>,
    turn_count: u32,
    topic_change_count: u32,
    started_at: DateTime<Utc>,
    start_time: Instant,
}

impl Session {
    /// Start a session on the given topic, with its greeting already in the transcript.
    pub fn new(topic: impl Into<String>) -> Self {
        let current_topic = topic.into();
        let messages = vec![Message::assistant(greeting(&current_topic))];
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            current_topic,
            messages,
            turn_count: 0,
            topic_change_count: 0,
            started_at: Utc::now(),
            start_time: Instant::now(),
        }
    }

    /// Start a session on a topic picked at random from `pool`.
    ///
    /// The initial pick is not counted as a topic change.
    pub fn with_random_topic<R: Rng>(pool: &TopicPool, rng: &mut R) -> Self {
        Self::new(pool.pick(rng))
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn current_topic(&self) -> &str {
        &self.current_topic
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    pub fn topic_change_count(&self) -> u32 {
        self.topic_change_count
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Whole seconds since the session was created.
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed().as_secs()
    }

    /// Move the start back by `by`, as if the session had been running that long.
    #[cfg(test)]
    pub(crate) fn backdated(mut self, by: Duration) -> Self {
        if let Some(start) = self.start_time.checked_sub(by) {
            self.start_time = start;
        }
        self
    }

    /// Record a user message as the next turn.
    pub fn append_user_message(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
        self.turn_count += 1;
    }

    /// Record an assistant reply. Counters are untouched.
    pub fn append_assistant_message(&mut self, text: impl Into<String>) {
        self.messages.push(Message::assistant(text));
    }

    /// Switch to `topic`: the transcript collapses to the new greeting and the turn
    /// counter restarts.
    pub fn reset_for_new_topic(&mut self, topic: impl Into<String>) {
        self.current_topic = topic.into();
        self.messages.clear();
        self.messages
            .push(Message::assistant(greeting(&self.current_topic)));
        self.turn_count = 0;
        self.topic_change_count += 1;
    }

    /// Pick a fresh topic from `pool` and reset onto it. Returns the chosen topic.
    pub fn new_topic<R: Rng>(&mut self, pool: &TopicPool, rng: &mut R) -> &str {
        let topic = pool.pick(rng).to_string();
        self.reset_for_new_topic(topic);
        &self.current_topic
    }

    /// Number of user entries since the last topic change.
    #[cfg(test)]
    pub fn user_message_count(&self) -> usize {
        self.messages.iter().filter(|m| m.role == Role::User).count()
    }

    /// The most recent assistant entry, if any.
    pub fn last_assistant_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }
}
