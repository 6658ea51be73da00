// ABOUTME: System prompt builder — picks the per-turn debate instruction from topic and turn count.
// ABOUTME: Templates are compiled in from src/prompts/*.md and carry a {topic} placeholder.

/// Compiled-in instruction templates.
const ADVANCE_TEMPLATE: &str = include_str!("prompts/advance.md");
const SUMMARIZE_TEMPLATE: &str = include_str!("prompts/summarize.md");

const TOPIC_PLACEHOLDER: &str = "{topic}";

/// From this turn on, the model recaps instead of pushing the debate forward.
pub const SUMMARY_THRESHOLD: u32 = 5;

/// Which instruction governs the next reply. Moves forward only within a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptPhase {
    /// Take a stance, counter the user, ask a follow-up.
    Early,
    /// Summarize prior turns, surface viewpoints, re-engage without concluding.
    Late,
}

impl PromptPhase {
    pub fn for_turn(turn_count: u32) -> Self {
        if turn_count >= SUMMARY_THRESHOLD {
            Self::Late
        } else {
            Self::Early
        }
    }

    fn template(self) -> &'static str {
        match self {
            Self::Early => ADVANCE_TEMPLATE,
            Self::Late => SUMMARIZE_TEMPLATE,
        }
    }
}

/// Build the hidden system instruction for the reply to turn `turn_count`.
pub fn build_system_prompt(topic: &str, turn_count: u32) -> String {
    PromptPhase::for_turn(turn_count)
        .template()
        .replace(TOPIC_PLACEHOLDER, topic)
        .trim_end()
        .to_string()
}
