// ABOUTME: Topic pool — the fixed set of debate prompts and the random picker.
// ABOUTME: Picks are uniform and independent, so the same topic may come up twice in a row.

use rand::Rng;

/// Default debate prompts offered to users.
pub const DEFAULT_TOPICS: &[&str] = &[
    "재택근무, 계속 확대되어야 할까요?",
    "AI 면접 도입, 공정한 채용일까요?",
    "출산 장려 정책, 효과가 있을까요?",
    "기후 변화 대응, 개인의 책임도 클까요?",
    "학벌 중심 사회, 과연 공정한가요?",
];

/// A non-empty, ordered set of candidate topics.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicPool {
    topics: Vec<String>,
}

impl TopicPool {
    /// Build a pool from the given topics. Returns `None` when no usable topic remains
    /// after blank entries are dropped.
    pub fn new<I, S>(topics: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let topics: Vec<String> = topics
            .into_iter()
            .map(Into::into)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        if topics.is_empty() {
            None
        } else {
            Some(Self { topics })
        }
    }

    /// All topics in configured order.
    #[cfg(test)]
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    #[cfg(test)]
    pub fn contains(&self, topic: &str) -> bool {
        self.topics.iter().any(|t| t == topic)
    }

    /// Pick one topic uniformly at random.
    pub fn pick<R: Rng>(&self, rng: &mut R) -> &str {
        let idx = rng.random_range(0..self.topics.len());
        &self.topics[idx]
    }
}

impl Default for TopicPool {
    fn default() -> Self {
        Self {
            topics: DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
        }
    }
}
