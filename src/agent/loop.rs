// ABOUTME: Debate loop — drives one session: user turn in, prompt out, streamed reply back, turn logged.
// ABOUTME: Owns the Session exclusively and processes one user event at a time.

use std::sync::Arc;

use futures::StreamExt;
use rand::rngs::StdRng;
use tokio::sync::mpsc;

use crate::agent::provider::CompletionClient;
use crate::prompt::build_system_prompt;
use crate::session::{ActivityLogger, Session};
use crate::topic::TopicPool;
use crate::tui::state::{AgentEvent, UserEvent};

/// Prefix marking a reply that was substituted for a failed completion.
pub const FAILURE_MARKER: &str = "⚠️";

/// Reply text used in place of a failed completion.
pub fn fallback_reply(error: &str) -> String {
    format!("{FAILURE_MARKER} 응답을 생성하는 중 오류가 발생했습니다: {error}")
}

/// Bundled parameters for the debate loop.
pub struct DebateLoopParams {
    pub client: Arc<dyn CompletionClient>,
    pub logger: ActivityLogger,
    pub session: Session,
    pub topics: TopicPool,
    pub rng: StdRng,
}

/// Run the debate loop until the user quits or the channel closes.
///
/// Announces the session's opening topic first, then handles each user event to
/// completion before reading the next one. Returns the final session state.
pub async fn run_debate_loop(
    params: DebateLoopParams,
    mut user_rx: mpsc::Receiver<UserEvent>,
    agent_tx: mpsc::Sender<AgentEvent>,
) -> Session {
    let DebateLoopParams {
        client,
        logger,
        mut session,
        topics,
        mut rng,
    } = params;

    tracing::info!(
        session_id = session.session_id(),
        topic = session.current_topic(),
        "session started"
    );
    announce_topic(&session, &agent_tx).await;

    while let Some(event) = user_rx.recv().await {
        match event {
            UserEvent::Quit => break,
            UserEvent::NewTopic => {
                session.new_topic(&topics, &mut rng);
                tracing::info!(
                    topic = session.current_topic(),
                    changes = session.topic_change_count(),
                    "topic changed"
                );
                announce_topic(&session, &agent_tx).await;
                let _ = agent_tx.send(AgentEvent::Done).await;
            }
            UserEvent::Message(text) => {
                debate_turn(client.as_ref(), &logger, &mut session, text, &agent_tx).await;
                let _ = agent_tx.send(AgentEvent::Done).await;
            }
        }
    }

    tracing::info!(
        session_id = session.session_id(),
        elapsed_secs = session.elapsed_secs(),
        "session ended"
    );
    session
}

async fn announce_topic(session: &Session, agent_tx: &mpsc::Sender<AgentEvent>) {
    let greeting = session
        .messages()
        .first()
        .map(|m| m.content.clone())
        .unwrap_or_default();
    let _ = agent_tx
        .send(AgentEvent::TopicStarted {
            topic: session.current_topic().to_string(),
            greeting,
            topic_change_count: session.topic_change_count(),
        })
        .await;
}

/// Execute one full turn: record the user message, stream the reply, log the turn.
async fn debate_turn(
    client: &dyn CompletionClient,
    logger: &ActivityLogger,
    session: &mut Session,
    text: String,
    agent_tx: &mpsc::Sender<AgentEvent>,
) {
    session.append_user_message(text.clone());
    let turn = session.turn_count();
    let _ = agent_tx.send(AgentEvent::TurnStarted { turn }).await;

    let system_prompt = build_system_prompt(session.current_topic(), turn);
    let reply = match stream_reply(client, &system_prompt, session, agent_tx).await {
        Ok(reply) => {
            let _ = agent_tx.send(AgentEvent::TextDone).await;
            reply
        }
        Err(e) => {
            tracing::warn!(turn, error = %e, "completion failed");
            let fallback = fallback_reply(&e.to_string());
            let _ = agent_tx.send(AgentEvent::ReplyFailed(fallback.clone())).await;
            fallback
        }
    };
    session.append_assistant_message(reply.clone());

    let failures = logger.log_turn(session, &text, &reply).await;
    if !failures.is_empty() {
        let _ = agent_tx
            .send(AgentEvent::LogFailed(failures.join("; ")))
            .await;
    }
}

/// Stream a reply, forwarding each fragment to the TUI. Any error discards the
/// partial text.
async fn stream_reply(
    client: &dyn CompletionClient,
    system_prompt: &str,
    session: &Session,
    agent_tx: &mpsc::Sender<AgentEvent>,
) -> Result<String, crate::error::CompletionError> {
    let mut stream = client.stream_reply(system_prompt, session.messages());
    let mut reply = String::new();

    while let Some(fragment) = stream.next().await {
        let fragment = fragment?;
        reply.push_str(&fragment);
        let _ = agent_tx.send(AgentEvent::TextDelta(fragment)).await;
    }

    Ok(reply)
}
