// ABOUTME: TUI event loop — multiplexes terminal input and debate-loop events, redrawing after each.
// ABOUTME: Owns terminal setup/teardown so the screen is restored even when the loop errors.

use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyEventKind};
use futures::StreamExt;
use ratatui::DefaultTerminal;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::tui::input::{InputResult, handle_key};
use crate::tui::state::{AgentEvent, ChatMessageKind, TuiState, UserEvent};
use crate::tui::ui;

/// Redraw at least this often so the elapsed-time counter keeps ticking.
const TICK: Duration = Duration::from_secs(1);

/// What the runner should do after handling one input.
#[derive(Debug, PartialEq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Take over the terminal and drive the TUI until the user quits.
pub async fn run_tui(
    mut state: TuiState,
    user_tx: mpsc::Sender<UserEvent>,
    agent_rx: mpsc::Receiver<AgentEvent>,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();
    let result = drive(&mut terminal, &mut state, &user_tx, agent_rx).await;
    ratatui::restore();
    result
}

async fn drive(
    terminal: &mut DefaultTerminal,
    state: &mut TuiState,
    user_tx: &mpsc::Sender<UserEvent>,
    agent_rx: mpsc::Receiver<AgentEvent>,
) -> anyhow::Result<()> {
    let mut terminal_events = EventStream::new();
    let mut agent_events = ReceiverStream::new(agent_rx);
    let mut tick = tokio::time::interval(TICK);

    loop {
        terminal.draw(|frame| ui::render(frame, state))?;

        tokio::select! {
            maybe_event = terminal_events.next() => match maybe_event {
                Some(Ok(event)) => {
                    if handle_terminal_event(state, user_tx, event).await == Flow::Quit {
                        break;
                    }
                }
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            maybe_agent = agent_events.next() => match maybe_agent {
                Some(event) => state.apply_agent_event(event),
                // The debate loop is gone; nothing more can happen.
                None => break,
            },
            _ = tick.tick() => {}
        }
    }

    Ok(())
}

/// Apply one terminal event, forwarding any resulting user event to the debate loop.
pub async fn handle_terminal_event(
    state: &mut TuiState,
    user_tx: &mpsc::Sender<UserEvent>,
    event: Event,
) -> Flow {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => match handle_key(state, key) {
            InputResult::None => Flow::Continue,
            InputResult::Send(text) => {
                state.push_message(ChatMessageKind::User, text.clone());
                send_locked(state, user_tx, UserEvent::Message(text)).await
            }
            InputResult::NewTopic => send_locked(state, user_tx, UserEvent::NewTopic).await,
            InputResult::Quit => {
                let _ = user_tx.send(UserEvent::Quit).await;
                Flow::Quit
            }
        },
        Event::Paste(text) if !state.streaming => {
            state.insert_str_at_cursor(&text);
            Flow::Continue
        }
        _ => Flow::Continue,
    }
}

/// Send an event that occupies the debate loop; input stays locked until `Done`.
async fn send_locked(
    state: &mut TuiState,
    user_tx: &mpsc::Sender<UserEvent>,
    event: UserEvent,
) -> Flow {
    state.streaming = true;
    if user_tx.send(event).await.is_err() {
        tracing::error!("debate loop stopped accepting events");
        return Flow::Quit;
    }
    Flow::Continue
}
