// ABOUTME: App orchestrator — wires together completion client, log sinks, session, TUI, and debate loop.
// ABOUTME: Sets up subsystems then runs the TUI event loop until the user quits.

use std::path::Path;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;

use crate::agent::{self, DebateLoopParams};
use crate::config::{Config, Secrets};
use crate::session::{ActivityLogger, JsonlSink, Session, SheetsSink, TurnSink};
use crate::tui::runner::run_tui;
use crate::tui::state::{AgentEvent, Banner, TuiState, UserEvent};

/// Top-level application that orchestrates all subsystems.
pub struct App {
    config: Config,
    secrets: Secrets,
}

impl App {
    pub fn new(config: Config, secrets: Secrets) -> Self {
        Self { config, secrets }
    }

    /// Run the application: set up subsystems, launch the debate loop, and drive the TUI.
    pub async fn run(self) -> anyhow::Result<()> {
        let client = agent::create_client(&self.config.llm, &self.secrets.api_key)?;

        let topics = self.config.topics.to_pool();
        let mut rng = StdRng::from_os_rng();
        let session = Session::with_random_topic(&topics, &mut rng);

        let logger = build_logger(&self.config, &self.secrets, session.session_id());
        tracing::info!(
            session_id = session.session_id(),
            model = client.model(),
            sinks = logger.sink_count(),
            "starting debate session"
        );

        // Channels for debate loop <-> TUI communication.
        let (user_tx, user_rx) = mpsc::channel::<UserEvent>(16);
        let (agent_tx, agent_rx) = mpsc::channel::<AgentEvent>(64);

        let mut state = TuiState::new(client.model().to_string());
        state.banner = self.config.ui.banner.as_deref().map(load_banner);

        let loop_handle = tokio::spawn(agent::run_debate_loop(
            DebateLoopParams {
                client,
                logger,
                session,
                topics,
                rng,
            },
            user_rx,
            agent_tx,
        ));

        let user_tx_for_quit = user_tx.clone();
        let result = run_tui(state, user_tx, agent_rx).await;

        // Signal the loop to quit and wait for it.
        let _ = user_tx_for_quit.send(UserEvent::Quit).await;
        drop(user_tx_for_quit);
        match loop_handle.await {
            Ok(session) => print_exit_screen(&session),
            Err(e) => tracing::error!(error = %e, "debate loop task failed"),
        }

        result
    }
}

/// Assemble the configured log sinks. A sink that cannot be set up is skipped with a warning.
fn build_logger(config: &Config, secrets: &Secrets, session_id: &str) -> ActivityLogger {
    let mut sinks: Vec<Arc<dyn TurnSink>> = Vec::new();

    match (&secrets.sheet, config.sheet.enabled) {
        (Some(sheet), true) => {
            match SheetsSink::new(&sheet.url, &config.sheet.worksheet, &sheet.credential) {
                Ok(sink) => {
                    tracing::info!(
                        spreadsheet = sink.spreadsheet_id(),
                        service_account = sink.service_account(),
                        "sheet logging enabled"
                    );
                    sinks.push(Arc::new(sink));
                }
                Err(e) => tracing::warn!(error = %e, "sheet logging disabled"),
            }
        }
        (None, true) => tracing::warn!("sheet secrets not set, sheet logging disabled"),
        (_, false) => tracing::info!("sheet logging turned off in config"),
    }

    if config.log.jsonl {
        match JsonlSink::new_in_dir(&Config::sessions_dir(), session_id) {
            Ok(sink) => sinks.push(Arc::new(sink)),
            Err(e) => tracing::warn!(error = %e, "local turn log disabled"),
        }
    }

    ActivityLogger::new(sinks)
}

/// Read the banner file. A missing or unreadable file becomes a visible warning.
pub fn load_banner(path: &Path) -> Banner {
    match std::fs::read_to_string(path) {
        Ok(text) => Banner::Text(text.trim_end().to_string()),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to load banner");
            Banner::Warning(format!(
                "배너를 불러오지 못했습니다 ({}): {}",
                path.display(),
                e
            ))
        }
    }
}

/// Print a farewell screen after the TUI exits.
fn print_exit_screen(session: &Session) {
    println!();
    for line in farewell_lines(session) {
        println!("{line}");
    }
    println!();
}

fn farewell_lines(session: &Session) -> Vec<String> {
    let elapsed_secs = session.elapsed_secs();
    let elapsed = if elapsed_secs >= 3600 {
        format!("{}h {:02}m", elapsed_secs / 3600, (elapsed_secs % 3600) / 60)
    } else {
        format!("{}m {:02}s", elapsed_secs / 60, elapsed_secs % 60)
    };
    let started = session
        .started_at()
        .with_timezone(&chrono::Local)
        .format("%H:%M");

    vec![
        "  🗣️ \x1b[1m토론 메이트와 함께해 주셔서 고마워요!\x1b[0m".to_string(),
        String::new(),
        format!(
            "  🕐 {started}부터 {elapsed} 동안 이야기했고, 주제를 {}번 바꿨어요.",
            session.topic_change_count()
        ),
        format!("  💬 마지막 주제: {}", session.current_topic()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SheetSecrets;

    const KEY_JSON: &str = include_str!("../tests/fixtures/service_account.json");

    fn secrets(sheet: Option<SheetSecrets>) -> Secrets {
        Secrets {
            api_key: "sk".to_string(),
            sheet,
        }
    }

    #[test]
    fn missing_banner_becomes_warning() {
        let tmp = tempfile::tempdir().unwrap();
        let banner = load_banner(&tmp.path().join("로고.txt"));
        match banner {
            Banner::Warning(text) => assert!(text.contains("로고.txt")),
            other => panic!("expected warning, got {:?}", other),
        }
    }

    #[test]
    fn banner_text_is_loaded() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("banner.txt");
        std::fs::write(&path, "토론 메이트\n").unwrap();
        assert_eq!(load_banner(&path), Banner::Text("토론 메이트".to_string()));
    }

    #[test]
    fn farewell_reports_start_time_and_topic() {
        let mut session = Session::new("AI 면접관");
        session.reset_for_new_topic("원자력 발전");
        let expected_start = session
            .started_at()
            .with_timezone(&chrono::Local)
            .format("%H:%M")
            .to_string();

        let lines = farewell_lines(&session);
        assert!(lines[2].contains(&format!("{expected_start}부터")));
        assert!(lines[2].contains("1번"));
        assert!(lines[3].contains("원자력 발전"));
    }

    #[test]
    fn logger_skips_sheet_without_secrets() {
        let mut config = Config::default();
        config.log.jsonl = false;
        let logger = build_logger(&config, &secrets(None), "id");
        assert_eq!(logger.sink_count(), 0);
    }

    #[test]
    fn logger_skips_invalid_sheet_url() {
        let mut config = Config::default();
        config.log.jsonl = false;
        let sheet = SheetSecrets {
            url: "https://example.com/not-a-sheet".to_string(),
            credential: KEY_JSON.to_string(),
        };
        let logger = build_logger(&config, &secrets(Some(sheet)), "id");
        assert_eq!(logger.sink_count(), 0);
    }

    #[test]
    fn logger_uses_sheet_when_configured() {
        let mut config = Config::default();
        config.log.jsonl = false;
        let sheet = SheetSecrets {
            url: "https://docs.google.com/spreadsheets/d/abc123/edit".to_string(),
            credential: KEY_JSON.to_string(),
        };
        let logger = build_logger(&config, &secrets(Some(sheet.clone())), "id");
        assert_eq!(logger.sink_count(), 1);

        config.sheet.enabled = false;
        let logger = build_logger(&config, &secrets(Some(sheet)), "id");
        assert_eq!(logger.sink_count(), 0);
    }

    #[test]
    fn logger_skips_sheet_with_bearer_token_credential() {
        let mut config = Config::default();
        config.log.jsonl = false;
        let sheet = SheetSecrets {
            url: "https://docs.google.com/spreadsheets/d/abc123/edit".to_string(),
            credential: "ya29.short-lived-token".to_string(),
        };
        let logger = build_logger(&config, &secrets(Some(sheet)), "id");
        assert_eq!(logger.sink_count(), 0);
    }
}
