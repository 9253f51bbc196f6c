//! Chat with DuckChat in the terminal.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

use duck_chat::config::AppConfig;
use duck_chat::core::{Error, Session, SessionBuilder, TurnOutcome};
use duck_chat::input::LineReader;
use duck_chat::{SYSTEM_PROMPT, build_registry};
use duck_chat_openai_model::OpenAIProvider;
use duck_chat_search::DuckDuckGo;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, BufReader};
use tokio::select;
use tokio::signal;
use tokio::sync::mpsc;

enum TurnEvent {
    Finished(Result<TurnOutcome, Error>),
    Interrupted,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };
    debug!("starting with {config:?}");

    let (call_tx, mut call_rx) = mpsc::unbounded_channel();
    let registry = Arc::new(build_registry(Arc::new(DuckDuckGo::default())));
    let mut session =
        SessionBuilder::with_model_provider(OpenAIProvider::new(config.openai))
            .with_registry(registry)
            .with_system_prompt(SYSTEM_PROMPT)
            .with_transcript_dir(config.conversations_dir)
            .on_function_call(move |call| {
                call_tx.send(call.name.clone()).ok();
            })
            .build();

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    let mut input = LineReader::new(BufReader::new(io::stdin()));
    loop {
        print!("{} ", "You:".bright_green().bold());
        std::io::stdout().flush().unwrap();

        let line = select! {
            line = input.next_line() => line,
            _ = signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            println!();
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(progress_style.clone());
        progress_bar.set_message("🤔 Thinking...");
        progress_bar.enable_steady_tick(Duration::from_millis(100));

        let event = run_turn(&mut session, line, &mut call_rx, &progress_bar).await;
        progress_bar.finish_and_clear();

        match event {
            TurnEvent::Finished(Ok(TurnOutcome::Reply(reply))) => {
                println!("{} {}", "Bot:".bright_cyan().bold(), reply);
            }
            TurnEvent::Finished(Ok(TurnOutcome::Ended(path))) => {
                println!("{}", "Bye!".bright_cyan());
                eprintln!("Conversation saved to {}", path.display());
                return;
            }
            TurnEvent::Finished(Err(err)) => {
                eprintln!("{} {err}", "error:".bright_red().bold());
            }
            TurnEvent::Interrupted => {
                println!();
                break;
            }
        }
    }

    match session.end() {
        Ok(path) => eprintln!("Conversation saved to {}", path.display()),
        Err(err) => error!("failed to end the session: {err}"),
    }
}

/// Runs one turn, showing function calls on the spinner until it finishes
/// or the user interrupts it.
async fn run_turn(
    session: &mut Session,
    line: &str,
    call_rx: &mut mpsc::UnboundedReceiver<String>,
    progress_bar: &ProgressBar,
) -> TurnEvent {
    let turn = session.send_user_message(line);
    tokio::pin!(turn);

    loop {
        select! {
            outcome = &mut turn => return TurnEvent::Finished(outcome),
            Some(name) = call_rx.recv() => {
                progress_bar.set_message(format!("🔎 Calling {name}..."));
            }
            _ = signal::ctrl_c() => return TurnEvent::Interrupted,
        }
    }
}
