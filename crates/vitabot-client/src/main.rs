mod cli;
mod completions;

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use vitabot_client::error::handle_error;
use vitabot_client::speech::{self, SpeechInput};
use vitabot_client::view::{self, TerminalView};
use vitabot_client::{ChatSession, ClientError, HttpTransport, TurnOutcome};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Some(Commands::Completions { shell }) = cli.command {
        completions::generate_completions(shell);
        return ExitCode::SUCCESS;
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => handle_error(e),
    }
}

/// Logs go to stderr so they never interleave with a streamed reply.
fn init_logging(verbose: bool) {
    if !verbose && std::env::var_os("RUST_LOG").is_none() {
        return;
    }
    let default = if verbose { "vitabot=debug,vitabot_client=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_target(false)
        .init();
}

/// A one-shot message whose reply fails exits with a failure code; the view
/// has already printed the error.
async fn run(cli: Cli) -> Result<ExitCode> {
    let transport = Arc::new(HttpTransport::new(cli.endpoint));
    tracing::debug!(endpoint = %transport.endpoint(), "Using chat endpoint");
    let mut session = ChatSession::new(transport);
    let mut terminal = TerminalView::stdout();

    if let Some(message) = cli.message {
        return match session.submit(&message, &mut terminal).await? {
            TurnOutcome::Complete => Ok(ExitCode::SUCCESS),
            TurnOutcome::Failed => Ok(ExitCode::FAILURE),
        };
    }

    let speech = speech::from_command(cli.speech_command.as_deref());
    view::show_welcome(speech.is_supported())?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let text = match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                session.reset()?;
                terminal.reset();
                println!("{}\n", "Started a new conversation.".dimmed());
                continue;
            }
            "/voice" => match capture_voice(speech.as_ref()).await {
                Some(text) => text,
                None => continue,
            },
            _ => line,
        };

        match session.submit(&text, &mut terminal).await {
            Ok(_) | Err(ClientError::EmptyInput) => {}
            Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn capture_voice(speech: &dyn SpeechInput) -> Option<String> {
    if !speech.is_supported() {
        println!(
            "{}",
            "Voice input is not available. Set VITABOT_SPEECH_COMMAND to enable it.".yellow()
        );
        return None;
    }

    println!("{}", "Listening...".dimmed());
    match speech.capture().await {
        Ok(Some(text)) => {
            println!("{} {}", "You said:".cyan(), text);
            Some(text)
        }
        Ok(None) => {
            println!("{}", "Nothing was recognized.".dimmed());
            None
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            None
        }
    }
}

fn prompt() -> std::io::Result<()> {
    print!("{} ", ">".cyan().bold());
    std::io::stdout().flush()
}
