use colored::Colorize;
use thiserror::Error;

/// Errors raised while talking to the chat endpoint.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("A reply is still streaming; wait for it to finish")]
    Busy,

    #[error("Message is empty")]
    EmptyInput,

    /// The endpoint answered with a non-success status.
    #[error("Chat endpoint returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Voice input error: {0}")]
    Speech(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

pub fn handle_error(err: anyhow::Error) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), err);
    print_suggestion(&err.to_string());
    std::process::exit(1);
}

/// Hints for failures the user can fix themselves.
pub fn print_suggestion(message: &str) {
    let msg = message.to_lowercase();

    if msg.contains("connection refused") || msg.contains("error sending request") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Make sure the VitaBot server is running:");
        eprintln!("  {} cargo run -p vitabot-server", "$".dimmed());
    }

    if msg.contains("api_key") || msg.contains("not set in environment") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  The server needs a model API key, e.g.:");
        eprintln!("  {} export OPENAI_API_KEY=<value>", "$".dimmed());
    }
}
