use clap::{Parser, Subcommand};
use clap_complete::Shell;

use vitabot_client::DEFAULT_ENDPOINT;

#[derive(Parser)]
#[command(name = "vitabot")]
#[command(version, about = "VitaBot - personalized supplements recommender chat")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Chat endpoint URL
    #[arg(long, env = "VITABOT_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Speech recognizer command; prints the transcript on stdout
    #[arg(long, env = "VITABOT_SPEECH_COMMAND")]
    pub speech_command: Option<String>,

    /// Send a single message, print the reply and exit
    #[arg(short, long)]
    pub message: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}
