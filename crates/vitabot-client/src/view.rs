use std::io::{self, Write};

use colored::Colorize;

use crate::conversation::{Conversation, MessageStatus, Role};
use crate::error::{ClientError, print_suggestion};
use crate::session::ChatView;

const CONTENT_WIDTH: usize = 49;

pub const PLACEHOLDER: &str = "Enter your allergies, symptoms, and health goals here...";

pub fn show_welcome(voice_enabled: bool) -> io::Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    let border = format!("╭{}╮", "─".repeat(CONTENT_WIDTH + 2));
    let footer = format!("╰{}╯", "─".repeat(CONTENT_WIDTH + 2));
    let print_row = |text: &str| {
        println!("│ {:<CONTENT_WIDTH$} │", text, CONTENT_WIDTH = CONTENT_WIDTH);
    };

    println!();
    println!("{}", border);
    print_row(&format!("VITABOT (v{})", version));
    print_row("Your personalized supplements recommender");
    print_row("");
    print_row(PLACEHOLDER);
    print_row("");
    print_row("   /reset  -> Start a new conversation");
    if voice_enabled {
        print_row("   /voice  -> Speak your message");
    } else {
        print_row("   /voice  -> (not available)");
    }
    print_row("   /quit   -> Exit");
    println!("{}\n", footer);

    io::stdout().flush()
}

/// Prints only what changed since the last render, so a streamed reply
/// appears fragment by fragment.
pub struct TerminalView<W: Write> {
    out: W,
    /// Index of the assistant message currently being printed.
    open: Option<usize>,
    /// Bytes of that message already printed.
    shown: usize,
    /// Messages before this index are fully printed.
    next: usize,
}

impl TerminalView<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            open: None,
            shown: 0,
            next: 0,
        }
    }

    pub fn reset(&mut self) {
        self.open = None;
        self.shown = 0;
        self.next = 0;
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_reply(&mut self, conversation: &Conversation) -> io::Result<()> {
        let Some((index, message)) = conversation.messages().iter().enumerate().last() else {
            return Ok(());
        };
        if message.role != Role::Assistant || index < self.next {
            return Ok(());
        }

        if self.open != Some(index) {
            write!(self.out, "{} ", "VitaBot:".green().bold())?;
            self.open = Some(index);
            self.shown = 0;
        }

        if let Some(delta) = message.content.get(self.shown..) {
            write!(self.out, "{}", delta)?;
        }
        self.shown = message.content.len();

        match message.status {
            MessageStatus::Streaming => {}
            MessageStatus::Complete => self.close(index)?,
            MessageStatus::Interrupted => {
                self.close(index)?;
                writeln!(self.out, "{}", "(reply interrupted)".dimmed())?;
            }
        }
        self.out.flush()
    }

    fn close(&mut self, index: usize) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out)?;
        self.open = None;
        self.next = index + 1;
        Ok(())
    }
}

impl<W: Write> ChatView for TerminalView<W> {
    fn render(&mut self, conversation: &Conversation) {
        if let Err(e) = self.write_reply(conversation) {
            tracing::warn!(error = %e, "Failed to write reply");
        }
    }

    fn on_error(&mut self, error: &ClientError) {
        eprintln!("{} {}", "Error:".red().bold(), error);
        print_suggestion(&error.to_string());
    }
}
