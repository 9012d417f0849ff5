//! Chat client for the VitaBot endpoint.

pub mod conversation;
pub mod error;
pub mod session;
pub mod speech;
pub mod transport;
pub mod view;

pub use conversation::{ChatMessage, Conversation, MessageStatus, Role};
pub use error::{ClientError, Result};
pub use session::{ChatSession, ChatView, TurnOutcome};
pub use speech::{CommandSpeech, SpeechInput, Unsupported};
pub use transport::{ChatTransport, DEFAULT_ENDPOINT, FragmentStream, HttpTransport};
pub use view::TerminalView;
