//! Helpline: a terminal chat assistant primed with few-shot empathetic dialogues.
//!
//! Startup samples a fixed set of example dialogues, renders them into a
//! system primer, and hands out [`Session`]s that forward each user turn,
//! with the full history, to a chat-completion service.

pub mod app;
pub mod commands;
pub mod config;
pub mod dataset;
pub mod error;
pub mod events;
pub mod llm;
pub mod prompts;
pub mod sampler;
pub mod session;
pub mod transcript;
pub mod ui;

pub use app::Helpline;
pub use config::Config;
pub use dataset::DialogueExample;
pub use error::{CallError, StartupError, ValidationWarning};
pub use events::{Message, Role, SessionEvent};
pub use llm::{CompletionClient, OpenAiClient};
pub use sampler::{NUM_EXAMPLES, SAMPLE_SEED, SampledSet};
pub use session::{Session, Turn};
pub use transcript::Transcript;
