// Public modules
pub mod accumulating_stream;
pub mod backend;
pub mod chat;
pub mod client_logger;
pub mod error;
pub mod render;
pub mod session;
pub mod sse;
pub mod transcript;
pub mod types;

mod observability;

// Re-exports
pub use accumulating_stream::AccumulatingStream;
pub use backend::{BackendKind, CompletionBackend, FragmentStream, Gemini, Groq};
pub use client_logger::{CompletionLogger, FileLogger};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, Renderer};
pub use session::{HistoryPolicy, Session};
pub use transcript::{Transcript, VisibleMessages};
pub use types::*;
