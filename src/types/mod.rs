// Public modules
pub mod generation_params;
pub mod message;
pub mod model;
pub mod personality;

// Re-exports
pub use generation_params::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, GenerationParams};
pub use message::{Message, Role};
pub use model::{KnownModel, Model};
pub use personality::Personality;
