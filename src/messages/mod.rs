pub mod session;
pub mod storage;
pub mod types;

pub use session::{ChatSession, Reply};
pub use storage::MessageStorage;
pub use types::{ChatMessage, MessageMetadata, Role};
