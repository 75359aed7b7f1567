pub mod file_store;
pub mod memory_store;
pub mod voice_agent;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;
pub use voice_agent::MockVoiceAgent;
