//! Kernel module - server infrastructure and dependencies.

pub mod csrf;
pub mod memory_store;
pub mod password;
pub mod postgres_store;
pub mod renderer;
pub mod traits;

pub use csrf::RandomCsrfTokens;
pub use memory_store::MemoryRecordStore;
pub use password::Argon2Hasher;
pub use postgres_store::PgRecordStore;
pub use renderer::JsonRenderer;
pub use traits::*;
