//! Document store implementations for Baton.

pub mod file_store;
pub mod in_memory;
pub mod noop;
pub mod ranking;

pub use file_store::FileStore;
pub use in_memory::InMemoryStore;
pub use noop::NoopStore;
pub use ranking::rank;
