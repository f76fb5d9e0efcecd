//! This is the railbird-store crate - persistence backends for the settlement engine

pub mod factory;
pub mod memory;
pub mod postgres;
pub mod traits;

pub use factory::{open_store, StoreHandles};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use traits::{ManualStakerDirectory, StakeStore, Versioned};
