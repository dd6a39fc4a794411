//! Infrastructure layer: boundary traits for the collaborators a tree reports to

pub mod traits;

pub use traits::{ArenaStore, MemoryStore};
