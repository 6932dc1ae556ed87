//! Core domain logic for the `td` todo list manager.
//!
//! This crate holds everything about tasks and their context tree that does
//! not touch storage: the dotted-path codec, the visibility/relevance
//! algorithm, the display ordering, the recurrence arithmetic, moment
//! parsing, and the text-editor round-trip for free-form task bodies.

pub mod context;
pub mod editor;
pub mod error;
pub mod moment;
pub mod order;
pub mod path;
pub mod recurrence;
pub mod task;
pub mod visibility;

/// Core result type used throughout the td system.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type.
pub use error::Error;

/// Context tree node and subtree aggregates.
pub use context::{Context, ContextTally};

/// Task and the owning-context attributes it carries.
pub use task::{ContextRef, Task};

/// How far up the context tree a task bleeds into listings.
pub use visibility::Visibility;
