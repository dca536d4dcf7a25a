//! Error Types
//!
//! This module defines the error types used by the post-processing collection.
//!
//! # Overview
//!
//! Most collection operations are infallible by construction: ownership
//! violations on `remove`/`contains` degrade to `false`, and a stage that never
//! becomes ready is simply never executed. [`PostProcessError`] only covers the
//! checked accessors that let callers opt into a `Result` instead of a
//! debug-time contract failure.
//!
//! ```rust,ignore
//! use myth_postfx::errors::{PostProcessError, Result};
//!
//! fn first_stage_name(collection: &mut Collection) -> Result<String> {
//!     Ok(collection.try_get(0)?.name().to_owned())
//! }
//! ```

use thiserror::Error;

/// The error type for checked post-processing collection accessors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PostProcessError {
    // ========================================================================
    // Registry Errors
    // ========================================================================
    /// A stage index outside `[0, length)` was requested.
    #[error("Post-process stage index out of bounds: {index} (length: {length})")]
    StageIndexOutOfBounds {
        /// The invalid index
        index: usize,
        /// Number of stages in the collection after compaction
        length: usize,
    },

    /// The handle was issued by a different collection, or its stage has
    /// already been removed.
    #[error("Post-process stage is not owned by this collection")]
    ForeignStage,
}

/// Alias for `Result<T, PostProcessError>`.
pub type Result<T> = std::result::Result<T, PostProcessError>;
