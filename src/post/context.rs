//! GPU context seam for the post-processing collection.
//!
//! The collection never touches the device directly. Everything it needs from
//! the graphics backend (texture handles, render targets and the full-screen
//! copy command) goes through [`PostProcessContext`]. Stages receive the same
//! context in `update`, `execute` and `clear`.
//!
//! [`WgpuPostContext`](super::wgpu_context::WgpuPostContext) is the wgpu
//! implementation.

use std::fmt::Debug;

/// Per-frame graphics context consumed by the collection and its stages.
pub trait PostProcessContext {
    /// Handle to a sampled color or depth texture.
    ///
    /// Cloning must be cheap: the collection clones the current chain texture
    /// once per executed stage.
    type Texture: Clone + Debug;

    /// Render target that [`execute_copy`](Self::execute_copy) writes into.
    type Framebuffer;

    /// A cached full-screen pass-through draw command.
    type CopyCommand;

    /// Builds the full-screen copy command.
    ///
    /// Called at most once per collection; the result is cached and reused
    /// for every later copy.
    fn create_copy_command(&mut self) -> Self::CopyCommand;

    /// Records the cached copy command, sampling `source` and writing it
    /// unmodified into `target`.
    fn execute_copy(
        &mut self,
        command: &mut Self::CopyCommand,
        source: &Self::Texture,
        target: &Self::Framebuffer,
    );
}
