//! Post-Process Stage Definitions
//!
//! [`PostProcessStage`] is the capability contract every image-space effect
//! implements, built-in or user supplied. A stage consumes a color texture
//! (plus the read-only scene depth) and produces its own output texture.
//!
//! # Readiness
//!
//! Stages compile their pipelines in `update` and report readiness through
//! [`is_ready`](PostProcessStage::is_ready). The collection only polls this
//! flag; a stage that never becomes ready is never executed.
//!
//! # Example
//!
//! ```ignore
//! let outline = collection.add(Box::new(OutlineStage::new()));
//! collection.stage_mut(outline).unwrap().set_enabled(false);
//! ```

use std::any::Any;

use super::context::PostProcessContext;

slotmap::new_key_type! {
    /// Generational key of a stage inside its owning collection.
    pub struct StageKey;
}

/// Handle to a user stage owned by a
/// [`PostProcessCollection`](super::collection::PostProcessCollection).
///
/// The handle records which collection issued it, so passing it to a
/// different collection is detected. Once the stage is removed the handle
/// never resolves again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StageHandle {
    pub(crate) collection: u64,
    pub(crate) key: StageKey,
}

impl StageHandle {
    /// Id of the collection that issued this handle.
    #[inline]
    #[must_use]
    pub fn collection_id(&self) -> u64 {
        self.collection
    }
}

/// Image-space effect driven by the post-processing collection.
pub trait PostProcessStage<C: PostProcessContext> {
    /// Returns the stage name, used for logging.
    fn name(&self) -> &str;

    /// Whether the stage's GPU resources are usable.
    fn is_ready(&self) -> bool;

    fn is_enabled(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);

    /// Texture produced by the last successful [`execute`](Self::execute).
    ///
    /// `None` before the first execution.
    fn output_texture(&self) -> Option<C::Texture>;

    /// Prepares resources (pipeline compilation, uniform upload).
    ///
    /// Called every frame, even while disabled, so the stage can make
    /// progress towards readiness. Must not draw.
    fn update(&mut self, ctx: &mut C);

    /// Records the effect, reading `color` and `depth`.
    fn execute(&mut self, ctx: &mut C, color: &C::Texture, depth: &C::Texture);

    /// Releases transient per-frame resources.
    fn clear(&mut self, ctx: &mut C);

    /// Releases every resource owned by the stage.
    ///
    /// The collection calls this exactly once, right before dropping the stage.
    fn destroy(&mut self);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Returns `true` when the stage would run this frame.
#[inline]
pub(crate) fn is_active<C: PostProcessContext>(stage: &dyn PostProcessStage<C>) -> bool {
    stage.is_enabled() && stage.is_ready()
}
