//! Post-Process Collection
//!
//! [`PostProcessCollection`] owns an ordered set of user stages plus the three
//! built-in stages, and chains them over the rendered color buffer once per
//! frame.
//!
//! # Execution Order
//!
//! ```text
//! color ─▶ [AO] ─▶ [Bloom] ─▶ user stage 0 ─▶ … ─▶ user stage N ─▶ [FXAA] ─▶ output
//!                                   depth (read-only) ──▶ every stage
//! ```
//!
//! Bracketed stages are skipped unless enabled and ready; user stages are
//! skipped under the same rule. Each stage that runs reads the output of the
//! previous one that ran, so the final texture is always the true chain
//! terminus.
//!
//! # Registry
//!
//! User stages live in a vector of optional slots. Removing a stage empties its
//! slot and marks the sequence dirty; the next index-dependent operation
//! (`get`, `index_of`, `update`, `execute`) compacts the vector once,
//! reassigning indices by position. This keeps a burst of removals linear.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};

use slotmap::SlotMap;

use super::builtin::{BuiltinStage, BuiltinStages};
use super::context::PostProcessContext;
use super::settings::PostProcessSettings;
use super::stage::{PostProcessStage, StageHandle, StageKey, is_active};
use crate::errors::{PostProcessError, Result};

static NEXT_COLLECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Built-ins in the order they receive `update` and `clear`.
const BUILTIN_UPDATE_ORDER: [BuiltinStage; 3] = [
    BuiltinStage::Fxaa,
    BuiltinStage::AmbientOcclusion,
    BuiltinStage::Bloom,
];

/// The stage whose output is the collection's externally visible texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainTerminus {
    /// Nothing would run; the caller's own color texture stays authoritative.
    Input,
    AmbientOcclusion,
    Bloom,
    /// The last active user stage.
    User(StageHandle),
    Fxaa,
}

struct StageSlot<C: PostProcessContext> {
    key: StageKey,
    stage: Box<dyn PostProcessStage<C>>,
}

/// Ordered post-processing pipeline with fixed AO / bloom / FXAA built-ins.
///
/// # Example
///
/// ```ignore
/// let mut post = PostProcessCollection::new(builtins);
/// let outline = post.add(Box::new(OutlineStage::new()));
///
/// // every frame
/// post.update(&mut ctx);
/// post.execute(&mut ctx, &scene_color, &scene_depth);
/// post.copy(&mut ctx, &surface_view);
/// post.clear(&mut ctx);
/// ```
pub struct PostProcessCollection<C: PostProcessContext> {
    id: u64,

    // === Registry ===
    /// Stage sequence; `None` marks a stage removed since the last compaction.
    slots: Vec<Option<StageSlot<C>>>,
    /// Current slot index of every live stage.
    indices: SlotMap<StageKey, usize>,
    needs_compaction: bool,

    // === Per-frame scratch ===
    /// Slot indices of the stages that run this frame. Rebuilt by `execute`.
    active: Vec<usize>,

    builtins: BuiltinStages<C>,

    /// Full-screen copy command, built on the first `copy`.
    copy_command: Option<C::CopyCommand>,
    destroyed: bool,
}

impl<C: PostProcessContext> PostProcessCollection<C> {
    /// Creates a collection with default settings: ambient occlusion and bloom
    /// disabled, FXAA enabled.
    pub fn new(builtins: BuiltinStages<C>) -> Self {
        Self::with_settings(builtins, &PostProcessSettings::default())
    }

    /// Creates a collection and applies `settings` to the built-ins.
    pub fn with_settings(builtins: BuiltinStages<C>, settings: &PostProcessSettings) -> Self {
        let mut collection = Self {
            id: NEXT_COLLECTION_ID.fetch_add(1, Ordering::Relaxed),
            slots: Vec::new(),
            indices: SlotMap::with_key(),
            needs_compaction: false,
            active: Vec::new(),
            builtins,
            copy_command: None,
            destroyed: false,
        };
        collection.apply_settings(settings);
        collection
    }

    /// Process-unique id of this collection. Handles carry it.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    // ========================================================================
    // Settings & built-ins
    // ========================================================================

    /// Sets the enable flag of each built-in from `settings`.
    pub fn apply_settings(&mut self, settings: &PostProcessSettings) {
        for which in BuiltinStage::ALL {
            self.builtins
                .get_mut(which)
                .set_enabled(settings.is_enabled(which));
        }
    }

    /// Snapshot of the built-ins' current enable flags.
    #[must_use]
    pub fn settings(&self) -> PostProcessSettings {
        let mut settings = PostProcessSettings::disabled();
        for which in BuiltinStage::ALL {
            settings.set_enabled(which, self.builtins.get(which).is_enabled());
        }
        settings
    }

    #[inline]
    #[must_use]
    pub fn builtin(&self, which: BuiltinStage) -> &dyn PostProcessStage<C> {
        self.builtins.get(which)
    }

    #[inline]
    pub fn builtin_mut(&mut self, which: BuiltinStage) -> &mut dyn PostProcessStage<C> {
        self.builtins.get_mut(which)
    }

    #[inline]
    #[must_use]
    pub fn ambient_occlusion(&self) -> &dyn PostProcessStage<C> {
        self.builtins.ambient_occlusion.as_ref()
    }

    #[inline]
    pub fn ambient_occlusion_mut(&mut self) -> &mut dyn PostProcessStage<C> {
        self.builtins.ambient_occlusion.as_mut()
    }

    #[inline]
    #[must_use]
    pub fn bloom(&self) -> &dyn PostProcessStage<C> {
        self.builtins.bloom.as_ref()
    }

    #[inline]
    pub fn bloom_mut(&mut self) -> &mut dyn PostProcessStage<C> {
        self.builtins.bloom.as_mut()
    }

    #[inline]
    #[must_use]
    pub fn fxaa(&self) -> &dyn PostProcessStage<C> {
        self.builtins.fxaa.as_ref()
    }

    #[inline]
    pub fn fxaa_mut(&mut self) -> &mut dyn PostProcessStage<C> {
        self.builtins.fxaa.as_mut()
    }

    // ========================================================================
    // Registry
    // ========================================================================

    /// Appends a stage to the end of the user sequence and takes ownership.
    pub fn add(&mut self, stage: Box<dyn PostProcessStage<C>>) -> StageHandle {
        let index = self.slots.len();
        let key = self.indices.insert(index);
        log::debug!("Adding post-process stage '{}' at index {index}", stage.name());
        self.slots.push(Some(StageSlot { key, stage }));
        StageHandle {
            collection: self.id,
            key,
        }
    }

    /// Removes and destroys a stage.
    ///
    /// Returns `false` without side effects if the stage is not owned by this
    /// collection (including when it was already removed).
    pub fn remove(&mut self, handle: StageHandle) -> bool {
        if handle.collection != self.id {
            return false;
        }
        let Some(index) = self.indices.remove(handle.key) else {
            return false;
        };
        let Some(mut slot) = self.slots.get_mut(index).and_then(Option::take) else {
            return false;
        };

        self.needs_compaction = true;
        log::debug!("Removing post-process stage '{}'", slot.stage.name());
        slot.stage.destroy();
        true
    }

    /// Returns `true` if `handle` refers to a stage currently owned by this
    /// collection.
    #[inline]
    #[must_use]
    pub fn contains(&self, handle: StageHandle) -> bool {
        handle.collection == self.id && self.indices.contains_key(handle.key)
    }

    /// Number of user stages.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Returns the user stage at `index`.
    ///
    /// # Panics
    ///
    /// `index` must be in `[0, len())`. Use [`try_get`](Self::try_get) for a
    /// checked variant.
    pub fn get(&mut self, index: usize) -> &dyn PostProcessStage<C> {
        self.compact();
        debug_assert!(
            index < self.slots.len(),
            "post-process stage index {index} out of range (length {})",
            self.slots.len()
        );
        match self.try_get(index) {
            Ok(stage) => stage,
            Err(err) => panic!("{err}"),
        }
    }

    /// Mutable variant of [`get`](Self::get).
    pub fn get_mut(&mut self, index: usize) -> &mut dyn PostProcessStage<C> {
        self.compact();
        let length = self.slots.len();
        debug_assert!(
            index < length,
            "post-process stage index {index} out of range (length {length})"
        );
        match self.slots.get_mut(index) {
            Some(Some(slot)) => slot.stage.as_mut(),
            _ => panic!("{}", PostProcessError::StageIndexOutOfBounds { index, length }),
        }
    }

    /// Checked variant of [`get`](Self::get).
    pub fn try_get(&mut self, index: usize) -> Result<&dyn PostProcessStage<C>> {
        self.compact();
        let length = self.slots.len();
        self.slots
            .get(index)
            .and_then(Option::as_ref)
            .map(|slot| slot.stage.as_ref())
            .ok_or(PostProcessError::StageIndexOutOfBounds { index, length })
    }

    /// Current index of a stage, compacting pending removals first.
    pub fn index_of(&mut self, handle: StageHandle) -> Option<usize> {
        if !self.contains(handle) {
            return None;
        }
        self.compact();
        self.indices.get(handle.key).copied()
    }

    #[must_use]
    pub fn stage(&self, handle: StageHandle) -> Option<&dyn PostProcessStage<C>> {
        self.slot(handle).map(|slot| slot.stage.as_ref())
    }

    pub fn stage_mut(&mut self, handle: StageHandle) -> Option<&mut dyn PostProcessStage<C>> {
        if !self.contains(handle) {
            return None;
        }
        let index = self.indices[handle.key];
        let slot = self.slots.get_mut(index)?.as_mut()?;
        let stage: &mut dyn PostProcessStage<C> = slot.stage.as_mut();
        Some(stage)
    }

    /// Like [`stage`](Self::stage), but reports a foreign or removed handle
    /// as an error.
    pub fn try_stage(&self, handle: StageHandle) -> Result<&dyn PostProcessStage<C>> {
        self.stage(handle).ok_or(PostProcessError::ForeignStage)
    }

    /// Downcasts a user stage to its concrete type.
    #[must_use]
    pub fn stage_as<T: Any>(&self, handle: StageHandle) -> Option<&T> {
        self.stage(handle)?.as_any().downcast_ref::<T>()
    }

    pub fn stage_as_mut<T: Any>(&mut self, handle: StageHandle) -> Option<&mut T> {
        self.stage_mut(handle)?.as_any_mut().downcast_mut::<T>()
    }

    /// Iterates live user stages in sequence order.
    pub fn iter(&self) -> impl Iterator<Item = (StageHandle, &dyn PostProcessStage<C>)> + '_ {
        self.slots.iter().flatten().map(|slot| {
            let stage: &dyn PostProcessStage<C> = slot.stage.as_ref();
            let handle = StageHandle {
                collection: self.id,
                key: slot.key,
            };
            (handle, stage)
        })
    }

    /// Destroys every user stage and empties the sequence.
    pub fn remove_all(&mut self) {
        let count = self.indices.len();
        for mut slot in self.slots.drain(..).flatten() {
            slot.stage.destroy();
        }
        self.indices.clear();
        self.active.clear();
        self.needs_compaction = false;
        if count > 0 {
            log::debug!("Removed all {count} post-process stage(s)");
        }
    }

    fn slot(&self, handle: StageHandle) -> Option<&StageSlot<C>> {
        if handle.collection != self.id {
            return None;
        }
        let index = *self.indices.get(handle.key)?;
        self.slots.get(index)?.as_ref()
    }

    /// Drops empty slots and reassigns indices by position.
    fn compact(&mut self) {
        if !self.needs_compaction {
            return;
        }
        self.needs_compaction = false;

        let before = self.slots.len();
        self.slots.retain(Option::is_some);
        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(slot) = slot {
                self.indices[slot.key] = index;
            }
        }
        log::trace!(
            "Compacted post-process stages: {before} -> {}",
            self.slots.len()
        );
    }

    // ========================================================================
    // Aggregation
    // ========================================================================

    /// Returns `true` if at least one enabled stage, built-in or user, is ready.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        BuiltinStage::ALL
            .iter()
            .any(|&which| is_active(self.builtins.get(which)))
            || self
                .slots
                .iter()
                .flatten()
                .any(|slot| is_active(slot.stage.as_ref()))
    }

    /// Resolves which stage's output is the pipeline output, using the same
    /// precedence as [`execute`](Self::execute): FXAA, then the last active
    /// user stage, then bloom, then ambient occlusion.
    #[must_use]
    pub fn chain_terminus(&self) -> ChainTerminus {
        if is_active(self.builtins.fxaa.as_ref()) {
            return ChainTerminus::Fxaa;
        }

        // Execution is strictly sequential, so only the last active user stage
        // can be the terminus.
        if let Some(slot) = self
            .slots
            .iter()
            .rev()
            .flatten()
            .find(|slot| is_active(slot.stage.as_ref()))
        {
            return ChainTerminus::User(StageHandle {
                collection: self.id,
                key: slot.key,
            });
        }

        if is_active(self.builtins.bloom.as_ref()) {
            return ChainTerminus::Bloom;
        }
        if is_active(self.builtins.ambient_occlusion.as_ref()) {
            return ChainTerminus::AmbientOcclusion;
        }
        ChainTerminus::Input
    }

    /// Texture produced by the chain terminus.
    ///
    /// `None` when nothing runs; the caller should then keep using its own
    /// color texture.
    #[must_use]
    pub fn output_texture(&self) -> Option<C::Texture> {
        match self.chain_terminus() {
            ChainTerminus::Input => None,
            ChainTerminus::AmbientOcclusion => self.builtins.ambient_occlusion.output_texture(),
            ChainTerminus::Bloom => self.builtins.bloom.output_texture(),
            ChainTerminus::User(handle) => self.stage(handle)?.output_texture(),
            ChainTerminus::Fxaa => self.builtins.fxaa.output_texture(),
        }
    }

    // ========================================================================
    // Per-frame orchestration
    // ========================================================================

    /// Gives every stage a chance to prepare resources. Never draws.
    ///
    /// Disabled stages are updated too, so they can become ready before being
    /// switched on.
    pub fn update(&mut self, ctx: &mut C) {
        self.compact();

        for which in BUILTIN_UPDATE_ORDER {
            self.builtins.get_mut(which).update(ctx);
        }
        for slot in self.slots.iter_mut().flatten() {
            slot.stage.update(ctx);
        }
    }

    /// Releases transient per-frame resources on every stage.
    pub fn clear(&mut self, ctx: &mut C) {
        for which in BUILTIN_UPDATE_ORDER {
            self.builtins.get_mut(which).clear(ctx);
        }
        for slot in self.slots.iter_mut().flatten() {
            slot.stage.clear(ctx);
        }
    }

    /// Runs the post-processing chain over `color_texture`.
    ///
    /// `depth_texture` is handed unchanged to every stage. When nothing is
    /// enabled this is a no-op and `color_texture` remains authoritative.
    pub fn execute(&mut self, ctx: &mut C, color_texture: &C::Texture, depth_texture: &C::Texture) {
        debug_assert!(!self.destroyed, "execute called on a destroyed collection");
        self.compact();

        let mut active = std::mem::take(&mut self.active);
        active.clear();
        active.extend(self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let slot = slot.as_ref()?;
            is_active(slot.stage.as_ref()).then_some(index)
        }));

        if active.is_empty() && !self.builtins.any_enabled() {
            self.active = active;
            return;
        }

        let mut current = color_texture.clone();
        let mut terminus = ChainTerminus::Input;

        let ao = self.builtins.ambient_occlusion.as_mut();
        if is_active(ao) {
            run_stage(ao, ctx, &mut current, depth_texture);
            terminus = ChainTerminus::AmbientOcclusion;
        }

        let bloom = self.builtins.bloom.as_mut();
        if is_active(bloom) {
            run_stage(bloom, ctx, &mut current, depth_texture);
            terminus = ChainTerminus::Bloom;
        }

        for &index in &active {
            if let Some(slot) = self.slots[index].as_mut() {
                run_stage(slot.stage.as_mut(), ctx, &mut current, depth_texture);
                terminus = ChainTerminus::User(StageHandle {
                    collection: self.id,
                    key: slot.key,
                });
            }
        }

        let fxaa = self.builtins.fxaa.as_mut();
        if is_active(fxaa) {
            fxaa.execute(ctx, &current, depth_texture);
            terminus = ChainTerminus::Fxaa;
        }

        log::trace!(
            "Post-process chain ran {} user stage(s), terminus {terminus:?}",
            active.len()
        );
        debug_assert_eq!(
            terminus,
            self.chain_terminus(),
            "executed chain terminus disagrees with output resolution"
        );
        self.active = active;
    }

    /// Draws the resolved output texture into `framebuffer` with a
    /// full-screen pass-through command.
    ///
    /// The command is built on the first call and reused afterwards; only
    /// the target changes between calls.
    pub fn copy(&mut self, ctx: &mut C, framebuffer: &C::Framebuffer) {
        if self.copy_command.is_none() {
            log::debug!("Creating post-process copy command");
            self.copy_command = Some(ctx.create_copy_command());
        }

        let Some(source) = self.output_texture() else {
            log::trace!("Post-process copy skipped: no stage produced output");
            return;
        };
        if let Some(command) = self.copy_command.as_mut() {
            ctx.execute_copy(command, &source, framebuffer);
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Destroys the built-ins, every user stage and the cached copy command.
    pub fn destroy(&mut self) {
        debug_assert!(!self.destroyed, "post-process collection destroyed twice");

        for which in BUILTIN_UPDATE_ORDER {
            self.builtins.get_mut(which).destroy();
        }
        self.remove_all();
        self.copy_command = None;
        self.destroyed = true;
    }

    #[inline]
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl<C: PostProcessContext> Drop for PostProcessCollection<C> {
    fn drop(&mut self) {
        if !self.destroyed {
            self.destroy();
        }
    }
}

/// Executes `stage` on `current` and advances `current` to its output.
fn run_stage<C: PostProcessContext>(
    stage: &mut dyn PostProcessStage<C>,
    ctx: &mut C,
    current: &mut C::Texture,
    depth: &C::Texture,
) {
    stage.execute(ctx, current, depth);
    match stage.output_texture() {
        Some(output) => *current = output,
        None => log::warn!(
            "Post-process stage '{}' produced no output texture; forwarding its input",
            stage.name()
        ),
    }
}
