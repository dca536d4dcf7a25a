//! Built-in Stage Definitions
//!
//! The collection owns three fixed-role stages that are never part of the user
//! sequence. Their execution position relative to user stages is fixed:
//!
//! | Stage | Position | Default |
//! |-------|----------|---------|
//! | `AmbientOcclusion` | first, reads the scene color | disabled |
//! | `Bloom` | after AO | disabled |
//! | *user stages* | registration order | - |
//! | `Fxaa` | last, reads the chain terminus | enabled |

use super::context::PostProcessContext;
use super::stage::PostProcessStage;

/// Fixed-role built-in stage.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
#[repr(u8)]
pub enum BuiltinStage {
    /// Screen-space ambient occlusion.
    AmbientOcclusion = 0,
    /// Bloom, applied to the (optionally occluded) scene color.
    Bloom = 1,
    /// Anti-aliasing, applied to whatever texture the chain ended on.
    Fxaa = 2,
}

impl BuiltinStage {
    /// All built-ins in execution order.
    pub const ALL: [BuiltinStage; 3] = [Self::AmbientOcclusion, Self::Bloom, Self::Fxaa];

    /// Returns the execution order of the built-in.
    ///
    /// User stages run between `Bloom` and `Fxaa`.
    #[inline]
    #[must_use]
    pub const fn order(self) -> u8 {
        self as u8
    }

    /// Stage name (for debugging).
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AmbientOcclusion => "AmbientOcclusion",
            Self::Bloom => "Bloom",
            Self::Fxaa => "FXAA",
        }
    }
}

/// The three built-in stage instances handed to a collection at construction.
pub struct BuiltinStages<C: PostProcessContext> {
    pub ambient_occlusion: Box<dyn PostProcessStage<C>>,
    pub bloom: Box<dyn PostProcessStage<C>>,
    pub fxaa: Box<dyn PostProcessStage<C>>,
}

impl<C: PostProcessContext> BuiltinStages<C> {
    pub fn new(
        ambient_occlusion: Box<dyn PostProcessStage<C>>,
        bloom: Box<dyn PostProcessStage<C>>,
        fxaa: Box<dyn PostProcessStage<C>>,
    ) -> Self {
        Self {
            ambient_occlusion,
            bloom,
            fxaa,
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, which: BuiltinStage) -> &dyn PostProcessStage<C> {
        match which {
            BuiltinStage::AmbientOcclusion => self.ambient_occlusion.as_ref(),
            BuiltinStage::Bloom => self.bloom.as_ref(),
            BuiltinStage::Fxaa => self.fxaa.as_ref(),
        }
    }

    #[inline]
    pub fn get_mut(&mut self, which: BuiltinStage) -> &mut dyn PostProcessStage<C> {
        match which {
            BuiltinStage::AmbientOcclusion => self.ambient_occlusion.as_mut(),
            BuiltinStage::Bloom => self.bloom.as_mut(),
            BuiltinStage::Fxaa => self.fxaa.as_mut(),
        }
    }

    /// Returns `true` if any built-in is enabled, ready or not.
    pub(crate) fn any_enabled(&self) -> bool {
        BuiltinStage::ALL
            .iter()
            .any(|&which| self.get(which).is_enabled())
    }
}
