//! Post-Processing Configuration
//!
//! Pure data describing which built-in effects are switched on, following the
//! same pattern as the engine's `BloomSettings` / `SsaoSettings` /
//! `FxaaSettings`. The collection applies these toggles to its built-in
//! stages; per-effect tuning stays with the stage implementations.
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut settings = PostProcessSettings::default();
//! settings.set_bloom(true);
//! collection.apply_settings(&settings);
//! ```

use serde::{Deserialize, Serialize};

use super::builtin::BuiltinStage;

/// Enable flags for the three built-in stages.
///
/// Defaults mirror a freshly constructed collection: ambient occlusion and
/// bloom off, FXAA on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostProcessSettings {
    /// Whether screen-space ambient occlusion runs.
    pub ambient_occlusion: bool,
    /// Whether bloom runs.
    pub bloom: bool,
    /// Whether FXAA runs.
    pub fxaa: bool,
}

impl Default for PostProcessSettings {
    fn default() -> Self {
        Self {
            ambient_occlusion: false,
            bloom: false,
            fxaa: true,
        }
    }
}

impl PostProcessSettings {
    /// Creates new settings with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All built-ins disabled.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            ambient_occlusion: false,
            bloom: false,
            fxaa: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_enabled(&self, which: BuiltinStage) -> bool {
        match which {
            BuiltinStage::AmbientOcclusion => self.ambient_occlusion,
            BuiltinStage::Bloom => self.bloom,
            BuiltinStage::Fxaa => self.fxaa,
        }
    }

    pub fn set_enabled(&mut self, which: BuiltinStage, enabled: bool) {
        match which {
            BuiltinStage::AmbientOcclusion => self.ambient_occlusion = enabled,
            BuiltinStage::Bloom => self.bloom = enabled,
            BuiltinStage::Fxaa => self.fxaa = enabled,
        }
    }

    pub fn set_ambient_occlusion(&mut self, enabled: bool) {
        self.ambient_occlusion = enabled;
    }

    pub fn set_bloom(&mut self, enabled: bool) {
        self.bloom = enabled;
    }

    pub fn set_fxaa(&mut self, enabled: bool) {
        self.fxaa = enabled;
    }
}
