//! Post-processing pipeline
//!
//! Provides:
//! - PostProcessCollection: ordered user stages + AO / bloom / FXAA built-ins
//! - PostProcessStage: the capability contract every effect implements
//! - PostProcessContext: the graphics backend seam
//! - PostProcessSettings: built-in enable flags
//! - WgpuPostContext: wgpu backend with the full-screen copy pass

pub mod builtin;
pub mod collection;
pub mod context;
pub mod settings;
pub mod stage;
pub mod tracked;
pub mod wgpu_context;

pub use builtin::{BuiltinStage, BuiltinStages};
pub use collection::{ChainTerminus, PostProcessCollection};
pub use context::PostProcessContext;
pub use settings::PostProcessSettings;
pub use stage::{PostProcessStage, StageHandle, StageKey};
pub use tracked::Tracked;
pub use wgpu_context::{CopyPass, WgpuPostContext};
