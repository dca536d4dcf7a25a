#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! Render-time post-processing for the Myth engine.
//!
//! A [`PostProcessCollection`] chains image-space effects over the rendered
//! color buffer once per frame: ambient occlusion, bloom, the user's own
//! stages in registration order, then FXAA.

pub mod errors;
pub mod post;

pub use errors::{PostProcessError, Result};
pub use post::{
    BuiltinStage, BuiltinStages, ChainTerminus, PostProcessCollection, PostProcessContext,
    PostProcessSettings, PostProcessStage, StageHandle, Tracked, WgpuPostContext,
};
