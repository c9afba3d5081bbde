//! Multi-pass shading core
//!
//! A render graph of shading passes together with a CPU reference of every
//! per-invocation program they run.
//!
//! # Features
//! - Depth prepass so the lit pass shades each visible pixel once
//! - Point light shadows in a 6x1 cube-face atlas, directional shadows in a planar map
//! - Tangent-space normal-mapped Blinn-Phong lighting with compile-time feature variants
//! - Filmic tonemapping, shadow map blur and debug composites
//! - WGSL composed from an embedded library and validated with naga
//!
//! The crate never owns a GPU device. [`build_shading_graph`] returns the
//! ordered passes with their pipeline descriptors, and a host renderer
//! replays them through its own [`backend::PassEncoder`].

pub mod backend;
pub mod binding;
pub mod config;
pub mod error;
pub mod math;
pub mod pipeline;
pub mod render_graph;
pub mod resources;
pub mod scene;
pub mod shader;
pub mod shading;

pub use config::{
    BlurConfig, LightingConfig, OutputEncoding, ShadingConfig, ShadingConstants, ShadowConfig,
    ShadowPolicy, TonemapConfig,
};
pub use error::{ShadingError, ShadingResult};
pub use pipeline::{build_shading_graph, PipelineConfig, ShadingResources};
pub use render_graph::{FrameExecutor, RenderGraph};
pub use shader::{ShaderComposer, ShaderDef};

/// Install the platform logger. Safe to call more than once.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Install the platform logger. Safe to call more than once.
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    // Set up panic hook for better error messages in console
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}
