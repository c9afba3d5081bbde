//! CPU reference of the per-invocation programs
//!
//! Each stage mirrors its WGSL counterpart formula for formula, reading the
//! same uniform blocks, so it can be tested without a device and used for
//! offline previews.

pub mod lighting;
pub mod post;
pub mod raster;
pub mod shadow;
pub mod vertex;

pub use lighting::{
    cutout_alpha, DebugView, FragmentOutput, LightingEvaluator, LightingFeatures, LightingTerms,
    MaterialTextures,
};
pub use post::{blur_texture, box_blur, fullscreen_uv, CompositeSource, Compositor, Tonemapper};
pub use raster::{OfflineRasterizer, RasterOutput, SceneAssets};
pub use shadow::{
    decode_distance, encode_distance, CutoutTriangle, Occluder, SceneOccluder, ShadowAtlas,
    ShadowDepthGenerator, ShadowMapKind, ShadowQuery, Triangle,
};
pub use vertex::{Varyings, VertexTransform};
