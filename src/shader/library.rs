//! Built-in WGSL modules and entry programs.
//!
//! Library modules live in `shaders/library/` and are pulled in with
//! `#include "shading/<name>.wgsl"`. Entry programs live in `shaders/`.
//!
//! | Include path | Contents |
//! |--------------|----------|
//! | `shading/types.wgsl` | Uniform block structs |
//! | `shading/frame_bindings.wgsl` | Group 0: frame + constants |
//! | `shading/light_bindings.wgsl` | Group 1: light + shadow map |
//! | `shading/material_bindings.wgsl` | Group 2: material + maps |
//! | `shading/object_bindings.wgsl` | Group 3: object transform |
//! | `shading/transform.wgsl` | Object to clip transform of every scene program |
//! | `shading/cutout.wgsl` | Alpha of cutout materials |
//! | `shading/shadow_depth.wgsl` | Stored shadow distance |
//! | `shading/post_bindings.wgsl` | Group 1 of fullscreen passes |
//! | `shading/cube.wgsl` | Cube-face projection and atlas packing |
//! | `shading/tbn.wgsl` | Tangent frame and normal decoding |
//! | `shading/tonemap.wgsl` | Filmic curve |
//! | `shading/fullscreen.wgsl` | Fullscreen quad vertex stage |

// =============================================================================
// Library modules
// =============================================================================

const TYPES_MODULE: &str = include_str!("../../shaders/library/types.wgsl");
const FRAME_BINDINGS_MODULE: &str = include_str!("../../shaders/library/frame_bindings.wgsl");
const LIGHT_BINDINGS_MODULE: &str = include_str!("../../shaders/library/light_bindings.wgsl");
const MATERIAL_BINDINGS_MODULE: &str =
    include_str!("../../shaders/library/material_bindings.wgsl");
const OBJECT_BINDINGS_MODULE: &str = include_str!("../../shaders/library/object_bindings.wgsl");
const TRANSFORM_MODULE: &str = include_str!("../../shaders/library/transform.wgsl");
const CUTOUT_MODULE: &str = include_str!("../../shaders/library/cutout.wgsl");
const SHADOW_DEPTH_MODULE: &str = include_str!("../../shaders/library/shadow_depth.wgsl");
const POST_BINDINGS_MODULE: &str = include_str!("../../shaders/library/post_bindings.wgsl");
const CUBE_MODULE: &str = include_str!("../../shaders/library/cube.wgsl");
const TBN_MODULE: &str = include_str!("../../shaders/library/tbn.wgsl");
const TONEMAP_MODULE: &str = include_str!("../../shaders/library/tonemap.wgsl");
const FULLSCREEN_MODULE: &str = include_str!("../../shaders/library/fullscreen.wgsl");

// =============================================================================
// Entry programs
// =============================================================================

/// Position-only depth prepass
pub const PREPASS_SOURCE: &str = include_str!("../../shaders/prepass.wgsl");
/// Alpha-tested depth prepass of cutout materials
pub const PREPASS_CUTOUT_SOURCE: &str = include_str!("../../shaders/prepass_cutout.wgsl");
/// Shadow depth generator (cube face or planar, see `PLANAR_SHADOW`)
pub const SHADOW_CAST_SOURCE: &str = include_str!("../../shaders/shadow_cast.wgsl");
/// Shadow depth generator of cutout casters
pub const SHADOW_CAST_CUTOUT_SOURCE: &str = include_str!("../../shaders/shadow_cast_cutout.wgsl");
/// Lighting evaluator
pub const LIT_SOURCE: &str = include_str!("../../shaders/lit.wgsl");
pub const SHADOW_BLUR_SOURCE: &str = include_str!("../../shaders/shadow_blur.wgsl");
pub const TONEMAP_SOURCE: &str = include_str!("../../shaders/tonemap.wgsl");
pub const COMPOSITE_SOURCE: &str = include_str!("../../shaders/composite.wgsl");

// =============================================================================
// ShaderLibrary
// =============================================================================

/// Collection of includable shader modules
pub struct ShaderLibrary {
    modules: Vec<(&'static str, &'static str)>,
}

impl ShaderLibrary {
    /// Every module the entry programs depend on
    pub fn standard() -> Self {
        Self {
            modules: vec![
                ("shading/types.wgsl", TYPES_MODULE),
                ("shading/frame_bindings.wgsl", FRAME_BINDINGS_MODULE),
                ("shading/light_bindings.wgsl", LIGHT_BINDINGS_MODULE),
                ("shading/material_bindings.wgsl", MATERIAL_BINDINGS_MODULE),
                ("shading/object_bindings.wgsl", OBJECT_BINDINGS_MODULE),
                ("shading/transform.wgsl", TRANSFORM_MODULE),
                ("shading/cutout.wgsl", CUTOUT_MODULE),
                ("shading/shadow_depth.wgsl", SHADOW_DEPTH_MODULE),
                ("shading/post_bindings.wgsl", POST_BINDINGS_MODULE),
                ("shading/cube.wgsl", CUBE_MODULE),
                ("shading/tbn.wgsl", TBN_MODULE),
                ("shading/tonemap.wgsl", TONEMAP_MODULE),
                ("shading/fullscreen.wgsl", FULLSCREEN_MODULE),
            ],
        }
    }

    pub fn empty() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Add a custom module.
    pub fn with_module(mut self, path: &'static str, source: &'static str) -> Self {
        self.modules.push((path, source));
        self
    }

    pub fn modules(&self) -> &[(&'static str, &'static str)] {
        &self.modules
    }

    pub fn get(&self, path: &str) -> Option<&'static str> {
        self.modules
            .iter()
            .find(|(p, _)| *p == path)
            .map(|(_, source)| *source)
    }
}

impl Default for ShaderLibrary {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_library() {
        let library = ShaderLibrary::standard();
        assert_eq!(library.modules().len(), 13);
        assert!(library.get("shading/cube.wgsl").is_some());
        assert!(library.get("shading/missing.wgsl").is_none());
    }

    #[test]
    fn test_modules_not_empty() {
        for (path, source) in ShaderLibrary::standard().modules() {
            assert!(!source.trim().is_empty(), "{path} is empty");
        }
    }

    #[test]
    fn test_cube_module_declares_projection() {
        let cube = ShaderLibrary::standard().get("shading/cube.wgsl").unwrap();
        assert!(cube.contains("fn cube_project"));
        assert!(cube.contains("fn cube_atlas_coord"));
    }

    #[test]
    fn test_custom_module() {
        let library = ShaderLibrary::empty().with_module("test/a.wgsl", "const A: f32 = 1.0;");
        assert_eq!(library.modules().len(), 1);
    }
}
