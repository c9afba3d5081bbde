//! Binding-group convention shared by every pass
//!
//! | Group | Update rate | Bindings |
//! |-------|-------------|----------|
//! | 0 | per frame | `FrameUniform`, `ShadingConstants` |
//! | 1 | per light | `LightUniform`, shadow map, non-filtering sampler |
//! | 2 | per material | `MaterialUniform`, diffuse / specular / normal maps, filtering sampler |
//! | 3 | per object | `ObjectUniform` |
//!
//! Fullscreen passes keep group 0 and put their input image in group 1.

use crate::backend::traits::*;
use crate::backend::types::ShaderStageFlags;
use crate::config::ShadingConstants;
use crate::error::{ShadingError, ShadingResult};
use crate::resources::MaterialUniform;
use crate::scene::{FrameUniform, LightUniform, ObjectUniform};

pub const FRAME_GROUP: u32 = 0;
pub const LIGHT_GROUP: u32 = 1;
pub const MATERIAL_GROUP: u32 = 2;
pub const OBJECT_GROUP: u32 = 3;
/// Input image of a fullscreen pass
pub const POST_GROUP: u32 = 1;

pub const SHADOW_MAP_BINDING: u32 = 1;
pub const DIFFUSE_MAP_BINDING: u32 = 1;
pub const SPECULAR_MAP_BINDING: u32 = 2;
pub const NORMAL_MAP_BINDING: u32 = 3;
pub const SOURCE_TEXTURE_BINDING: u32 = 0;

fn uniform<T>(binding: u32, visibility: ShaderStageFlags) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility,
        ty: BindingType::UniformBuffer {
            min_size: std::mem::size_of::<T>() as u64,
        },
    }
}

fn texture(binding: u32, filterable: bool) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility: ShaderStageFlags::FRAGMENT,
        ty: BindingType::Texture {
            sample_type: TextureSampleType::Float { filterable },
        },
    }
}

fn sampler(binding: u32, filtering: bool) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility: ShaderStageFlags::FRAGMENT,
        ty: BindingType::Sampler { filtering },
    }
}

pub fn frame_group() -> BindGroupLayoutDesc {
    BindGroupLayoutDesc {
        label: "frame",
        group: FRAME_GROUP,
        entries: vec![
            uniform::<FrameUniform>(0, ShaderStageFlags::VERTEX_FRAGMENT),
            uniform::<ShadingConstants>(1, ShaderStageFlags::VERTEX_FRAGMENT),
        ],
    }
}

/// Shadow maps hold R32Float distances, which are not filterable
pub fn light_group() -> BindGroupLayoutDesc {
    BindGroupLayoutDesc {
        label: "light",
        group: LIGHT_GROUP,
        entries: vec![
            uniform::<LightUniform>(0, ShaderStageFlags::VERTEX_FRAGMENT),
            texture(SHADOW_MAP_BINDING, false),
            sampler(2, false),
        ],
    }
}

pub fn material_group() -> BindGroupLayoutDesc {
    BindGroupLayoutDesc {
        label: "material",
        group: MATERIAL_GROUP,
        entries: vec![
            uniform::<MaterialUniform>(0, ShaderStageFlags::FRAGMENT),
            texture(DIFFUSE_MAP_BINDING, true),
            texture(SPECULAR_MAP_BINDING, true),
            texture(NORMAL_MAP_BINDING, true),
            sampler(4, true),
        ],
    }
}

pub fn object_group() -> BindGroupLayoutDesc {
    BindGroupLayoutDesc {
        label: "object",
        group: OBJECT_GROUP,
        entries: vec![uniform::<ObjectUniform>(0, ShaderStageFlags::VERTEX)],
    }
}

/// Input of a fullscreen pass; `filterable` is false for depth and distance images
pub fn post_group(filterable: bool) -> BindGroupLayoutDesc {
    BindGroupLayoutDesc {
        label: "post_source",
        group: POST_GROUP,
        entries: vec![
            texture(SOURCE_TEXTURE_BINDING, filterable),
            sampler(1, filterable),
        ],
    }
}

/// Groups of the scene passes (prepass, shadow casting): frame and object
pub fn geometry_layouts() -> Vec<BindGroupLayoutDesc> {
    vec![frame_group(), object_group()]
}

/// Alpha-tested depth and shadow programs: frame, material and object
pub fn cutout_layouts() -> Vec<BindGroupLayoutDesc> {
    vec![frame_group(), material_group(), object_group()]
}

pub fn lit_layouts() -> Vec<BindGroupLayoutDesc> {
    vec![frame_group(), light_group(), material_group(), object_group()]
}

pub fn post_layouts(filterable: bool) -> Vec<BindGroupLayoutDesc> {
    vec![frame_group(), post_group(filterable)]
}

/// Check that every resource a validated module declares is covered by `layouts`
pub fn check_module_bindings(
    label: &str,
    module: &naga::Module,
    layouts: &[BindGroupLayoutDesc],
) -> ShadingResult<()> {
    for (_, global) in module.global_variables.iter() {
        let Some(binding) = &global.binding else {
            continue;
        };
        let declared = layouts
            .iter()
            .filter(|layout| layout.group == binding.group)
            .flat_map(|layout| layout.entries.iter())
            .any(|entry| entry.binding == binding.binding);
        if !declared {
            return Err(ShadingError::ShaderValidation {
                label: label.to_string(),
                message: format!(
                    "'{}' uses @group({}) @binding({}) which no layout declares",
                    global.name.as_deref().unwrap_or("?"),
                    binding.group,
                    binding.binding
                ),
            });
        }
    }
    Ok(())
}
