//! Conversion of the pass contracts into wgpu descriptors
//!
//! A host renderer built on wgpu feeds these straight into
//! `Device::create_*`; nothing here touches a device.

use crate::backend::traits::*;
use crate::backend::types::*;

pub fn convert_texture_format(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        TextureFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        TextureFormat::Bgra8UnormSrgb => wgpu::TextureFormat::Bgra8UnormSrgb,
        TextureFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
        TextureFormat::Depth32Float => wgpu::TextureFormat::Depth32Float,
        TextureFormat::R32Float => wgpu::TextureFormat::R32Float,
    }
}

pub fn convert_texture_usage(usage: TextureUsage) -> wgpu::TextureUsages {
    let mut result = wgpu::TextureUsages::empty();
    if usage.contains(TextureUsage::COPY_SRC) {
        result |= wgpu::TextureUsages::COPY_SRC;
    }
    if usage.contains(TextureUsage::COPY_DST) {
        result |= wgpu::TextureUsages::COPY_DST;
    }
    if usage.contains(TextureUsage::TEXTURE_BINDING) {
        result |= wgpu::TextureUsages::TEXTURE_BINDING;
    }
    if usage.contains(TextureUsage::RENDER_ATTACHMENT) {
        result |= wgpu::TextureUsages::RENDER_ATTACHMENT;
    }
    result
}

pub fn convert_texture_descriptor(desc: &TextureDescriptor) -> wgpu::TextureDescriptor<'_> {
    wgpu::TextureDescriptor {
        label: desc.label.as_deref(),
        size: wgpu::Extent3d {
            width: desc.width.max(1),
            height: desc.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: convert_texture_format(desc.format),
        usage: convert_texture_usage(desc.usage),
        view_formats: &[],
    }
}

pub fn convert_vertex_format(format: VertexFormat) -> wgpu::VertexFormat {
    match format {
        VertexFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
        VertexFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
        VertexFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
    }
}

/// Attributes of one vertex buffer; the caller owns them for the
/// lifetime of the `wgpu::VertexBufferLayout` that borrows them
pub fn convert_vertex_attributes(layout: &VertexBufferLayout) -> Vec<wgpu::VertexAttribute> {
    layout
        .attributes
        .iter()
        .map(|a| wgpu::VertexAttribute {
            format: convert_vertex_format(a.format),
            offset: a.offset,
            shader_location: a.location,
        })
        .collect()
}

pub fn convert_compare_function(func: CompareFunction) -> wgpu::CompareFunction {
    match func {
        CompareFunction::Never => wgpu::CompareFunction::Never,
        CompareFunction::Less => wgpu::CompareFunction::Less,
        CompareFunction::Equal => wgpu::CompareFunction::Equal,
        CompareFunction::LessEqual => wgpu::CompareFunction::LessEqual,
        CompareFunction::Greater => wgpu::CompareFunction::Greater,
        CompareFunction::NotEqual => wgpu::CompareFunction::NotEqual,
        CompareFunction::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
        CompareFunction::Always => wgpu::CompareFunction::Always,
    }
}

pub fn convert_primitive_state(desc: &RenderPipelineDescriptor) -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        strip_index_format: None,
        front_face: match desc.front_face {
            FrontFace::Ccw => wgpu::FrontFace::Ccw,
            FrontFace::Cw => wgpu::FrontFace::Cw,
        },
        cull_mode: match desc.cull_mode {
            CullMode::None => None,
            CullMode::Front => Some(wgpu::Face::Front),
            CullMode::Back => Some(wgpu::Face::Back),
        },
        ..Default::default()
    }
}

pub fn convert_shader_stages(flags: ShaderStageFlags) -> wgpu::ShaderStages {
    let mut visibility = wgpu::ShaderStages::empty();
    if flags.contains(ShaderStageFlags::VERTEX) {
        visibility |= wgpu::ShaderStages::VERTEX;
    }
    if flags.contains(ShaderStageFlags::FRAGMENT) {
        visibility |= wgpu::ShaderStages::FRAGMENT;
    }
    visibility
}

pub fn convert_binding_type(ty: BindingType) -> wgpu::BindingType {
    match ty {
        BindingType::UniformBuffer { min_size } => wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(min_size),
        },
        BindingType::Texture { sample_type } => wgpu::BindingType::Texture {
            sample_type: match sample_type {
                TextureSampleType::Float { filterable } => {
                    wgpu::TextureSampleType::Float { filterable }
                }
            },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        BindingType::Sampler { filtering } => wgpu::BindingType::Sampler(if filtering {
            wgpu::SamplerBindingType::Filtering
        } else {
            wgpu::SamplerBindingType::NonFiltering
        }),
    }
}

pub fn convert_bind_group_layout_entries(
    layout: &BindGroupLayoutDesc,
) -> Vec<wgpu::BindGroupLayoutEntry> {
    layout
        .entries
        .iter()
        .map(|e| wgpu::BindGroupLayoutEntry {
            binding: e.binding,
            visibility: convert_shader_stages(e.visibility),
            ty: convert_binding_type(e.ty),
            count: None,
        })
        .collect()
}

fn convert_filter_mode(mode: FilterMode) -> wgpu::FilterMode {
    match mode {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

fn convert_address_mode(mode: AddressMode) -> wgpu::AddressMode {
    match mode {
        AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        AddressMode::Repeat => wgpu::AddressMode::Repeat,
    }
}

pub fn convert_sampler_descriptor(desc: &SamplerDescriptor) -> wgpu::SamplerDescriptor<'_> {
    let address_mode = convert_address_mode(desc.address_mode);
    wgpu::SamplerDescriptor {
        label: desc.label.as_deref(),
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        address_mode_w: address_mode,
        mag_filter: convert_filter_mode(desc.mag_filter),
        min_filter: convert_filter_mode(desc.min_filter),
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    }
}

pub fn convert_depth_stencil_state(state: &DepthStencilState) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: convert_texture_format(state.format),
        depth_write_enabled: state.depth_write_enabled,
        depth_compare: convert_compare_function(state.depth_compare),
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

pub fn convert_color_targets(targets: &[ColorTargetState]) -> Vec<Option<wgpu::ColorTargetState>> {
    targets
        .iter()
        .map(|target| {
            Some(wgpu::ColorTargetState {
                format: convert_texture_format(target.format),
                blend: None,
                write_mask: wgpu::ColorWrites::from_bits_truncate(target.write_mask.bits()),
            })
        })
        .collect()
}

pub fn convert_color_load_op(op: LoadOp) -> wgpu::LoadOp<wgpu::Color> {
    match op {
        LoadOp::Clear([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: a as f64,
        }),
        LoadOp::Load => wgpu::LoadOp::Load,
    }
}

pub fn convert_depth_load_op(op: LoadOp) -> wgpu::LoadOp<f32> {
    match op {
        LoadOp::Clear([depth, ..]) => wgpu::LoadOp::Clear(depth),
        LoadOp::Load => wgpu::LoadOp::Load,
    }
}

pub fn convert_store_op(op: StoreOp) -> wgpu::StoreOp {
    match op {
        StoreOp::Store => wgpu::StoreOp::Store,
        StoreOp::Discard => wgpu::StoreOp::Discard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_types() {
        assert_eq!(
            convert_binding_type(BindingType::Sampler { filtering: false }),
            wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering)
        );
        match convert_binding_type(BindingType::UniformBuffer { min_size: 96 }) {
            wgpu::BindingType::Buffer {
                min_binding_size, ..
            } => assert_eq!(min_binding_size.map(|s| s.get()), Some(96)),
            other => panic!("unexpected binding {other:?}"),
        }
    }

    #[test]
    fn texture_descriptor() {
        let desc = TextureDescriptor {
            label: Some("shadow_atlas".into()),
            width: 6144,
            height: 1024,
            format: TextureFormat::R32Float,
            usage: TextureUsage::ATTACHMENT_SAMPLED,
        };
        let converted = convert_texture_descriptor(&desc);
        assert_eq!(converted.size.width, 6144);
        assert_eq!(converted.format, wgpu::TextureFormat::R32Float);
        assert!(converted
            .usage
            .contains(wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING));
    }

    #[test]
    fn load_ops() {
        assert_eq!(convert_depth_load_op(LoadOp::Clear([1.0; 4])), wgpu::LoadOp::Clear(1.0));
        assert_eq!(convert_store_op(StoreOp::Discard), wgpu::StoreOp::Discard);
        let stages = convert_shader_stages(ShaderStageFlags::VERTEX_FRAGMENT);
        assert_eq!(stages, wgpu::ShaderStages::VERTEX_FRAGMENT);
    }
}
