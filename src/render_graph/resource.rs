//! Virtual resources for the render graph

use crate::backend::types::*;

/// Unique identifier for a render graph resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub(crate) u32);

impl ResourceId {
    pub fn index(&self) -> u32 {
        self.0
    }
}

/// Texture created and owned by the graph
#[derive(Debug, Clone)]
pub struct VirtualTexture {
    pub id: ResourceId,
    pub desc: TextureDescriptor,
    pub name: String,
}

#[derive(Debug, Clone)]
pub enum VirtualResource {
    Texture(VirtualTexture),
    /// Supplied by the host (swapchain image, material textures)
    External { id: ResourceId, name: String },
}

impl VirtualResource {
    pub fn id(&self) -> ResourceId {
        match self {
            VirtualResource::Texture(t) => t.id,
            VirtualResource::External { id, .. } => *id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            VirtualResource::Texture(t) => &t.name,
            VirtualResource::External { name, .. } => name,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, VirtualResource::External { .. })
    }

    pub fn texture_desc(&self) -> Option<&TextureDescriptor> {
        match self {
            VirtualResource::Texture(t) => Some(&t.desc),
            VirtualResource::External { .. } => None,
        }
    }
}

/// How a pass uses a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceUsage {
    /// Sampled in a shader
    TextureRead,
    /// Colour attachment
    RenderTarget,
    /// Depth attachment, tested but not written
    DepthStencilRead,
    DepthStencilWrite,
}

/// Resource access declaration for a pass
#[derive(Debug, Clone)]
pub struct ResourceAccess {
    pub resource: ResourceId,
    pub usage: ResourceUsage,
}

impl ResourceAccess {
    pub fn is_read(&self) -> bool {
        matches!(
            self.usage,
            ResourceUsage::TextureRead | ResourceUsage::DepthStencilRead
        )
    }

    pub fn is_write(&self) -> bool {
        matches!(
            self.usage,
            ResourceUsage::RenderTarget | ResourceUsage::DepthStencilWrite
        )
    }
}

/// Describes texture dimensions that can be relative to screen size
#[derive(Debug, Clone, Copy)]
pub enum TextureSize {
    /// Absolute size in pixels
    Absolute { width: u32, height: u32 },
    /// Relative to screen size (1.0 = full screen)
    Relative { width_scale: f32, height_scale: f32 },
}

impl Default for TextureSize {
    fn default() -> Self {
        TextureSize::Relative {
            width_scale: 1.0,
            height_scale: 1.0,
        }
    }
}

impl TextureSize {
    /// Never resolves to a zero-sized texture
    pub fn resolve(&self, screen_width: u32, screen_height: u32) -> (u32, u32) {
        let (width, height) = match self {
            TextureSize::Absolute { width, height } => (*width, *height),
            TextureSize::Relative {
                width_scale,
                height_scale,
            } => (
                ((screen_width as f32) * width_scale) as u32,
                ((screen_height as f32) * height_scale) as u32,
            ),
        };
        (width.max(1), height.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_size_resolution() {
        let half = TextureSize::Relative {
            width_scale: 0.5,
            height_scale: 0.5,
        };
        assert_eq!(half.resolve(1280, 720), (640, 360));
        assert_eq!(TextureSize::default().resolve(0, 0), (1, 1));
        assert_eq!(
            TextureSize::Absolute {
                width: 6144,
                height: 1024
            }
            .resolve(1, 1),
            (6144, 1024)
        );
    }

    #[test]
    fn access_direction() {
        let id = ResourceId(0);
        let read = ResourceAccess {
            resource: id,
            usage: ResourceUsage::DepthStencilRead,
        };
        let write = ResourceAccess {
            resource: id,
            usage: ResourceUsage::RenderTarget,
        };
        assert!(read.is_read() && !read.is_write());
        assert!(write.is_write() && !write.is_read());
    }
}
