//! CPU-side images sampled by the reference shading stages

use std::path::Path;

use glam::{Vec2, Vec4};
use image::{DynamicImage, RgbaImage};

use crate::backend::types::{AddressMode, FilterMode};

/// RGBA f32 image with GPU-like sampling
#[derive(Debug, Clone, PartialEq)]
pub struct Texture2D {
    pub width: u32,
    pub height: u32,
    texels: Vec<Vec4>,
    pub name: String,
}

impl Texture2D {
    pub fn new(width: u32, height: u32, fill: Vec4, name: &str) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            texels: vec![fill; (width * height) as usize],
            name: name.to_string(),
        }
    }

    pub fn solid(color: Vec4, name: &str) -> Self {
        Self::new(1, 1, color, name)
    }

    pub fn white() -> Self {
        Self::solid(Vec4::ONE, "white")
    }

    /// Tangent-space normal map pointing straight out of the surface
    pub fn flat_normal() -> Self {
        Self::solid(Vec4::new(0.5, 0.5, 1.0, 1.0), "flat_normal")
    }

    pub fn checkerboard(size: u32, cells: u32, a: Vec4, b: Vec4) -> Self {
        let mut texture = Self::new(size, size, a, "checkerboard");
        let cell = (size / cells.max(1)).max(1);
        for y in 0..texture.height {
            for x in 0..texture.width {
                if ((x / cell) + (y / cell)) % 2 == 1 {
                    texture.set(x, y, b);
                }
            }
        }
        texture
    }

    /// Load an image file as unorm RGBA
    pub fn from_file<P: AsRef<Path>>(path: P) -> image::ImageResult<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        let img = image::open(path)?;
        Ok(Self::from_image(&img, &name))
    }

    pub fn from_image(img: &DynamicImage, name: &str) -> Self {
        let rgba = img.to_rgba8();
        if rgba.width() == 0 || rgba.height() == 0 {
            log::warn!("Image {name} is empty, using a transparent 1x1 texture");
            return Self::new(1, 1, Vec4::ZERO, name);
        }
        let texels = rgba
            .pixels()
            .map(|p| Vec4::from_array(p.0.map(|c| c as f32 / 255.0)))
            .collect();
        Self {
            width: rgba.width(),
            height: rgba.height(),
            texels,
            name: name.to_string(),
        }
    }

    /// Quantize to 8-bit RGBA, clamping to `[0, 1]`
    pub fn to_rgba8(&self) -> RgbaImage {
        let mut out = RgbaImage::new(self.width, self.height);
        for (pixel, texel) in out.pixels_mut().zip(&self.texels) {
            let c = texel.clamp(Vec4::ZERO, Vec4::ONE) * 255.0;
            pixel.0 = [c.x, c.y, c.z, c.w].map(|v| v.round() as u8);
        }
        out
    }

    pub fn texels(&self) -> &[Vec4] {
        &self.texels
    }

    pub fn get(&self, x: u32, y: u32) -> Vec4 {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.texels[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, value: Vec4) {
        if x < self.width && y < self.height {
            self.texels[(y * self.width + x) as usize] = value;
        }
    }

    fn wrap(&self, coord: Vec2, address: AddressMode) -> Vec2 {
        match address {
            AddressMode::ClampToEdge => coord.clamp(Vec2::ZERO, Vec2::ONE),
            AddressMode::Repeat => coord - coord.floor(),
        }
    }

    fn fetch(&self, x: i64, y: i64, address: AddressMode) -> Vec4 {
        let (w, h) = (self.width as i64, self.height as i64);
        let (x, y) = match address {
            AddressMode::ClampToEdge => (x.clamp(0, w - 1), y.clamp(0, h - 1)),
            AddressMode::Repeat => (x.rem_euclid(w), y.rem_euclid(h)),
        };
        self.texels[(y * w + x) as usize]
    }

    /// Sample at `uv` (origin top-left)
    pub fn sample(&self, uv: Vec2, filter: FilterMode, address: AddressMode) -> Vec4 {
        let uv = self.wrap(uv, address);
        let size = Vec2::new(self.width as f32, self.height as f32);
        match filter {
            FilterMode::Nearest => {
                let p = (uv * size).floor();
                self.fetch(p.x as i64, p.y as i64, address)
            }
            FilterMode::Linear => {
                let p = uv * size - Vec2::splat(0.5);
                let base = p.floor();
                let f = p - base;
                let (x, y) = (base.x as i64, base.y as i64);
                let top = self
                    .fetch(x, y, address)
                    .lerp(self.fetch(x + 1, y, address), f.x);
                let bottom = self
                    .fetch(x, y + 1, address)
                    .lerp(self.fetch(x + 1, y + 1, address), f.x);
                top.lerp(bottom, f.y)
            }
        }
    }

    /// Nearest, clamp-to-edge lookup used for distance and depth images
    pub fn sample_nearest(&self, uv: Vec2) -> Vec4 {
        self.sample(uv, FilterMode::Nearest, AddressMode::ClampToEdge)
    }
}
