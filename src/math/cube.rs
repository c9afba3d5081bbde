//! Cube-face selection and the 6x1 shadow atlas layout
//!
//! Faces are ordered +X, -X, +Y, -Y, +Z, -Z. A direction is assigned to the
//! face of its dominant axis; ties resolve toward Z, then Y, then X. Face-local
//! UVs have `v` growing downward, matching the framebuffer of the face camera
//! returned by [`face_view`] and [`face_projection`].

use glam::{Mat4, Vec2, Vec3};

/// Number of faces packed side by side in the atlas
pub const CUBE_FACE_COUNT: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX = 0,
    NegativeX = 1,
    PositiveY = 2,
    NegativeY = 3,
    PositiveZ = 4,
    NegativeZ = 5,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Direction the face camera looks along
    pub fn look_direction(self) -> Vec3 {
        match self {
            CubeFace::PositiveX => Vec3::X,
            CubeFace::NegativeX => Vec3::NEG_X,
            CubeFace::PositiveY => Vec3::Y,
            CubeFace::NegativeY => Vec3::NEG_Y,
            CubeFace::PositiveZ => Vec3::Z,
            CubeFace::NegativeZ => Vec3::NEG_Z,
        }
    }

    /// Up vector of the face camera
    pub fn up(self) -> Vec3 {
        match self {
            CubeFace::PositiveX | CubeFace::NegativeX => Vec3::NEG_Y,
            CubeFace::PositiveY => Vec3::Z,
            CubeFace::NegativeY => Vec3::NEG_Z,
            CubeFace::PositiveZ | CubeFace::NegativeZ => Vec3::NEG_Y,
        }
    }

    /// Unit direction that projects to `uv` on this face
    pub fn direction(self, uv: Vec2) -> Vec3 {
        let s = uv.x * 2.0 - 1.0;
        let t = uv.y * 2.0 - 1.0;
        let d = match self {
            CubeFace::PositiveX => Vec3::new(1.0, -t, -s),
            CubeFace::NegativeX => Vec3::new(-1.0, -t, s),
            CubeFace::PositiveY => Vec3::new(s, 1.0, t),
            CubeFace::NegativeY => Vec3::new(s, -1.0, -t),
            CubeFace::PositiveZ => Vec3::new(s, -t, 1.0),
            CubeFace::NegativeZ => Vec3::new(-s, -t, -1.0),
        };
        d.normalize()
    }
}

/// Result of projecting a direction onto the cube
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubeProjection {
    pub face: CubeFace,
    /// Face-local coordinate in `[0, 1]^2`
    pub uv: Vec2,
}

impl CubeProjection {
    /// Coordinate in the 6x1 atlas: `((u + face) / 6, v)`
    pub fn atlas_coord(&self) -> Vec2 {
        Vec2::new(
            (self.uv.x + self.face.index() as f32) / CUBE_FACE_COUNT as f32,
            self.uv.y,
        )
    }
}

/// Select the dominant face of `d` and compute its face-local UV
///
/// `d` need not be normalized. The zero vector maps to the centre of +X.
pub fn project_direction(d: Vec3) -> CubeProjection {
    let a = d.abs();
    let (face, plane, major) = if a.z >= a.x && a.z >= a.y {
        if d.z < 0.0 {
            (CubeFace::NegativeZ, Vec2::new(-d.x, -d.y), a.z)
        } else {
            (CubeFace::PositiveZ, Vec2::new(d.x, -d.y), a.z)
        }
    } else if a.y >= a.x {
        if d.y < 0.0 {
            (CubeFace::NegativeY, Vec2::new(d.x, -d.z), a.y)
        } else {
            (CubeFace::PositiveY, Vec2::new(d.x, d.z), a.y)
        }
    } else if d.x < 0.0 {
        (CubeFace::NegativeX, Vec2::new(d.z, -d.y), a.x)
    } else {
        (CubeFace::PositiveX, Vec2::new(-d.z, -d.y), a.x)
    };

    if major <= 0.0 {
        return CubeProjection {
            face: CubeFace::PositiveX,
            uv: Vec2::splat(0.5),
        };
    }

    CubeProjection {
        face,
        uv: plane * (0.5 / major) + Vec2::splat(0.5),
    }
}

/// Split an atlas coordinate back into face and face-local UV
pub fn atlas_to_face(coord: Vec2) -> CubeProjection {
    let scaled = coord.x.clamp(0.0, 1.0) * CUBE_FACE_COUNT as f32;
    let index = (scaled.floor() as u32).min(CUBE_FACE_COUNT - 1);
    let face = CubeFace::from_index(index).unwrap_or(CubeFace::PositiveX);
    CubeProjection {
        face,
        uv: Vec2::new(scaled - index as f32, coord.y),
    }
}

/// View matrix of the camera rendering `face` from `light_position`
pub fn face_view(light_position: Vec3, face: CubeFace) -> Mat4 {
    Mat4::look_at_rh(
        light_position,
        light_position + face.look_direction(),
        face.up(),
    )
}

/// 90 degree square projection with clip-space Y pointing down
///
/// With the y flip, framebuffer UVs of a face render equal the UVs produced
/// by [`project_direction`], so the generator and the query agree.
pub fn face_projection(near: f32, far: f32) -> Mat4 {
    Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0))
        * Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, near, far)
}

/// Pixel rectangle `(x, y, width, height)` of `face` inside the atlas
pub fn face_viewport(face: CubeFace, resolution: u32) -> (u32, u32, u32, u32) {
    (face.index() * resolution, 0, resolution, resolution)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_directions_hit_face_centres() {
        for face in CubeFace::ALL {
            let projection = project_direction(face.look_direction());
            assert_eq!(projection.face, face);
            assert!((projection.uv - Vec2::splat(0.5)).length() < 1e-6);
        }
        assert_eq!(project_direction(Vec3::new(1.0, 0.0, 0.0)).face.index(), 0);
    }

    #[test]
    fn atlas_ranges_do_not_overlap() {
        for face in CubeFace::ALL {
            let lo = CubeProjection { face, uv: Vec2::new(0.0, 0.5) }.atlas_coord();
            let hi = CubeProjection { face, uv: Vec2::new(1.0, 0.5) }.atlas_coord();
            assert!((lo.x - face.index() as f32 / 6.0).abs() < 1e-6);
            assert!((hi.x - lo.x - 1.0 / 6.0).abs() < 1e-6);
        }
    }

    #[test]
    fn inverse_round_trip() {
        let uvs = [
            Vec2::new(0.1, 0.2),
            Vec2::new(0.5, 0.5),
            Vec2::new(0.9, 0.3),
            Vec2::new(0.25, 0.75),
        ];
        for face in CubeFace::ALL {
            for uv in uvs {
                let projection = project_direction(face.direction(uv));
                assert_eq!(projection.face, face);
                assert!((projection.uv - uv).length() < 1e-5);

                let back = atlas_to_face(projection.atlas_coord());
                assert_eq!(back.face, face);
                assert!((back.uv - uv).length() < 1e-5);
            }
        }
    }

    #[test]
    fn face_camera_matches_projection() {
        let light = Vec3::new(3.0, -2.0, 7.0);
        let proj = face_projection(1.0, 250.0);
        let samples = [
            Vec3::new(5.0, 1.0, -2.0),
            Vec3::new(-4.0, 0.5, 1.0),
            Vec3::new(0.3, 6.0, -1.0),
            Vec3::new(-1.0, -8.0, 2.0),
            Vec3::new(2.0, -1.0, 9.0),
            Vec3::new(-2.5, 1.5, -7.0),
        ];
        for offset in samples {
            let projection = project_direction(offset);
            let clip = proj * face_view(light, projection.face) * (light + offset).extend(1.0);
            let ndc = clip.truncate() / clip.w;
            let framebuffer_uv = Vec2::new(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5);
            assert!(
                (framebuffer_uv - projection.uv).length() < 1e-4,
                "face {:?}: {framebuffer_uv:?} vs {:?}",
                projection.face,
                projection.uv
            );
        }
    }

    #[test]
    fn zero_direction_is_stable() {
        let projection = project_direction(Vec3::ZERO);
        assert_eq!(projection.face, CubeFace::PositiveX);
        assert_eq!(projection.uv, Vec2::splat(0.5));
    }

    #[test]
    fn viewports_tile_atlas() {
        assert_eq!(face_viewport(CubeFace::PositiveX, 1024), (0, 0, 1024, 1024));
        assert_eq!(face_viewport(CubeFace::NegativeZ, 1024), (5120, 0, 1024, 1024));
    }
}
