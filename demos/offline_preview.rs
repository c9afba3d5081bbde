//! Offline preview: renders the block scene on the CPU through the same
//! stages the GPU passes run, and writes a PNG.
//!
//! ```bash
//! cargo run --example offline_preview -- --light point --output preview.png
//! ```

use clap::{Parser, ValueEnum};
use glam::{Vec3, Vec4};

use multipass_shading::resources::{Material, Mesh, Texture2D};
use multipass_shading::scene::{Camera, Light, RenderObject, Scene, Transform};
use multipass_shading::shading::{
    CompositeSource, Compositor, DebugView, OfflineRasterizer, RasterOutput, SceneAssets,
    ShadowAtlas, ShadowDepthGenerator, Tonemapper,
};
use multipass_shading::{init_logging, OutputEncoding, ShadingConfig, ShadowConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LightKind {
    Point,
    Directional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum View {
    Lit,
    White,
    Diffuse,
    Specular,
    Normals,
    Shadow,
    /// Linearised depth buffer
    Depth,
}

#[derive(Parser, Debug)]
#[command(name = "offline_preview", about = "Render the shading pipeline on the CPU")]
struct Args {
    #[arg(long, default_value_t = 320)]
    width: u32,

    #[arg(long, default_value_t = 240)]
    height: u32,

    #[arg(long, short, default_value = "preview.png")]
    output: std::path::PathBuf,

    #[arg(long, value_enum, default_value_t = LightKind::Point)]
    light: LightKind,

    /// Orbit time of the point light
    #[arg(long, default_value_t = 0.0)]
    time: f32,

    #[arg(long, value_enum, default_value_t = View::Lit)]
    view: View,

    #[arg(long)]
    no_shadows: bool,

    /// Write gamma-encoded lighting directly instead of tonemapping HDR
    #[arg(long)]
    no_tonemap: bool,

    #[arg(long, default_value_t = 128)]
    shadow_resolution: u32,
}

struct Preview {
    scene: Scene,
    meshes: Vec<Mesh>,
    materials: Vec<Material>,
    textures: Vec<Texture2D>,
}

impl Preview {
    fn new(light: Light, aspect: f32) -> Self {
        let mut camera = Camera::new(Vec3::new(0.0, 9.0, 14.0), Vec3::new(0.0, 1.0, 0.0));
        camera.projection.set_aspect(aspect);

        let mut scene = Scene::new(camera, light);
        scene.add_object(RenderObject::new(0, 0));
        scene.add_object(RenderObject::new(1, 1).with_position(Vec3::new(0.0, 3.0, 0.0)));
        scene.add_object(
            RenderObject::new(2, 2).with_transform(
                Transform::from_position(Vec3::new(4.0, 1.0, 2.0)).with_scale(Vec3::splat(2.0)),
            ),
        );
        // Lattice fence: the clear cells show what lies behind
        scene.add_object(RenderObject::new(3, 3).with_position(Vec3::new(-4.0, 1.5, 3.0)));

        let checker = Texture2D::checkerboard(
            64,
            8,
            Vec4::new(0.9, 0.9, 0.9, 1.0),
            Vec4::new(0.4, 0.4, 0.45, 1.0),
        );
        let lattice = Texture2D::checkerboard(
            32,
            4,
            Vec4::new(0.55, 0.35, 0.2, 1.0),
            Vec4::new(0.0, 0.0, 0.0, 0.0),
        );

        Self {
            scene,
            meshes: vec![
                Mesh::plane(20.0, 20.0, 4),
                Mesh::cube(2.0),
                Mesh::sphere(24, 12).with_generated_tangents(),
                Mesh::quad(3.0),
            ],
            materials: vec![
                Material::matte(Vec3::ONE).with_diffuse_map(0),
                Material::glossy(Vec3::new(0.8, 0.25, 0.2)),
                Material::glossy(Vec3::new(0.2, 0.4, 0.8)).with_shininess(128.0),
                Material::matte(Vec3::ONE)
                    .with_diffuse_map(1)
                    .with_alpha_cutout(),
            ],
            textures: vec![checker, lattice],
        }
    }

    fn assets(&self) -> SceneAssets<'_> {
        SceneAssets {
            meshes: &self.meshes,
            materials: &self.materials,
            textures: &self.textures,
        }
    }

    fn bake_shadows(&self, config: &ShadingConfig) -> ShadowAtlas {
        let generator = ShadowDepthGenerator::new(config.shadow);
        let occluders = self
            .assets()
            .occluders(&self.scene, config.lighting.alpha_cutoff);
        let atlas = match self.scene.light {
            Light::Point { position, .. } => generator.bake_point_light(position, &occluders),
            light => generator.bake_planar(&light, &occluders),
        };
        atlas.blurred(&config.blur)
    }
}

fn main() {
    init_logging();
    let args = Args::parse();

    let light = match args.light {
        LightKind::Point => Light::orbiting(args.time, 6.0, 10.0, 1.0),
        LightKind::Directional => Light::directional(Vec3::new(-0.4, -1.0, -0.3), 1.0),
    };

    let mut config = ShadingConfig::default().with_shadow(ShadowConfig {
        face_resolution: args.shadow_resolution,
        planar_extent: 15.0,
        ..Default::default()
    });
    if !args.no_tonemap {
        config = config.with_output(OutputEncoding::LinearHdr);
    }
    if let Err(e) = config.validate() {
        log::error!("{e}");
        std::process::exit(1);
    }

    let preview = Preview::new(light, args.width as f32 / args.height.max(1) as f32);

    let shadows = (!args.no_shadows).then(|| {
        log::info!("Baking {:?} shadow map at {} texels", args.light, args.shadow_resolution);
        preview.bake_shadows(&config)
    });

    let debug_view = match args.view {
        View::Lit | View::Depth => DebugView::Lit,
        View::White => DebugView::White,
        View::Diffuse => DebugView::DiffuseOnly,
        View::Specular => DebugView::SpecularOnly,
        View::Normals => DebugView::Normals,
        View::Shadow => DebugView::ShadowOnly,
    };

    log::info!("Rasterizing {}x{}", args.width, args.height);
    let RasterOutput { color, depth } = OfflineRasterizer::new(config, args.width, args.height)
        .with_debug_view(debug_view)
        .render(&preview.scene, &preview.assets(), shadows.as_ref());

    let image = if args.view == View::Depth {
        Compositor::new(CompositeSource::Depth, &preview.scene.camera.uniform())
            .composite_texture(&depth, args.width, args.height)
    } else if args.no_tonemap {
        color
    } else {
        Tonemapper::new(config.tonemap).apply_texture(&color)
    };

    match image.to_rgba8().save(&args.output) {
        Ok(()) => log::info!("Wrote {}", args.output.display()),
        Err(e) => {
            log::error!("Failed to write {}: {e}", args.output.display());
            std::process::exit(1);
        }
    }
}
