use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::{Vec2, Vec3};

use multipass_shading::math::cube::project_direction;
use multipass_shading::math::tonemap::FilmicCurve;
use multipass_shading::pipeline::{build_shading_graph, PipelineConfig};
use multipass_shading::resources::{Material, Mesh, Vertex};
use multipass_shading::scene::{Camera, Light, Transform};
use multipass_shading::shader::{ShaderComposer, LIT_SOURCE};
use multipass_shading::shading::{
    DebugView, LightingEvaluator, LightingFeatures, MaterialTextures, ShadowDepthGenerator,
    Triangle, VertexTransform,
};
use multipass_shading::{ShadingConfig, ShadowConfig};

// ---------------------------------------------------------------------------
// Per-invocation math
// ---------------------------------------------------------------------------

fn bench_cube_projection(c: &mut Criterion) {
    let directions: Vec<Vec3> = (0..256)
        .map(|i| {
            let t = i as f32 * 0.37;
            Vec3::new(t.sin(), (t * 1.3).cos(), (t * 0.7).sin() - 0.2)
        })
        .collect();
    c.bench_function("cube_project_256", |b| {
        b.iter(|| {
            for d in &directions {
                black_box(project_direction(black_box(*d)).atlas_coord());
            }
        });
    });
}

fn bench_filmic_curve(c: &mut Criterion) {
    let curve = FilmicCurve::default();
    c.bench_function("filmic_map", |b| {
        b.iter(|| curve.map(black_box(Vec3::new(0.4, 1.2, 3.0)), 2.0, 16.0, true));
    });
}

fn bench_lit_fragment(c: &mut Criterion) {
    let config = ShadingConfig::default();
    let light = Light::point(Vec3::new(0.0, 10.0, 0.0), 1.0);
    let camera = Camera::new(Vec3::new(0.0, 5.0, 10.0), Vec3::ZERO);
    let stage = VertexTransform::new(
        &camera.uniform(),
        &Transform::default().uniform(),
        light.vector(),
        true,
    );
    let fragment = stage.transform(&Vertex {
        tangent: Vec3::X,
        ..Vertex::new(Vec3::ZERO, Vec3::Y, Vec2::splat(0.5))
    });
    let evaluator = LightingEvaluator::new(config.lighting, LightingFeatures::all());
    let material = Material::default().uniform();
    let light_uniform = light.uniform(Some(&config.shadow));

    c.bench_function("lit_fragment_all_features", |b| {
        b.iter(|| {
            evaluator.shade(
                black_box(&fragment),
                &material,
                &light_uniform,
                &MaterialTextures::default(),
                0.0,
            )
        });
    });
}

// ---------------------------------------------------------------------------
// Shadow bakes
// ---------------------------------------------------------------------------

fn bench_point_bake(c: &mut Criterion) {
    let config = ShadowConfig {
        face_resolution: 32,
        ..Default::default()
    };
    let occluders: Vec<Triangle> = Mesh::cube(2.0)
        .triangles()
        .chain(Mesh::plane(20.0, 20.0, 2).triangles())
        .map(Triangle::from)
        .collect();
    let generator = ShadowDepthGenerator::new(config);

    c.bench_function("bake_point_light_32", |b| {
        b.iter(|| generator.bake_point_light(black_box(Vec3::new(0.0, 10.0, 0.0)), &occluders));
    });
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

fn bench_compose_lit(c: &mut Criterion) {
    let composer = ShaderComposer::with_standard_library();
    let defs = LightingFeatures::all().shader_defs(DebugView::Lit);
    c.bench_function("compose_lit", |b| {
        b.iter(|| composer.compose(black_box(LIT_SOURCE), &defs));
    });
}

fn bench_build_graph(c: &mut Criterion) {
    let config = PipelineConfig::default();
    c.bench_function("build_shading_graph", |b| {
        b.iter(|| build_shading_graph(black_box(1280), black_box(720), &config));
    });
}

criterion_group!(
    math_benches,
    bench_cube_projection,
    bench_filmic_curve,
    bench_lit_fragment,
);

criterion_group!(shadow_benches, bench_point_bake);

criterion_group!(assembly_benches, bench_compose_lit, bench_build_graph);

criterion_main!(math_benches, shadow_benches, assembly_benches);
