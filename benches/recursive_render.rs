use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tunnelvision::math::vec3::Vec3;
use tunnelvision::render::{fill_triangle, DepthMode, FlatShader, RenderTarget, Triangle};
use tunnelvision::{Engine, EngineConfig, LevelDescription};

const BUFFER_WIDTH: u32 = 320;
const BUFFER_HEIGHT: u32 = 240;

const LOOP_LEVEL: &str = r#"{
    "name": "bench loop",
    "player_start": [0, 1.5, -3],
    "objects": [
        { "type": "Ground", "scale": 30 },
        { "type": "Pillar", "position": [2, 0, -2] },
        { "type": "Tunnel", "id": "A", "position": [0, 0, 0],
          "portals": [{ "door": 2, "connects_to": "B.door1" },
                      { "door": 1, "connects_to": "B.door2" }] },
        { "type": "Tunnel", "id": "B", "position": [10, 0, 0] }
    ]
}"#;

fn engine(max_recursion: u32, queries: bool) -> Engine {
    let mut config = EngineConfig::default();
    config.render.max_recursion = max_recursion;
    config.render.portal_target_size = 128;

    let mut engine = Engine::new(config, BUFFER_WIDTH, BUFFER_HEIGHT).unwrap();
    let level = LevelDescription::from_json(LOOP_LEVEL).unwrap();
    engine.load_level(&level).unwrap();
    engine.set_occlusion_queries(queries);
    engine
}

fn benchmark_recursion_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("recursive_render");

    for depth in 1..=4 {
        for (name, queries) in [("queries", true), ("unconditional", false)] {
            group.bench_with_input(BenchmarkId::new(name, depth), &depth, |b, &depth| {
                let mut engine = engine(depth, queries);
                b.iter(|| black_box(engine.render()));
            });
        }
    }

    group.finish();
}

fn benchmark_depth_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("fill_triangle");

    let triangle = Triangle::new([
        Vec3::new(10.0, 10.0, 0.5),
        Vec3::new(300.0, 20.0, 0.5),
        Vec3::new(160.0, 230.0, 0.5),
    ]);
    let shader = FlatShader::new(0xFFFF0000);

    for (name, mode) in [("write", DepthMode::Write), ("probe", DepthMode::Probe)] {
        group.bench_function(name, |b| {
            let mut target = RenderTarget::new(BUFFER_WIDTH, BUFFER_HEIGHT);
            b.iter(|| {
                target.clear_depth();
                let mut fb = target.as_framebuffer();
                fill_triangle(black_box(&triangle), &mut fb, &shader, mode)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_recursion_depth, benchmark_depth_modes);
criterion_main!(benches);
