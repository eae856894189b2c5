use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use groundgraph_core::graph::ViolationGraph;
use groundgraph_core::homography::{estimate, CalibrationInput};
use groundgraph_core::projection::project_point;

fn bench_dlt_estimate(c: &mut Criterion) {
    let input = CalibrationInput {
        image_quad: [
            [420.0, 200.0],
            [860.0, 210.0],
            [1100.0, 700.0],
            [180.0, 690.0],
        ],
        rect_width: 8.0,
        rect_height: 12.0,
        safe_distance: 2.0,
    };

    c.bench_function("dlt_estimate_4pt", |b| {
        b.iter(|| estimate(black_box(&input)).unwrap())
    });
}

fn bench_frame_projection(c: &mut Criterion) {
    let cal = estimate(&CalibrationInput {
        image_quad: [
            [420.0, 200.0],
            [860.0, 210.0],
            [1100.0, 700.0],
            [180.0, 690.0],
        ],
        rect_width: 8.0,
        rect_height: 12.0,
        safe_distance: 2.0,
    })
    .unwrap();

    let mut rng = StdRng::seed_from_u64(7);
    let feet: Vec<[f64; 2]> = (0..32)
        .map(|_| [rng.gen_range(200.0..1000.0), rng.gen_range(300.0..680.0)])
        .collect();

    c.bench_function("project_32_feet", |b| {
        b.iter(|| {
            for p in &feet {
                let _ = black_box(project_point(&cal.homography, *p));
            }
        })
    });
}

fn bench_graph_build(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(11);
    let points: Vec<Option<[f64; 2]>> = (0..64)
        .map(|_| Some([rng.gen_range(0.0..1000.0), rng.gen_range(0.0..1000.0)]))
        .collect();

    c.bench_function("violation_graph_64", |b| {
        b.iter(|| ViolationGraph::build(black_box(&points), black_box(120.0)))
    });
}

criterion_group!(
    benches,
    bench_dlt_estimate,
    bench_frame_projection,
    bench_graph_build
);
criterion_main!(benches);
