use criterion::{Criterion, black_box, criterion_group, criterion_main};
use region_moments::analysis::compute_moments;
use region_moments::{BinaryMask, MomentEngine, ReferenceShape, ShapeClassifier};

fn bench_compute_moments_circle(c: &mut Criterion) {
    let mask = ReferenceShape::Circle.render(512);
    c.bench_function("compute_moments_circle_512", |b| {
        b.iter(|| compute_moments(black_box(&mask)))
    });
}

fn bench_per_pair_central_moment(c: &mut Criterion) {
    let mask = ReferenceShape::Triangle.render(512);
    let engine = MomentEngine::from_mask(&mask);
    c.bench_function("central_moment_30_triangle_512", |b| {
        b.iter(|| engine.central_moment(black_box(3), black_box(0)))
    });
}

fn bench_classify(c: &mut Criterion) {
    let classifier = ShapeClassifier::new(200);
    let mask = BinaryMask::from_fn(256, 256, |i, j| {
        (64..192).contains(&i) && (32..224).contains(&j)
    })
    .unwrap();
    c.bench_function("classify_rectangle_256", |b| {
        b.iter(|| classifier.classify_mask(black_box(&mask)))
    });
}

criterion_group!(
    benches,
    bench_compute_moments_circle,
    bench_per_pair_central_moment,
    bench_classify
);
criterion_main!(benches);
