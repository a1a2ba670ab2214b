use criterion::{black_box, criterion_group, criterion_main, Criterion};

use adcensus_disparity::adcensus::aggregate::{aggregate, Direction};
use adcensus_disparity::adcensus::window::WindowMap;
use adcensus_disparity::prelude::*;

fn textured(x: usize, y: usize) -> [f64; 3] {
    let v = ((x * 37 + y * 91) ^ (x * y * 13)) % 256;
    [v as f64, ((v * 3 + x) % 256) as f64, ((255 - v + y * 17) % 256) as f64]
}

fn adcensus_bench(c: &mut Criterion) {

    // Build frame, shifted by 5 pixels
    let frame = StereoFrame::new(
        ColorImage::from_fn(96, 64, textured),
        ColorImage::from_fn(96, 64, |x, y| textured(x + 5, y))
    );

    // Build disparity alg
    let params = Params {
        max_disparity: 16,
        ..Params::default()
    };
    let mut disp = AdCensus::new(params.clone()).unwrap();

    // Benchmark compute function
    c.bench_function("adcensus textured 96x64", |b| b.iter(|| disp.compute(black_box(&frame))));

    // Benchmark a single aggregation pass
    let volume = disp.cost_volume(&frame).unwrap();
    let limits = params.arm_limits();
    let left = WindowMap::build(&frame.left, &limits);
    let right = WindowMap::build(&frame.right, &limits);

    c.bench_function("aggregation pass 96x64x16", |b| {
        b.iter(|| aggregate(&left, &right, black_box(&volume), Direction::Horizontal))
    });
}

criterion_group!(benches, adcensus_bench);
criterion_main!(benches);
