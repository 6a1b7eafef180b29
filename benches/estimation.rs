//! Motion estimation benchmarks.
//!
//! Full search against diamond search, and full search across thread counts.

use block_motion::capture::{Frame, FrameSource, SourceConfig, SyntheticSource};
use block_motion::estimation::{MotionEstimator, SearchParams, SearchStrategy};
use block_motion::prediction::{BoundaryPolicy, FramePredictor};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Two consecutive frames of a panning texture.
fn frame_pair(width: u32, height: u32) -> (Frame, Frame) {
    let config = SourceConfig {
        width,
        height,
        pan_x: 3,
        pan_y: -2,
        noise: 2,
        ..Default::default()
    };
    let mut source = SyntheticSource::with_config(&config).expect("valid source config");
    let reference = source.next_frame().expect("reference frame");
    let target = source.next_frame().expect("target frame");
    (reference, target)
}

// ============================================================================
// Search strategy benchmarks
// ============================================================================

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("strategy");

    let resolutions = [("cif", 352, 288), ("vga", 640, 480)];

    for (name, width, height) in resolutions {
        let (reference, target) = frame_pair(width, height);
        group.throughput(Throughput::Elements((width * height) as u64));

        for strategy in [SearchStrategy::Full, SearchStrategy::Diamond] {
            let estimator =
                MotionEstimator::new(SearchParams::new(16, 8).with_strategy(strategy));
            group.bench_with_input(
                BenchmarkId::new(strategy.to_string(), name),
                &estimator,
                |b, estimator| {
                    b.iter(|| estimator.estimate(black_box(&reference), black_box(&target)));
                },
            );
        }
    }

    group.finish();
}

// ============================================================================
// Thread scaling benchmarks
// ============================================================================

fn bench_threads(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_search_threads");
    let (reference, target) = frame_pair(640, 480);

    for threads in [1usize, 2, 4, 0] {
        let estimator = MotionEstimator::new(SearchParams::new(16, 8).with_threads(threads));
        group.bench_with_input(BenchmarkId::from_parameter(threads), &estimator, |b, estimator| {
            b.iter(|| estimator.estimate(black_box(&reference), black_box(&target)));
        });
    }

    group.finish();
}

// ============================================================================
// Prediction benchmarks
// ============================================================================

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("prediction");
    let (reference, target) = frame_pair(640, 480);
    let field = MotionEstimator::new(SearchParams::new(16, 8))
        .estimate(&reference, &target)
        .expect("estimation succeeds")
        .field;

    for policy in BoundaryPolicy::ALL {
        let predictor = FramePredictor::new(policy);
        group.bench_with_input(
            BenchmarkId::from_parameter(policy),
            &predictor,
            |b, predictor| {
                b.iter(|| predictor.predict(black_box(&reference), black_box(&field), 16));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_strategies, bench_threads, bench_prediction);
criterion_main!(benches);
