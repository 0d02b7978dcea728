use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use arena_rl_core::Facing;
use arena_rl_env::{
    CellState, GridCoord, GridVisitationTracker, ObservationEncoder, PositionHistory,
    RewardShaper,
};

fn walk(steps: i32) -> Vec<GridCoord> {
    (0..steps)
        .map(|i| GridCoord::new(i.rem_euclid(24), (i / 24).rem_euclid(24)))
        .collect()
}

fn criterion_benchmark(c: &mut Criterion) {
    let path = walk(512);
    let encoder = ObservationEncoder::default();
    let shaper = RewardShaper::default();

    c.bench_function("tracker_mark_footprint", |b| {
        b.iter(|| {
            let mut tracker = GridVisitationTracker::new(26, 26);
            for &cell in &path {
                black_box(tracker.mark_footprint(cell, 2));
            }
        })
    });

    c.bench_function("tick_pipeline", |b| {
        b.iter(|| {
            let mut tracker = GridVisitationTracker::new(26, 26);
            let mut history = PositionHistory::new();
            let mut unknown = 26 * 26;
            for &cell in &path {
                tracker.mark_footprint(cell, 2);
                let now = tracker.count_by_state(CellState::Unknown);
                let reward = shaper.reward(unknown, now, &tracker, cell, &mut history);
                unknown = now;
                let prior = history.recent_distinct(4, cell);
                black_box((reward, encoder.encode(cell, Facing::Right, &prior, &tracker)));
            }
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
