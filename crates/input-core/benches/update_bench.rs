//! Criterion benchmarks for the per-frame update.
//!
//! Measures an idle frame, a frame with queued changes and listeners, and the
//! no-listener fast path where deltas are not collected.
//!
//! Run with:
//! ```bash
//! cargo bench --package input-core --bench update_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use input_core::{
    Change, DeviceIndex, DeviceType, DeviceVariant, InputManager, Key, Keyboard, LoggingListener, Mouse,
    MouseButton, Pad, PadButton,
};

const DT: f32 = 1.0 / 60.0;

// ── Fixtures ──────────────────────────────────────────────────────────────────

fn make_manager(listeners: usize) -> InputManager {
    let mut manager = InputManager::new();
    manager.create_device::<Keyboard>(DeviceIndex::Auto, DeviceVariant::Standard);
    manager.create_device::<Mouse>(DeviceIndex::Auto, DeviceVariant::Standard);
    manager.create_device::<Pad>(DeviceIndex::Auto, DeviceVariant::Standard);
    for _ in 0..listeners {
        manager.add_listener(LoggingListener::default());
    }
    manager
}

/// Pushes `count` alternating key, click and stick changes.
fn push_changes(manager: &InputManager, count: usize, frame: u64) {
    let keyboard = manager.find_device_id(DeviceType::Keyboard, 0);
    let mouse = manager.find_device_id(DeviceType::Mouse, 0);
    let pad = manager.find_device_id(DeviceType::Pad, 0);
    let (Some(keyboard), Some(mouse), Some(pad)) = (keyboard, mouse, pad) else {
        return;
    };
    let down = frame % 2 == 0;
    for i in 0..count {
        let change = match i % 3 {
            0 => Change::bool(keyboard, Key::ALL[i % Key::COUNT], down),
            1 => Change::bool(mouse, MouseButton::Left, down),
            _ => Change::float(pad, PadButton::LeftStickX, (i as f32).sin()),
        };
        manager.push_change(change);
    }
}

// ── Benchmark groups ──────────────────────────────────────────────────────────

fn bench_idle_frame(c: &mut Criterion) {
    let mut manager = make_manager(1);
    c.bench_function("update_idle", |b| b.iter(|| manager.update(black_box(DT))));
}

fn bench_frame_with_changes(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_with_changes");
    for count in [8usize, 64, 512] {
        group.bench_with_input(BenchmarkId::new("listeners", count), &count, |b, &count| {
            let mut manager = make_manager(2);
            let mut frame = 0;
            b.iter(|| {
                push_changes(&manager, count, frame);
                manager.update(black_box(DT));
                frame += 1;
            })
        });
        group.bench_with_input(BenchmarkId::new("no_listeners", count), &count, |b, &count| {
            let mut manager = make_manager(0);
            let mut frame = 0;
            b.iter(|| {
                push_changes(&manager, count, frame);
                manager.update(black_box(DT));
                frame += 1;
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_idle_frame, bench_frame_with_changes);
criterion_main!(benches);
