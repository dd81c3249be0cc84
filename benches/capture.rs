use std::collections::HashSet;

use criterion::{criterion_group, criterion_main, Criterion, black_box};

use vcap::context::{ExportContext, VcapSettings};
use vcap::core::types::Vec2;
use vcap::frame::{DeltaFrame, Frame, FrameSequence, Keyframe};
use vcap::model::{BlockModel, ModelTable};
use vcap::world::{BlockPos, BlockState, ChunkBox, ChunkPos, GridWorld};

fn scene() -> (GridWorld, ModelTable) {
    let world = GridWorld::new(0, 64);
    world.fill(
        BlockPos::new(-16, 0, -16),
        BlockPos::new(15, 24, 15),
        &BlockState::new("minecraft:stone"),
    );
    let table = ModelTable::new()
        .with_block("minecraft:stone", BlockModel::cube(Vec2::ZERO, Vec2::splat(0.5)))
        .with_block("minecraft:glass", BlockModel::cube(Vec2::splat(0.5), Vec2::ONE).transparent());
    (world, table)
}

fn bench_keyframe_2x2_chunks(c: &mut Criterion) {
    let (world, table) = scene();
    let bounds = ChunkBox::new(ChunkPos::new(-1, -1), ChunkPos::new(1, 1)).unwrap();

    c.bench_function("keyframe_2x2_chunks", |b| {
        b.iter(|| {
            let mut ctx = ExportContext::new(VcapSettings::default());
            Keyframe::capture(&world, &table, black_box(bounds), &mut ctx, 0.0)
        });
    });
}

fn bench_delta_256_changes(c: &mut Criterion) {
    let (world, table) = scene();
    let bounds = ChunkBox::new(ChunkPos::new(-1, -1), ChunkPos::new(1, 1)).unwrap();
    let mut ctx = ExportContext::new(VcapSettings::default());
    let mut frames = FrameSequence::new();
    frames
        .push(Frame::Key(Keyframe::capture(&world, &table, bounds, &mut ctx, 0.0)))
        .unwrap();

    let glass = BlockState::new("minecraft:glass");
    let changed: HashSet<BlockPos> = (0..256)
        .map(|i| BlockPos::new(i % 32 - 16, 25 + i / 128, (i / 32) % 4 * 8 - 16))
        .collect();
    for &pos in &changed {
        world.set_block(pos, glass.clone());
    }

    c.bench_function("delta_256_changes", |b| {
        b.iter(|| {
            let view = frames.view().unwrap();
            DeltaFrame::capture(&world, &table, black_box(&changed), 1.0, &view, &mut ctx)
        });
    });
}

criterion_group!(
    benches,
    bench_keyframe_2x2_chunks,
    bench_delta_256_changes,
);
criterion_main!(benches);
