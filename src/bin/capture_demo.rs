//! Headless capture demo: records a small procedurally built scene into a Vcap.
//!
//! Usage: cargo run --release --bin capture_demo -- [OPTIONS]
//!
//! Options:
//!   --radius <CHUNKS>   Capture radius around chunk (0, 0) (default: 1)
//!   --ticks <N>         Simulated render ticks with block placements (default: 20)
//!   --seed <SEED>       Seed for the scene and mesh variants (default: settings seed)
//!   --out <NAME>        Output name, written to <NAME>.vcap (default: "capture_demo")
//!   --settings <JSON>   Capture settings file (default: built-in settings)

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use log::info;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use vcap::atlas::StaticAtlas;
use vcap::core::Result;
use vcap::core::types::Vec2;
use vcap::events::BlockEventBus;
use vcap::model::{BlockModel, ModelTable};
use vcap::world::{BlockPos, BlockState, ChunkBox, ChunkPos, FluidState, GridWorld};
use vcap::{CaptureSession, RenderQueue, VcapExporter, VcapSettings};

const BOTTOM_Y: i32 = 0;
const TOP_Y: i32 = 32;
const SEA_LEVEL: i32 = 8;

#[tokio::main]
async fn main() -> Result<()> {
    vcap::core::logging::try_init_with_timestamps();

    let args: Vec<String> = std::env::args().collect();
    let radius = parse_u32_arg(&args, "--radius").unwrap_or(1);
    let ticks = parse_u32_arg(&args, "--ticks").unwrap_or(20);
    let out = parse_str_arg(&args, "--out").unwrap_or_else(|| "capture_demo".to_string());
    let mut settings = match parse_str_arg(&args, "--settings") {
        Some(path) => VcapSettings::load_sync(Path::new(&path))?,
        None => VcapSettings::default(),
    };
    if let Some(seed) = parse_u64_arg(&args, "--seed") {
        settings.seed = seed;
    }

    let bounds = ChunkBox::around(ChunkPos::new(0, 0), radius)?;
    let path = PathBuf::from(format!("{out}.vcap"));

    println!("=== Vcap Capture Demo ===");
    println!("Radius: {} chunk(s)", radius);
    println!("Ticks:  {}", ticks);
    println!("Seed:   {}", settings.seed);
    println!("Output: {}", path.display());
    println!();

    let world = Arc::new(GridWorld::new(BOTTOM_Y, TOP_Y));
    let mut heights = build_terrain(&world, bounds);
    info!("Built terrain with {} blocks", world.block_count());

    let (mut queue, render) = RenderQueue::new(StaticAtlas::new(generate_atlas()));
    let bus = BlockEventBus::new();
    let exporter = VcapExporter::new(
        world.clone(),
        Arc::new(model_table()),
        bounds.min(),
        bounds.max(),
        settings.clone(),
    )?;
    let session = CaptureSession::start(out.as_str(), exporter, &bus, render.clone())?;

    let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);
    let placeable = placeable_blocks();
    let columns: Vec<(i32, i32)> = heights.keys().copied().collect();
    for _ in 0..ticks {
        if columns.is_empty() {
            break;
        }
        for _ in 0..rng.gen_range(1..=6) {
            let (x, z) = columns[rng.gen_range(0..columns.len())];
            let Some(height) = heights.get_mut(&(x, z)) else {
                continue;
            };
            if *height >= TOP_Y {
                continue;
            }
            let pos = BlockPos::new(x, *height, z);
            let state = placeable[rng.gen_range(0..placeable.len())].clone();
            world.set_fluid(pos, FluidState::empty());
            world.set_block(pos, state.clone());
            bus.publish(pos, &state);
            *height += 1;
        }
        tokio::time::sleep(queue.tick_interval()).await;
        queue.pump();
    }

    let exporter = session.finish()?;
    let frame_count = exporter.frames().len();
    let file = BufWriter::new(File::create(&path)?);
    let mut file = queue.drive(exporter.save(file, &render)).await?;
    file.flush()?;

    info!("Wrote {} frame(s) to {}", frame_count, path.display());
    Ok(())
}

/// Rolling hills of stone, dirt and grass, with water in the valleys.
/// Returns the first free Y of every column.
fn build_terrain(world: &GridWorld, bounds: ChunkBox) -> HashMap<(i32, i32), i32> {
    let stone = BlockState::new("minecraft:stone");
    let dirt = BlockState::new("minecraft:dirt");
    let grass = BlockState::new("minecraft:grass_block");
    let water = FluidState::source("minecraft:water");

    let mut heights = HashMap::new();
    for pos in bounds.positions(0, 1) {
        let (x, z) = (pos.x, pos.z);
        let wave = (x as f32 * 0.21).sin() * 2.5 + (z as f32 * 0.17).cos() * 2.5;
        let h = (SEA_LEVEL as f32 + wave).round() as i32;

        world.fill(BlockPos::new(x, BOTTOM_Y, z), BlockPos::new(x, h - 3, z), &stone);
        world.fill(BlockPos::new(x, h - 2, z), BlockPos::new(x, h - 2, z), &dirt);
        world.set_block(BlockPos::new(x, h - 1, z), grass.clone());
        for y in h..SEA_LEVEL {
            world.set_fluid(BlockPos::new(x, y, z), water.clone());
        }
        heights.insert((x, z), h.max(SEA_LEVEL));
    }
    heights
}

fn model_table() -> ModelTable {
    let tile = |i: f32, j: f32| (Vec2::new(i, j) * 0.25, Vec2::new(i + 1.0, j + 1.0) * 0.25);
    let (stone_min, stone_max) = tile(0.0, 0.0);
    let (dirt_min, dirt_max) = tile(1.0, 0.0);
    let (overlay_min, overlay_max) = tile(2.0, 0.0);
    let (glass_min, glass_max) = tile(3.0, 0.0);
    let (log_min, log_max) = tile(0.0, 1.0);
    let (water_min, water_max) = tile(1.0, 1.0);

    ModelTable::new()
        .with_block("minecraft:stone", BlockModel::cube(stone_min, stone_max))
        .with_block("minecraft:dirt", BlockModel::cube(dirt_min, dirt_max))
        .with_block(
            "minecraft:grass_block",
            BlockModel::cube_with_overlay(dirt_min, dirt_max, overlay_min, overlay_max),
        )
        .with_block("minecraft:glass", BlockModel::cube(glass_min, glass_max).transparent())
        .with_block("minecraft:furnace", BlockModel::cube(log_min, log_max))
        .with_fluid("minecraft:water", water_min, water_max)
}

fn placeable_blocks() -> Vec<BlockState> {
    let mut blocks = vec![BlockState::new("minecraft:stone"), BlockState::new("minecraft:glass")];
    for facing in ["north", "east", "south", "west"] {
        blocks.push(BlockState::new("minecraft:furnace").with("facing", facing));
    }
    blocks
}

/// 64x64 atlas of flat 16x16 tiles
fn generate_atlas() -> RgbaImage {
    const PALETTE: [[u8; 4]; 8] = [
        [125, 125, 125, 255],
        [134, 96, 67, 255],
        [255, 255, 255, 255],
        [200, 230, 255, 96],
        [112, 112, 112, 255],
        [255, 255, 255, 180],
        [0, 0, 0, 0],
        [0, 0, 0, 0],
    ];
    RgbaImage::from_fn(64, 64, |x, y| {
        let tile = (y / 16 * 4 + x / 16) as usize;
        Rgba(PALETTE.get(tile).copied().unwrap_or([0, 0, 0, 0]))
    })
}

fn parse_u32_arg(args: &[String], flag: &str) -> Option<u32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_u64_arg(args: &[String], flag: &str) -> Option<u64> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
