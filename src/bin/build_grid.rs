//! Builds a LOD hierarchy for a generated grid and reports the result.
//!
//! Usage: cargo run --release --bin build_grid -- [OPTIONS]
//!
//! Options:
//!   --size <N>        Grid resolution in quads per side (default: 64)
//!   --config <PATH>   LodConfig JSON file (default: built-in defaults)
//!   --stats <PATH>    Write build statistics as JSON
//!   --prepare         Weld and cache-optimize the mesh first

use std::path::PathBuf;
use std::time::Instant;

use meshlod::core::logging;
use meshlod::mesh::{create_test_grid, prepare};
use meshlod::{LodBuilder, LodConfig};

fn main() {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let size = parse_u32_arg(&args, "--size").unwrap_or(64);
    let config_path = parse_str_arg(&args, "--config").map(PathBuf::from);
    let stats_path = parse_str_arg(&args, "--stats").map(PathBuf::from);
    let run_prepare = args.iter().any(|a| a == "--prepare");

    if let Err(e) = run(size, config_path, stats_path, run_prepare) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(
    size: u32,
    config_path: Option<PathBuf>,
    stats_path: Option<PathBuf>,
    run_prepare: bool,
) -> meshlod::Result<()> {
    let config = match &config_path {
        Some(path) => LodConfig::load(path)?,
        None => LodConfig::default(),
    };

    let mut mesh = create_test_grid(size);
    if run_prepare {
        mesh = prepare(&mesh)?;
    }

    println!("=== Meshlod Grid Build ===");
    println!("Grid:      {}x{} ({} triangles)", size, size, mesh.triangle_count());
    println!("Max LODs:  {}", config.max_lod_count);
    println!("Parallel:  {}", config.parallel);
    println!();

    let start = Instant::now();
    let lod = LodBuilder::new(config).build(&mesh)?;
    let elapsed = start.elapsed();

    for level in &lod.stats.levels {
        println!(
            "  LOD {:>2}: {:>6} meshlets, {:>5} groups ({} accepted, {} rejected)",
            level.lod, level.meshlets, level.groups, level.accepted_groups, level.rejected_groups
        );
    }
    println!();
    println!("Meshlets:  {}", lod.stats.total_meshlets);
    println!("LODs:      {}", lod.lod_count());
    println!("BVH nodes: {} (depth {})", lod.bvh.node_count(), lod.bvh.depth());
    println!("Time:      {:.1}ms", elapsed.as_secs_f64() * 1000.0);

    if let Some(path) = stats_path {
        let json = serde_json::to_string_pretty(&lod.stats)?;
        std::fs::write(&path, json)?;
        println!("Stats written to {}", path.display());
    }

    Ok(())
}

fn parse_u32_arg(args: &[String], flag: &str) -> Option<u32> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
