//! # Layout memory budget
//!
//! Shows how the grid estimate grows with cluster count and image size, and
//! how the engine refuses a layout over budget before allocating anything.
//! Uses only the default (`no_std` + `alloc`) API.
//!
//! ```bash
//! cargo run --example layout_budget
//! ```

use imagecluster_core::{
    estimate_bytes, Error, ImageMap, LayoutConfig, LayoutEngine, Partition, PixelBuffer, Result,
};

const MIB: f64 = 1024.0 * 1024.0;

/// `clusters` clusters of sizes 1, 2, 3, ... with `h × w` grey images.
fn staircase(clusters: usize, h: usize, w: usize) -> Result<(Partition, ImageMap)> {
    let mut images = ImageMap::new();
    let mut groups = Vec::new();
    for c in 0..clusters {
        let members: Vec<String> = (0..=c).map(|i| format!("c{}_{}", c, i)).collect();
        for m in &members {
            images.insert(m.clone(), PixelBuffer::filled(w, h, [128, 128, 128])?);
        }
        groups.push(members);
    }
    Ok((Partition::from_clusters(groups), images))
}

fn main() -> Result<()> {
    println!("Estimated raster size, padding 20 px:\n");
    println!("  {:>8} {:>10} {:>12}", "clusters", "image", "estimate");
    for &(n, side) in &[(4usize, 64usize), (16, 64), (16, 256), (64, 256), (128, 512)] {
        let est = estimate_bytes(n, n, (side, side), 20);
        println!(
            "  {:>8} {:>10} {:>9.2} MiB",
            n,
            format!("{}×{}", side, side),
            est as f64 / MIB
        );
    }

    let (partition, images) = staircase(6, 32, 32)?;
    println!("\nStaircase partition:");
    for stat in partition.stats() {
        println!("  size {} → {} cluster(s)", stat.size, stat.count);
    }

    for limit in [64 * 1024u64, 16 * 1024 * 1024] {
        let engine = LayoutEngine::new(LayoutConfig {
            mem_limit: limit,
            ..LayoutConfig::default()
        });
        println!("\nmem_limit = {:.3} MiB", limit as f64 / MIB);
        match engine.render(&partition, &images) {
            Ok(layout) => {
                println!(
                    "  rendered {}×{} px, {} columns",
                    layout.raster.width(),
                    layout.raster.height(),
                    layout.placements.len()
                );
                for p in &layout.placements {
                    println!(
                        "    #{:<2} x={:>4}..{:<4} rows {}",
                        p.display_index, p.x_start, p.x_end, p.filled_rows
                    );
                }
            }
            Err(e @ Error::CapacityExceeded { .. }) => println!("  refused: {}", e),
            Err(e) => println!("  failed: {}", e),
        }
    }

    Ok(())
}
