//! # Interactive cluster review
//!
//! Builds a synthetic corpus of 24 tiny images in four colour families,
//! clusters them with a weight-sensitive toy clusterer, and runs three
//! review passes. Each pass prints the grid geometry and labels, asks for a
//! verdict per cluster, and shows how the weights and confidences move.
//!
//! ```bash
//! cargo run --example review_session --features std            # answer y/n/s
//! cargo run --example review_session --features std -- --auto  # scripted answers
//! ```

use std::io;

use imagecluster_core::session::{
    Clusterer, FeedbackSource, Fingerprints, PromptJudge, RasterSink, Session, SessionConfig,
};
use imagecluster_core::{
    Annotation, ClusterPlacement, ImageMap, LayoutConfig, LayoutResult, Partition, PixelBuffer,
    Result, Verdict, WeightSet,
};

// ── Corpus ───────────────────────────────────────────────────────────────────

const FAMILIES: [(&str, [u8; 3]); 4] = [
    ("red", [200, 40, 40]),
    ("green", [40, 180, 60]),
    ("blue", [40, 60, 200]),
    ("grey", [128, 128, 128]),
];

/// Six images per family; the fingerprint is the colour plus a little jitter.
fn corpus() -> Result<(Fingerprints, ImageMap)> {
    let mut fps = Fingerprints::new();
    let mut images = ImageMap::new();
    for (family, rgb) in FAMILIES {
        for i in 0..6u8 {
            let name = format!("{}_{:02}.png", family, i);
            let jitter = (i as f32 - 2.5) * 6.0;
            fps.insert(
                name.clone(),
                rgb.iter().map(|&c| c as f32 + jitter).collect(),
            );
            let shade = rgb.map(|c| c.saturating_add(i * 4));
            images.insert(name, PixelBuffer::filled(16, 12, shade)?);
        }
    }
    Ok((fps, images))
}

// ── Collaborators ────────────────────────────────────────────────────────────

/// Greedy threshold clustering on RGB distance.
///
/// The threshold shrinks as `similarity` grows, so accepting clusters makes
/// the next pass stricter and rejecting them makes it looser.
struct ThresholdClusterer;

impl Clusterer for ThresholdClusterer {
    fn cluster(&self, fingerprints: &Fingerprints, weights: &WeightSet) -> Partition {
        let similarity = weights.get("similarity").unwrap_or(0.5);
        let threshold = 80.0 * (1.0 - similarity) + 5.0;

        let mut names: Vec<&String> = fingerprints.keys().collect();
        names.sort();

        let mut clusters: Vec<(Vec<f32>, Vec<String>)> = Vec::new();
        for name in names {
            let fp = &fingerprints[name];
            let home = clusters.iter_mut().find(|(centre, _)| {
                centre
                    .iter()
                    .zip(fp)
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum::<f32>()
                    .sqrt()
                    < threshold
            });
            match home {
                Some((_, members)) => members.push(name.clone()),
                None => clusters.push((fp.clone(), vec![name.clone()])),
            }
        }
        Partition::from_clusters(clusters.into_iter().map(|(_, m)| m))
    }
}

/// Prints a text rendition of the raster instead of drawing it.
struct ConsoleSink;

impl RasterSink for ConsoleSink {
    fn present(&mut self, layout: &LayoutResult, annotations: &[Annotation]) -> Result<()> {
        println!(
            "  raster {}×{} px, {} columns, {} rows, {:.1} KiB",
            layout.raster.width(),
            layout.raster.height(),
            layout.placements.len(),
            layout.rows,
            layout.raster.byte_len() as f64 / 1024.0
        );
        for a in annotations {
            if let Annotation::Label { x, text, .. } = a {
                println!("    label @ x={:>6.1}  {}", x, text);
            }
        }
        Ok(())
    }
}

/// Accepts single-family clusters, rejects mixed ones.
struct Oracle;

impl FeedbackSource for Oracle {
    fn judge(&mut self, placement: &ClusterPlacement) -> Result<Option<Verdict>> {
        let family = |id: &String| id.split('_').next().map(str::to_string);
        let first = placement.members.first().and_then(family);
        let pure = placement.members.iter().all(|m| family(m) == first);
        let verdict = Verdict::from_bool(pure);
        println!(
            "  cluster {} ({} images): {}",
            placement.display_index,
            placement.filled_rows,
            if pure { "accept" } else { "reject" }
        );
        Ok(Some(verdict))
    }
}

// ── Main ─────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let auto = std::env::args().any(|a| a == "--auto");
    let (fingerprints, images) = corpus()?;

    let mut session = Session::new(SessionConfig {
        layout: LayoutConfig {
            padding: 4,
            mem_limit: 256 * 1024,
            ..LayoutConfig::default()
        },
        ..SessionConfig::default()
    })?;

    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║  Image cluster review: 24 images, 4 colour families      ║");
    println!("╚══════════════════════════════════════════════════════════╝\n");

    let stdin = io::stdin();
    for pass in 1..=3 {
        println!("▶  PASS {}\n", pass);
        let report = if auto {
            session.run_pass(
                &fingerprints,
                &images,
                &ThresholdClusterer,
                &mut ConsoleSink,
                &mut Oracle,
            )?
        } else {
            let mut judge = PromptJudge::new(stdin.lock(), io::stdout());
            session.run_pass(
                &fingerprints,
                &images,
                &ThresholdClusterer,
                &mut ConsoleSink,
                &mut judge,
            )?
        };
        println!(
            "\n  accepted={} rejected={} skipped={}",
            report.accepted, report.rejected, report.skipped
        );
        for (k, v) in report.weights.iter() {
            println!("  weight {:<10} {:.2}", k, v);
        }
        println!();
    }

    let summary = session.ledger().summary();
    println!(
        "Ledger: {} accepted, {} rejected across {} clusters",
        summary.accepted, summary.rejected, summary.clusters
    );
    for point in session.ledger().progress() {
        println!(
            "  t={} {} running acceptance {:.2}",
            point.timestamp,
            if point.accepted { "✓" } else { "✗" },
            point.running_rate
        );
    }

    Ok(())
}
