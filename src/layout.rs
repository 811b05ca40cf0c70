/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Cluster grid layout: pack a size-grouped partition into one raster.
//!
//! One column per rendered cluster, left to right in increasing size order
//! (original order within a size); one row per image, top to bottom. Every
//! cell is one image footprint. Adjacent columns are separated by `padding`
//! pixels of background.
//!
//! ```text
//!  col 1      col 2      col 3
//! +------+ | +------+ | +------+
//! | a    | | | c    | | | f    |
//! +------+ | +------+ | +------+
//! | b    | | | d    | | | g    |
//! +------+ | +------+ | +------+
//!   (bg)   | | e    | | | h    |
//!          | +------+ | +------+
//! ```
//!
//! # Invariants
//!
//! - The memory estimate is checked before the canvas is allocated; a layout
//!   over budget never allocates.
//! - Layout is all-or-nothing: any error means no raster.
//! - [`LayoutEngine`] knows nothing about feedback; callers join placements
//!   to confidence scores themselves (see [`crate::annotate`]).

use alloc::vec::Vec;

use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::identity::ImageId;
use crate::partition::{ClusterRef, Partition};
use crate::pixels::{ImageMap, PixelBuffer, CHANNELS};

/// Default horizontal gap between cluster columns, in pixels.
pub const DEFAULT_PADDING: usize = 20;

/// Default memory budget for the raster: 1 GiB.
pub const DEFAULT_MEM_LIMIT: u64 = 1024 * 1024 * 1024;

/// White.
pub const DEFAULT_BACKGROUND: [u8; CHANNELS] = [255, 255, 255];

// ─── Config ─────────────────────────────────────────────────────────────────

/// Configuration for a [`LayoutEngine`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutConfig {
    /// Background gap between adjacent columns, in pixels. Default 20.
    pub padding: usize,
    /// Clusters larger than this are left out entirely. Default: no limit.
    pub max_cluster_size: Option<usize>,
    /// Upper bound on the estimated raster size, in bytes. Default 1 GiB.
    pub mem_limit: u64,
    /// Fill colour for padding and empty cells. Default white.
    pub background: [u8; CHANNELS],
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            padding: DEFAULT_PADDING,
            max_cluster_size: None,
            mem_limit: DEFAULT_MEM_LIMIT,
            background: DEFAULT_BACKGROUND,
        }
    }
}

/// Estimated raster size in bytes.
///
/// `rows · cell_h · (cols · cell_w + cols · padding) · 3`. Padding is counted
/// once per column, so the estimate is never below the real canvas size.
/// Saturates at `u64::MAX` instead of overflowing.
pub fn estimate_bytes(rows: usize, cols: usize, cell: (usize, usize), padding: usize) -> u64 {
    let (cell_h, cell_w) = cell;
    let row_px = (cols as u64)
        .saturating_mul(cell_w as u64)
        .saturating_add((cols as u64).saturating_mul(padding as u64));
    (rows as u64)
        .saturating_mul(cell_h as u64)
        .saturating_mul(row_px)
        .saturating_mul(CHANNELS as u64)
}

// ─── Plan ───────────────────────────────────────────────────────────────────

/// Everything decided about a layout before any pixel is allocated.
#[derive(Clone, Debug)]
pub struct LayoutPlan<'a> {
    /// Rendered clusters in column order.
    pub clusters: Vec<ClusterRef<'a>>,
    /// Image rows (largest rendered cluster).
    pub rows: usize,
    /// Shared `(height, width)` of every image.
    pub cell: (usize, usize),
    /// Gap between columns.
    pub padding: usize,
    /// Result of [`estimate_bytes`] for this plan.
    pub estimated_bytes: u64,
}

impl LayoutPlan<'_> {
    /// Number of image columns.
    pub fn columns(&self) -> usize {
        self.clusters.len()
    }

    /// Canvas width: `N · w + (N − 1) · padding`.
    pub fn canvas_width(&self) -> usize {
        let n = self.columns();
        n * self.cell.1 + n.saturating_sub(1) * self.padding
    }

    /// Canvas height: `rows · h`.
    pub fn canvas_height(&self) -> usize {
        self.rows * self.cell.0
    }

    /// Left edge of column `col`.
    pub fn column_x(&self, col: usize) -> usize {
        col * (self.cell.1 + self.padding)
    }
}

// ─── Result ─────────────────────────────────────────────────────────────────

/// Where one cluster landed in the raster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterPlacement {
    /// 0-based column.
    pub column: usize,
    /// 1-based label shown to the reviewer.
    pub display_index: usize,
    /// Size key the cluster was grouped under.
    pub size: usize,
    /// Position within its size group (matches the export directory index).
    pub index_in_size: usize,
    /// First pixel column of the cluster's content.
    pub x_start: usize,
    /// One past the last pixel column of the cluster's content.
    pub x_end: usize,
    /// Image rows actually drawn; the rest of the column is background.
    pub filled_rows: usize,
    /// Member identifiers, top to bottom.
    pub members: Vec<ImageId>,
}

/// The composite raster plus per-cluster placement metadata.
#[derive(Clone, Debug)]
pub struct LayoutResult {
    /// The composite image.
    pub raster: PixelBuffer,
    /// One entry per rendered cluster, in column order.
    pub placements: Vec<ClusterPlacement>,
    /// Shared `(height, width)` of every cell.
    pub cell: (usize, usize),
    /// Gap between columns.
    pub padding: usize,
    /// Image rows.
    pub rows: usize,
}

// ─── Engine ─────────────────────────────────────────────────────────────────

/// Packs clusters of equally sized images into one memory-bounded raster.
#[derive(Clone, Debug, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    /// Construct an engine with `config`.
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// The engine's configuration.
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Select clusters, fix the grid and check the memory budget.
    ///
    /// Allocates no pixel memory.
    pub fn plan<'a>(&self, partition: &'a Partition, images: &ImageMap) -> Result<LayoutPlan<'a>> {
        let max = self.config.max_cluster_size;
        let clusters: Vec<ClusterRef<'a>> = partition
            .iter_ordered()
            .filter(|c| max.map_or(true, |m| c.size <= m))
            .collect();

        let rows = clusters.iter().map(|c| c.members.len()).max().unwrap_or(0);
        if rows == 0 {
            return Err(Error::EmptyInput);
        }

        let cell = uniform_shape(&clusters, images)?;
        let estimated_bytes = estimate_bytes(rows, clusters.len(), cell, self.config.padding);

        debug!(
            "LayoutEngine::plan clusters={} rows={} cell={:?} padding={} estimated_bytes={}",
            clusters.len(),
            rows,
            cell,
            self.config.padding,
            estimated_bytes
        );

        if estimated_bytes > self.config.mem_limit {
            warn!(
                "LayoutEngine::plan over budget: {} bytes > mem_limit {} bytes",
                estimated_bytes, self.config.mem_limit
            );
            return Err(Error::CapacityExceeded {
                estimated: estimated_bytes,
                limit: self.config.mem_limit,
            });
        }

        Ok(LayoutPlan {
            clusters,
            rows,
            cell,
            padding: self.config.padding,
            estimated_bytes,
        })
    }

    /// Plan, allocate and fill the raster.
    pub fn render(&self, partition: &Partition, images: &ImageMap) -> Result<LayoutResult> {
        let plan = self.plan(partition, images)?;
        self.render_plan(&plan, images)
    }

    /// Fill the raster for a plan produced by [`plan`](Self::plan) with the
    /// same image map.
    fn render_plan(&self, plan: &LayoutPlan<'_>, images: &ImageMap) -> Result<LayoutResult> {
        let (cell_h, cell_w) = plan.cell;
        let mut raster = PixelBuffer::filled(
            plan.canvas_width(),
            plan.canvas_height(),
            self.config.background,
        )?;

        let mut placements = Vec::with_capacity(plan.columns());
        for (col, cluster) in plan.clusters.iter().enumerate() {
            let x = plan.column_x(col);
            for (row, id) in cluster.members.iter().enumerate() {
                // Presence and shape were checked by `plan`.
                if let Some(img) = images.get(id) {
                    raster.blit(img, x, row * cell_h);
                }
            }
            placements.push(ClusterPlacement {
                column: col,
                display_index: col + 1,
                size: cluster.size,
                index_in_size: cluster.index_in_size,
                x_start: x,
                x_end: x + cell_w,
                filled_rows: cluster.members.len(),
                members: cluster.members.to_vec(),
            });
        }

        info!(
            "plot array (u8) size: {:.3} MiB",
            raster.byte_len() as f64 / (1024.0 * 1024.0)
        );

        Ok(LayoutResult {
            raster,
            placements,
            cell: plan.cell,
            padding: plan.padding,
            rows: plan.rows,
        })
    }
}

/// The `(height, width)` every rendered image must share.
fn uniform_shape(clusters: &[ClusterRef<'_>], images: &ImageMap) -> Result<(usize, usize)> {
    let mut expected: Option<(usize, usize)> = None;
    for id in clusters.iter().flat_map(|c| c.members.iter()) {
        let img = images
            .get(id)
            .ok_or_else(|| Error::MissingImage { id: id.clone() })?;
        let found = img.shape();
        match expected {
            None => expected = Some(found),
            Some(e) if e != found => {
                return Err(Error::InconsistentShape {
                    id: id.clone(),
                    expected: e,
                    found,
                })
            }
            Some(_) => {}
        }
    }
    expected.ok_or(Error::EmptyInput)
}

// ─── Tests ──────────────────────────────────────────────────────────────────
