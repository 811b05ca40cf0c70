/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Overlay commands for a finished layout: column separators and numeric
//! labels, optionally with a confidence score.

use alloc::string::String;
use alloc::vec::Vec;

use crate::layout::{ClusterPlacement, LayoutResult};

/// Vertical offset of labels from the top of the raster, in pixels.
pub const LABEL_Y: f32 = 5.0;

/// One drawing command for a raster sink.
#[derive(Clone, Debug, PartialEq)]
pub enum Annotation {
    /// Dashed vertical line at `x`, centred in the gap left of a column.
    Separator {
        /// Horizontal position in raster pixels.
        x: f32,
    },
    /// Text label centred at `(x, y)`.
    Label {
        /// Horizontal centre in raster pixels.
        x: f32,
        /// Top edge in raster pixels.
        y: f32,
        /// Label text.
        text: String,
    },
}

/// Separators and labels for every placement in `layout`.
///
/// `confidence` is asked once per placement; returning `Some(score)` appends
/// the score to the label as `"3 (0.67)"`.
pub fn annotations<F>(layout: &LayoutResult, mut confidence: F) -> Vec<Annotation>
where
    F: FnMut(&ClusterPlacement) -> Option<f32>,
{
    let half_pad = layout.padding as f32 / 2.0;
    let half_cell = layout.cell.1 as f32 / 2.0;
    let mut out = Vec::with_capacity(layout.placements.len() * 2);
    for p in &layout.placements {
        let x = p.x_start as f32;
        out.push(Annotation::Separator { x: x - half_pad });
        let text = match confidence(p) {
            Some(c) => alloc::format!("{} ({:.2})", p.display_index, c),
            None => alloc::format!("{}", p.display_index),
        };
        out.push(Annotation::Label {
            x: x + half_cell,
            y: LABEL_Y,
            text,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutConfig, LayoutEngine};
    use crate::partition::Partition;
    use crate::pixels::{ImageMap, PixelBuffer};
    use alloc::string::ToString;
    use alloc::vec;

    fn two_column_layout() -> LayoutResult {
        let p = Partition::from_clusters(vec![
            vec!["a".to_string()],
            vec!["b".to_string(), "c".to_string()],
        ]);
        let mut imgs = ImageMap::new();
        for n in ["a", "b", "c"] {
            imgs.insert(n.to_string(), PixelBuffer::filled(10, 10, [0, 0, 0]).unwrap());
        }
        LayoutEngine::new(LayoutConfig {
            padding: 20,
            ..LayoutConfig::default()
        })
        .render(&p, &imgs)
        .unwrap()
    }

    #[test]
    fn test_separator_and_label_positions() {
        let layout = two_column_layout();
        let a = annotations(&layout, |_| None);
        assert_eq!(a.len(), 4);
        assert_eq!(a[0], Annotation::Separator { x: -10.0 });
        assert_eq!(
            a[1],
            Annotation::Label {
                x: 5.0,
                y: LABEL_Y,
                text: "1".to_string()
            }
        );
        assert_eq!(a[2], Annotation::Separator { x: 20.0 });
        assert_eq!(
            a[3],
            Annotation::Label {
                x: 35.0,
                y: LABEL_Y,
                text: "2".to_string()
            }
        );
    }

    #[test]
    fn test_confidence_in_label() {
        let layout = two_column_layout();
        let a = annotations(&layout, |p| (p.display_index == 2).then_some(2.0 / 3.0));
        match &a[3] {
            Annotation::Label { text, .. } => assert_eq!(text, "2 (0.67)"),
            other => panic!("unexpected {:?}", other),
        }
        match &a[1] {
            Annotation::Label { text, .. } => assert_eq!(text, "1"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
