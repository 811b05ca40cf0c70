//! # imagecluster-core
//!
//! Human-in-the-loop review for image clustering.
//!
//! An external clustering function groups images by fingerprint. This crate
//! lays the resulting clusters out into one composite raster for inspection,
//! records the reviewer's accept/reject judgment per cluster, and nudges a
//! small set of scalar weights that bias the next clustering run.
//!
//! ---
//!
//! ## The loop
//!
//! ```text
//! fingerprints + weights → (external) clustering → Partition
//!                                                      ↓
//!                                                LayoutEngine → raster + annotations
//!                                                                    ↓
//!        WeightPolicy ← FeedbackLedger ←───────────── reviewer judgments
//! ```
//!
//! Three pieces carry the logic:
//!
//! **Feedback ledger.** An append-only history of judgments keyed by
//! [`ClusterId`]. Confidence for a cluster is its acceptance ratio, 0.5 when it
//! has never been judged, and is always reproducible from the history.
//!
//! **Weight policy.** Every weight steps up on accept and down on reject,
//! clamped to `[min_weight, max_weight]`. Replaying the same history always
//! yields the same weights.
//!
//! **Layout engine.** One column per cluster, one row per image, padding
//! between columns, and a memory budget checked before anything is allocated.
//!
//! ## Module overview
//!
//! | Module | Key types | What it does |
//! |--------|-----------|--------------|
//! | [`identity`] | [`ClusterId`], [`IdentityPolicy`] | Stable or per-run cluster keys |
//! | [`ledger`] | [`FeedbackLedger`], [`FeedbackRecord`], [`Verdict`] | Judgment history and confidence |
//! | [`policy`] | [`WeightPolicy`], [`WeightSet`], [`PolicyConfig`] | Bounded uniform weight updates |
//! | [`partition`] | [`Partition`] | Clusters grouped by size |
//! | [`pixels`] | [`PixelBuffer`] | Owned RGB8 buffers |
//! | [`layout`] | [`LayoutEngine`], [`LayoutResult`] | Grid packing with a memory budget |
//! | [`annotate`] | [`Annotation`] | Separator and label overlays |
//! | `session` | `Session` | One review pass end to end (requires `std`) |
//! | `export` | `make_links` | Symlink farm mirroring clusters (requires `std`) |
//! | `snapshot` | `FeedbackSnapshot` | Serialisable ledger + weights (requires `serde`) |
//!
//! ## `no_std`
//!
//! The crate is `#![no_std]` with `alloc` by default. Enable `std` for
//! wall-clock timestamps, the review session and the symlink export, `serde`
//! for persistence, `image` for PNG conversion, `python-ffi` for bindings.
//!
//! ## License
//!
//! Business Source License 1.1.

#![cfg_attr(not(any(feature = "std", feature = "python-ffi", test)), no_std)]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

pub mod error;
pub mod identity;
pub mod ledger;
pub mod policy;
pub mod partition;
pub mod pixels;
pub mod layout;
pub mod annotate;

#[cfg(feature = "std")]
pub mod session;

#[cfg(all(feature = "std", unix))]
pub mod export;

#[cfg(feature = "serde")]
pub mod snapshot;

#[cfg(feature = "python-ffi")]
pub mod ffi;

pub use annotate::{annotations, Annotation};
pub use error::{Error, Result};
pub use identity::{ClusterId, IdentityPolicy, ImageId};
pub use layout::{estimate_bytes, ClusterPlacement, LayoutConfig, LayoutEngine, LayoutPlan, LayoutResult};
pub use ledger::{FeedbackLedger, FeedbackRecord, Tally, Verdict, NEUTRAL_CONFIDENCE};
pub use partition::{Partition, SizeStat};
pub use pixels::{ImageMap, PixelBuffer, CHANNELS};
pub use policy::{LearningRule, PolicyConfig, UniformStep, WeightPolicy, WeightSet};
