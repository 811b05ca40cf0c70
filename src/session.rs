/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! One human-in-the-loop review pass, end to end.
//!
//! ```text
//! fingerprints + weights → Clusterer → Partition → LayoutEngine
//!        ↑                                               ↓
//!   WeightPolicy ← FeedbackLedger ← FeedbackSource ← RasterSink
//! ```
//!
//! The collaborators outside the crate (clustering, display, the human) sit
//! behind the [`Clusterer`], [`RasterSink`] and [`FeedbackSource`] traits.
//! Everything is synchronous and single-threaded.

use std::io::{BufRead, Write};
use std::string::String;
use std::vec::Vec;

use hashbrown::HashMap;
use log::{debug, info};

use crate::annotate::{annotations, Annotation};
use crate::error::Result;
use crate::identity::{ClusterId, IdentityPolicy, ImageId};
use crate::layout::{ClusterPlacement, LayoutConfig, LayoutEngine, LayoutResult};
use crate::ledger::{unix_millis, FeedbackLedger, Verdict};
use crate::partition::Partition;
use crate::pixels::ImageMap;
use crate::policy::{PolicyConfig, WeightPolicy, WeightSet};

/// Per-image feature vectors, computed upstream.
pub type Fingerprints = HashMap<ImageId, Vec<f32>>;

// ─── Collaborator seams ─────────────────────────────────────────────────────

/// The external clustering algorithm.
pub trait Clusterer {
    /// Partition the fingerprinted images, biased by `weights`.
    fn cluster(&self, fingerprints: &Fingerprints, weights: &WeightSet) -> Partition;
}

impl<F> Clusterer for F
where
    F: Fn(&Fingerprints, &WeightSet) -> Partition,
{
    fn cluster(&self, fingerprints: &Fingerprints, weights: &WeightSet) -> Partition {
        self(fingerprints, weights)
    }
}

/// Where finished rasters go (a window, a PNG, a test buffer).
pub trait RasterSink {
    /// Show `layout` with its overlay commands.
    fn present(&mut self, layout: &LayoutResult, annotations: &[Annotation]) -> Result<()>;
}

/// The reviewer.
pub trait FeedbackSource {
    /// Judge one rendered cluster. `Ok(None)` skips it.
    fn judge(&mut self, placement: &ClusterPlacement) -> Result<Option<Verdict>>;
}

/// Asks on a text stream, one cluster at a time.
///
/// Accepts `y`/`n` (and the other spellings [`Verdict`] parses), `s` to skip.
/// Unparseable answers are asked again; end of input skips the rest.
pub struct PromptJudge<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptJudge<R, W> {
    /// Read answers from `input`, write prompts to `output`.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> FeedbackSource for PromptJudge<R, W> {
    fn judge(&mut self, placement: &ClusterPlacement) -> Result<Option<Verdict>> {
        loop {
            write!(
                self.output,
                "Cluster {} ({} images) good? [y/n/s] ",
                placement.display_index, placement.filled_rows
            )?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let answer = line.trim();
            if answer.eq_ignore_ascii_case("s") || answer.eq_ignore_ascii_case("skip") {
                return Ok(None);
            }
            match Verdict::try_from(answer) {
                Ok(v) => return Ok(Some(v)),
                Err(e) => writeln!(self.output, "{}", e)?,
            }
        }
    }
}

// ─── Session ────────────────────────────────────────────────────────────────

/// Configuration for a [`Session`].
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionConfig {
    /// Layout settings.
    pub layout: LayoutConfig,
    /// Weight policy settings.
    pub policy: PolicyConfig,
    /// How feedback is keyed.
    pub identity: IdentityPolicy,
}

/// Outcome of one [`Session::run_pass`].
#[derive(Clone, Debug, PartialEq)]
pub struct PassReport {
    /// Clusters shown.
    pub rendered: usize,
    /// Clusters accepted.
    pub accepted: usize,
    /// Clusters rejected.
    pub rejected: usize,
    /// Clusters skipped.
    pub skipped: usize,
    /// Weights after the pass.
    pub weights: WeightSet,
}

/// Owns the ledger and the policy across review passes.
#[derive(Debug)]
pub struct Session {
    identity: IdentityPolicy,
    engine: LayoutEngine,
    ledger: FeedbackLedger,
    policy: WeightPolicy,
}

impl Session {
    /// Fresh session with an empty ledger.
    pub fn new(config: SessionConfig) -> Result<Self> {
        Self::with_state(config, FeedbackLedger::new())
    }

    /// Resume from an existing ledger. Weights are rebuilt by replaying it.
    pub fn with_state(config: SessionConfig, ledger: FeedbackLedger) -> Result<Self> {
        let mut policy = WeightPolicy::new(config.policy)?;
        policy.replay(&ledger);
        Ok(Self {
            identity: config.identity,
            engine: LayoutEngine::new(config.layout),
            ledger,
            policy,
        })
    }

    /// Cluster, render, present, collect verdicts, learn.
    ///
    /// A layout or presentation failure aborts before anything is recorded.
    /// Verdicts are collected for every cluster first and only then written
    /// to the ledger, so a failing judge leaves the ledger unchanged.
    pub fn run_pass<C, S, J>(
        &mut self,
        fingerprints: &Fingerprints,
        images: &ImageMap,
        clusterer: &C,
        sink: &mut S,
        judge: &mut J,
    ) -> Result<PassReport>
    where
        C: Clusterer + ?Sized,
        S: RasterSink + ?Sized,
        J: FeedbackSource + ?Sized,
    {
        let partition = clusterer.cluster(fingerprints, self.policy.current_weights());
        debug!(
            "Session::run_pass partition clusters={} stats={:?}",
            partition.cluster_count(),
            partition.stats()
        );

        let layout = self.engine.render(&partition, images)?;
        let ids: Vec<ClusterId> = layout
            .placements
            .iter()
            .map(|p| self.identity.cluster_id(&p.members, p.display_index))
            .collect();

        let ledger = &self.ledger;
        let overlay = annotations(&layout, |p| {
            let id = ids[p.column];
            ledger.tally(id).map(|t| t.confidence())
        });
        sink.present(&layout, &overlay)?;

        let mut verdicts = Vec::with_capacity(layout.placements.len());
        for p in &layout.placements {
            verdicts.push(judge.judge(p)?);
        }

        let now = unix_millis();
        let (mut accepted, mut rejected, mut skipped) = (0, 0, 0);
        for (id, verdict) in ids.iter().zip(verdicts) {
            match verdict {
                Some(v) => {
                    self.ledger.record_verdict(*id, v, now);
                    self.policy.apply_verdict(v);
                    if v.is_accepted() {
                        accepted += 1;
                    } else {
                        rejected += 1;
                    }
                }
                None => skipped += 1,
            }
        }

        info!(
            "review pass: rendered={} accepted={} rejected={} skipped={} weights={:?}",
            layout.placements.len(),
            accepted,
            rejected,
            skipped,
            self.policy.current_weights()
        );

        Ok(PassReport {
            rendered: layout.placements.len(),
            accepted,
            rejected,
            skipped,
            weights: self.policy.current_weights().clone(),
        })
    }

    /// The feedback gathered so far.
    pub fn ledger(&self) -> &FeedbackLedger {
        &self.ledger
    }

    /// The weight policy.
    pub fn policy(&self) -> &WeightPolicy {
        &self.policy
    }

    /// Mutable access to the policy, for restoring persisted weights.
    pub fn policy_mut(&mut self) -> &mut WeightPolicy {
        &mut self.policy
    }

    /// Current confidence for a cluster under this session's identity policy.
    pub fn confidence_for(&self, members: &[ImageId], display_index: usize) -> f32 {
        self.ledger
            .confidence(self.identity.cluster_id(members, display_index))
    }

    /// Give up the session, keeping its state.
    pub fn into_parts(self) -> (FeedbackLedger, WeightPolicy) {
        (self.ledger, self.policy)
    }
}
