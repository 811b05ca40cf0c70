/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Bounded weight policy driven by cluster feedback.
//!
//! - [`WeightSet`]: fixed, small table of named scalar weights fed to the
//!   external clustering function.
//! - [`PolicyConfig`]: key set, initial value, bounds and step size.
//! - [`WeightPolicy`]: sole owner of the live weights. The ledger never
//!   touches them; the policy reads the ledger only through [`WeightPolicy::replay`].
//!
//! # Invariants
//!
//! - Every weight stays in `[min_weight, max_weight]` after every update.
//! - `replay` is a pure function of the ledger's ordered history: the same
//!   history replayed twice yields identical weights.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use heapless::{String as HString, Vec as HVec};
use log::debug;

use crate::error::{Error, Result};
use crate::ledger::{FeedbackLedger, Verdict};

/// Maximum number of named weights a policy can carry.
pub const MAX_WEIGHT_KEYS: usize = 8;

/// Maximum length in bytes of a weight name.
pub const MAX_KEY_LEN: usize = 32;

/// Name of one weight.
pub type WeightKey = HString<MAX_KEY_LEN>;

// ─── WeightSet ──────────────────────────────────────────────────────────────

/// Named scalar weights in a fixed order.
///
/// Values are only changed by [`WeightPolicy`]; everyone else sees snapshots.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeightSet {
    entries: HVec<(WeightKey, f32), MAX_WEIGHT_KEYS>,
}

impl WeightSet {
    fn with_keys<S: AsRef<str>>(keys: &[S], value: f32) -> Result<Self> {
        let mut entries = HVec::new();
        for k in keys {
            let k = k.as_ref();
            let mut key = WeightKey::new();
            key.push_str(k).map_err(|_| {
                Error::invalid(
                    "weight key",
                    alloc::format!("'{}' is longer than {} bytes", k, MAX_KEY_LEN),
                )
            })?;
            entries.push((key, value)).map_err(|_| {
                Error::invalid(
                    "weight keys",
                    alloc::format!("more than {} keys", MAX_WEIGHT_KEYS),
                )
            })?;
        }
        Ok(Self { entries })
    }

    /// Value of the weight called `name`.
    pub fn get(&self, name: &str) -> Option<f32> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == name)
            .map(|(_, v)| *v)
    }

    /// `(name, value)` pairs in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Weight names in configuration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of weights.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if the set has no weights.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn values_mut(&mut self) -> impl Iterator<Item = &mut f32> + '_ {
        self.entries.iter_mut().map(|(_, v)| v)
    }
}

// ─── Config ─────────────────────────────────────────────────────────────────

/// Configuration for a [`WeightPolicy`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolicyConfig {
    /// Weight names, in the order the clustering function expects them.
    /// Default: `similarity`, `pattern`, `structure`.
    pub keys: Vec<String>,
    /// Value every weight starts from and returns to on reset. Default 0.5.
    pub initial_weight: f32,
    /// Lower clamp. Default 0.1.
    pub min_weight: f32,
    /// Upper clamp. Default 0.9.
    pub max_weight: f32,
    /// Additive step per feedback event. Default 0.1.
    pub learning_rate: f32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            keys: ["similarity", "pattern", "structure"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            initial_weight: 0.5,
            min_weight: 0.1,
            max_weight: 0.9,
            learning_rate: 0.1,
        }
    }
}

impl PolicyConfig {
    /// Check bounds, step size and key set.
    pub fn validate(&self) -> Result<()> {
        let values = [
            ("min_weight", self.min_weight),
            ("max_weight", self.max_weight),
            ("initial_weight", self.initial_weight),
            ("learning_rate", self.learning_rate),
        ];
        for (name, v) in values {
            if !v.is_finite() {
                return Err(Error::invalid("policy config", alloc::format!("{} is {}", name, v)));
            }
        }
        if self.min_weight >= self.max_weight {
            return Err(Error::invalid(
                "policy config",
                alloc::format!(
                    "min_weight ({}) must be below max_weight ({})",
                    self.min_weight, self.max_weight
                ),
            ));
        }
        if self.learning_rate <= 0.0 {
            return Err(Error::invalid(
                "policy config",
                alloc::format!("learning_rate must be positive, got {}", self.learning_rate),
            ));
        }
        if self.initial_weight < self.min_weight || self.initial_weight > self.max_weight {
            return Err(Error::invalid(
                "policy config",
                alloc::format!(
                    "initial_weight {} outside [{}, {}]",
                    self.initial_weight, self.min_weight, self.max_weight
                ),
            ));
        }
        if self.keys.is_empty() {
            return Err(Error::invalid("policy config", "no weight keys"));
        }
        if self.keys.len() > MAX_WEIGHT_KEYS {
            return Err(Error::invalid(
                "policy config",
                alloc::format!("{} keys, at most {}", self.keys.len(), MAX_WEIGHT_KEYS),
            ));
        }
        for (i, k) in self.keys.iter().enumerate() {
            if k.len() > MAX_KEY_LEN {
                return Err(Error::invalid(
                    "policy config",
                    alloc::format!("key '{}' is longer than {} bytes", k, MAX_KEY_LEN),
                ));
            }
            if self.keys[..i].contains(k) {
                return Err(Error::invalid(
                    "policy config",
                    alloc::format!("duplicate weight key '{}'", k),
                ));
            }
        }
        Ok(())
    }

    fn clamp(&self, v: f32) -> f32 {
        v.clamp(self.min_weight, self.max_weight)
    }
}

// ─── LearningRule ───────────────────────────────────────────────────────────

/// How one verdict moves the weights.
///
/// Implementations must leave every value inside the config's bounds.
pub trait LearningRule {
    /// Apply `verdict` to `weights` in place.
    fn update(&self, weights: &mut WeightSet, verdict: Verdict, config: &PolicyConfig);
}

/// Every weight moves by `learning_rate` together: up on accept, down on
/// reject, clamped to the bounds.
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformStep;

impl LearningRule for UniformStep {
    fn update(&self, weights: &mut WeightSet, verdict: Verdict, config: &PolicyConfig) {
        let delta = match verdict {
            Verdict::Accepted => config.learning_rate,
            Verdict::Rejected => -config.learning_rate,
        };
        for v in weights.values_mut() {
            *v = config.clamp(*v + delta);
        }
    }
}

// ─── WeightPolicy ───────────────────────────────────────────────────────────

/// Owns the live [`WeightSet`] and updates it from feedback.
#[derive(Clone, Debug)]
pub struct WeightPolicy<R: LearningRule = UniformStep> {
    config: PolicyConfig,
    initial: WeightSet,
    weights: WeightSet,
    rule: R,
}

impl WeightPolicy<UniformStep> {
    /// Validate `config` and start every weight at `initial_weight`.
    pub fn new(config: PolicyConfig) -> Result<Self> {
        Self::with_rule(config, UniformStep)
    }
}

impl<R: LearningRule> WeightPolicy<R> {
    /// Like [`WeightPolicy::new`] with a custom update rule.
    pub fn with_rule(config: PolicyConfig, rule: R) -> Result<Self> {
        config.validate()?;
        let initial = WeightSet::with_keys(&config.keys, config.initial_weight)?;
        Ok(Self {
            weights: initial.clone(),
            initial,
            config,
            rule,
        })
    }

    /// Move every weight up (accepted) or down (rejected) by one step.
    pub fn apply_feedback(&mut self, accepted: bool) {
        self.apply_verdict(Verdict::from_bool(accepted));
    }

    /// Apply one [`Verdict`].
    pub fn apply_verdict(&mut self, verdict: Verdict) {
        self.rule.update(&mut self.weights, verdict, &self.config);
    }

    /// Reset to the initial weights, then apply every ledger record in order.
    pub fn replay(&mut self, ledger: &FeedbackLedger) {
        self.reset();
        for record in ledger.history() {
            self.apply_verdict(record.verdict());
        }
        debug!(
            "WeightPolicy::replay records={} weights={:?}",
            ledger.len(),
            self.weights
        );
    }

    /// Return every weight to `initial_weight`.
    pub fn reset(&mut self) {
        self.weights = self.initial.clone();
    }

    /// Read-only view of the live weights.
    pub fn current_weights(&self) -> &WeightSet {
        &self.weights
    }

    /// The configuration this policy was built with.
    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Replace the live weights with previously persisted ones.
    ///
    /// `weights` must carry exactly this policy's keys, in order, with every
    /// value inside the bounds. On error the live weights are unchanged.
    pub fn restore(&mut self, weights: WeightSet) -> Result<()> {
        if !weights.keys().eq(self.initial.keys()) {
            return Err(Error::invalid("weights", "key set does not match the policy"));
        }
        if let Some((k, v)) = weights
            .iter()
            .find(|(_, v)| !(v.is_finite() && *v >= self.config.min_weight && *v <= self.config.max_weight))
        {
            return Err(Error::invalid(
                "weights",
                alloc::format!(
                    "{} = {} outside [{}, {}]",
                    k, v, self.config.min_weight, self.config.max_weight
                ),
            ));
        }
        self.weights = weights;
        Ok(())
    }

    /// Build a weight set with this policy's keys from `(name, value)` pairs.
    ///
    /// Used when reloading persisted weights; values are checked by [`restore`](Self::restore).
    pub fn weights_from_pairs<'a, I>(&self, pairs: I) -> Result<WeightSet>
    where
        I: IntoIterator<Item = (&'a str, f32)>,
    {
        let mut set = self.initial.clone();
        let mut filled = [false; MAX_WEIGHT_KEYS];
        for (name, value) in pairs {
            let i = set
                .entries
                .iter()
                .position(|(k, _)| k.as_str() == name)
                .ok_or_else(|| Error::invalid("weights", alloc::format!("unknown key '{}'", name)))?;
            if filled[i] {
                return Err(Error::invalid(
                    "weights",
                    alloc::format!("key '{}' given more than once", name),
                ));
            }
            filled[i] = true;
            set.entries[i].1 = value;
        }
        if let Some(i) = filled[..set.len()].iter().position(|f| !f) {
            return Err(Error::invalid(
                "weights",
                alloc::format!("no value for key '{}'", set.entries[i].0),
            ));
        }
        Ok(set)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ClusterId;

    fn single_key(initial: f32) -> PolicyConfig {
        PolicyConfig {
            keys: alloc::vec!["similarity".to_string()],
            initial_weight: initial,
            ..PolicyConfig::default()
        }
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_default_weights() {
        let p = WeightPolicy::new(PolicyConfig::default()).unwrap();
        let w = p.current_weights();
        assert_eq!(w.len(), 3);
        assert_eq!(w.get("similarity"), Some(0.5));
        assert_eq!(w.get("pattern"), Some(0.5));
        assert_eq!(w.get("structure"), Some(0.5));
        assert_eq!(w.get("colour"), None);
    }

    #[test]
    fn test_accepts_climb_then_clamp() {
        let mut p = WeightPolicy::new(single_key(0.5)).unwrap();
        let expected = [0.6, 0.7, 0.8, 0.9, 0.9];
        for e in expected {
            p.apply_feedback(true);
            let v = p.current_weights().get("similarity").unwrap();
            assert!(approx(v, e), "v={} expected={}", v, e);
        }
    }

    #[test]
    fn test_rejects_never_go_below_min() {
        let mut p = WeightPolicy::new(PolicyConfig::default()).unwrap();
        for _ in 0..100 {
            p.apply_feedback(false);
        }
        for (_, v) in p.current_weights().iter() {
            assert!(v >= 0.1 && v <= 0.9, "v={}", v);
            assert!(approx(v, 0.1));
        }
    }

    #[test]
    fn test_all_weights_move_together() {
        let mut p = WeightPolicy::new(PolicyConfig::default()).unwrap();
        p.apply_feedback(true);
        p.apply_feedback(true);
        p.apply_feedback(false);
        let vals: Vec<f32> = p.current_weights().iter().map(|(_, v)| v).collect();
        assert!(vals.iter().all(|v| approx(*v, 0.6)), "{:?}", vals);
    }

    #[test]
    fn test_replay_is_deterministic() {
        let mut ledger = FeedbackLedger::new();
        for i in 0..25u64 {
            ledger.record(ClusterId(i % 3), i % 4 != 0, i);
        }
        let mut p = WeightPolicy::new(PolicyConfig::default()).unwrap();
        p.apply_feedback(false);
        p.replay(&ledger);
        let first = p.current_weights().clone();
        p.apply_feedback(true);
        p.replay(&ledger);
        assert_eq!(&first, p.current_weights());

        let mut fresh = WeightPolicy::new(PolicyConfig::default()).unwrap();
        fresh.replay(&ledger);
        assert_eq!(&first, fresh.current_weights());
    }

    #[test]
    fn test_replay_empty_ledger_resets() {
        let mut p = WeightPolicy::new(PolicyConfig::default()).unwrap();
        p.apply_feedback(true);
        p.replay(&FeedbackLedger::new());
        assert_eq!(p.current_weights().get("pattern"), Some(0.5));
    }

    #[test]
    fn test_invalid_configs() {
        let bad_bounds = PolicyConfig {
            min_weight: 0.9,
            max_weight: 0.9,
            ..PolicyConfig::default()
        };
        assert!(matches!(
            WeightPolicy::new(bad_bounds),
            Err(Error::InvalidInput { .. })
        ));

        let bad_rate = PolicyConfig {
            learning_rate: 0.0,
            ..PolicyConfig::default()
        };
        assert!(WeightPolicy::new(bad_rate).is_err());

        let nan = PolicyConfig {
            initial_weight: f32::NAN,
            ..PolicyConfig::default()
        };
        assert!(WeightPolicy::new(nan).is_err());

        let outside = PolicyConfig {
            initial_weight: 0.95,
            ..PolicyConfig::default()
        };
        assert!(WeightPolicy::new(outside).is_err());

        let dup = PolicyConfig {
            keys: alloc::vec!["a".to_string(), "a".to_string()],
            ..PolicyConfig::default()
        };
        assert!(WeightPolicy::new(dup).is_err());

        let empty = PolicyConfig {
            keys: Vec::new(),
            ..PolicyConfig::default()
        };
        assert!(WeightPolicy::new(empty).is_err());

        let too_many = PolicyConfig {
            keys: (0..MAX_WEIGHT_KEYS + 1).map(|i| alloc::format!("k{}", i)).collect(),
            ..PolicyConfig::default()
        };
        assert!(WeightPolicy::new(too_many).is_err());

        let long_key = PolicyConfig {
            keys: alloc::vec!["x".repeat(MAX_KEY_LEN + 1)],
            ..PolicyConfig::default()
        };
        assert!(matches!(
            long_key.validate(),
            Err(Error::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_restore_checks_keys_and_bounds() {
        let mut p = WeightPolicy::new(PolicyConfig::default()).unwrap();
        let good = p
            .weights_from_pairs([("similarity", 0.2), ("pattern", 0.3), ("structure", 0.9)])
            .unwrap();
        p.restore(good).unwrap();
        assert_eq!(p.current_weights().get("pattern"), Some(0.3));

        let out_of_range = p
            .weights_from_pairs([("similarity", 0.95), ("pattern", 0.3), ("structure", 0.9)])
            .unwrap();
        assert!(p.restore(out_of_range).is_err());
        assert_eq!(p.current_weights().get("similarity"), Some(0.2));

        assert!(p.weights_from_pairs([("colour", 0.5)]).is_err());
        assert!(p.weights_from_pairs([("pattern", 0.5)]).is_err());
    }

    #[test]
    fn test_repeated_key_cannot_stand_in_for_missing_one() {
        let p = WeightPolicy::new(PolicyConfig::default()).unwrap();
        let err = p
            .weights_from_pairs([("similarity", 0.2), ("similarity", 0.3), ("pattern", 0.3)])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));

        let err = p
            .weights_from_pairs([
                ("similarity", 0.2),
                ("pattern", 0.3),
                ("structure", 0.4),
                ("pattern", 0.6),
            ])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
    }

    #[test]
    fn test_custom_rule_plugs_in() {
        struct OnlyFirst;
        impl LearningRule for OnlyFirst {
            fn update(&self, w: &mut WeightSet, v: Verdict, c: &PolicyConfig) {
                if let Some(first) = w.values_mut().next() {
                    let d = if v.is_accepted() { c.learning_rate } else { -c.learning_rate };
                    *first = c.clamp(*first + d);
                }
            }
        }
        let mut p = WeightPolicy::with_rule(PolicyConfig::default(), OnlyFirst).unwrap();
        p.apply_feedback(true);
        assert!(approx(p.current_weights().get("similarity").unwrap(), 0.6));
        assert_eq!(p.current_weights().get("pattern"), Some(0.5));
    }
}
