/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Python FFI bindings via PyO3.
//!
//! Exposes the feedback ledger and the weight policy so a Python review
//! front-end can keep its state in Rust. Layout stays on the Rust side.
//!
//! # Building the Python extension
//!
//! ```bash
//! pip install maturin
//! maturin develop --features python-ffi
//! ```
//!
//! # Usage
//!
//! ```python
//! from imagecluster_core import FeedbackLedger, WeightPolicy, cluster_id
//!
//! ledger = FeedbackLedger()
//! policy = WeightPolicy()
//! cid = cluster_id(["a.jpg", "b.jpg"])
//! ledger.record(cid, True)
//! policy.apply_feedback(True)
//! print(ledger.confidence(cid))      # 1.0
//! print(policy.current_weights())    # {'similarity': 0.6, ...}
//! ```

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict};

use crate::error::Error;
use crate::identity::ClusterId;
use crate::ledger::FeedbackLedger;
use crate::policy::{PolicyConfig, WeightPolicy};

fn to_py_err(e: Error) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Accept only a real Python `bool`; `1`, `"yes"` and friends are rejected.
fn strict_bool(value: &Bound<'_, PyAny>) -> PyResult<bool> {
    let b = value.downcast::<PyBool>().map_err(|_| {
        PyValueError::new_err(format!(
            "accepted must be a bool, got {}",
            value
                .get_type()
                .name()
                .map(|n| n.to_string())
                .unwrap_or_else(|_| "unknown".to_string())
        ))
    })?;
    Ok(b.is_true())
}

// ── cluster_id ───────────────────────────────────────────────────────────────

/// Stable cluster id from member identifiers (order-independent).
#[pyfunction]
#[pyo3(name = "cluster_id")]
pub fn py_cluster_id(members: Vec<String>) -> u64 {
    ClusterId::from_members(&members).as_u64()
}

// ── FeedbackLedger ───────────────────────────────────────────────────────────

/// Append-only accept/reject history with per-cluster confidence.
#[pyclass(name = "FeedbackLedger")]
#[derive(Clone)]
pub struct PyFeedbackLedger {
    inner: FeedbackLedger,
}

#[pymethods]
impl PyFeedbackLedger {
    /// Create an empty ledger.
    #[new]
    pub fn new() -> Self {
        Self {
            inner: FeedbackLedger::new(),
        }
    }

    /// Record a judgment.
    ///
    /// Args:
    ///     cluster_id: integer cluster id (see `cluster_id()`)
    ///     accepted:   bool; anything else raises ValueError and records nothing
    ///     timestamp:  milliseconds; defaults to now
    #[pyo3(signature = (cluster_id, accepted, timestamp=None))]
    pub fn record(
        &mut self,
        cluster_id: u64,
        accepted: &Bound<'_, PyAny>,
        timestamp: Option<u64>,
    ) -> PyResult<()> {
        let accepted = strict_bool(accepted)?;
        let id = ClusterId(cluster_id);
        match timestamp {
            Some(t) => self.inner.record(id, accepted, t),
            None => self.inner.record_now(id, accepted),
        }
        Ok(())
    }

    /// Acceptance ratio in [0.0, 1.0]; 0.5 for clusters with no feedback.
    pub fn confidence(&self, cluster_id: u64) -> f32 {
        self.inner.confidence(ClusterId(cluster_id))
    }

    /// All records as `(cluster_id, accepted, timestamp)` tuples, oldest first.
    pub fn history(&self) -> Vec<(u64, bool, u64)> {
        self.inner
            .history()
            .iter()
            .map(|r| (r.cluster_id().as_u64(), r.accepted(), r.timestamp()))
            .collect()
    }

    /// Number of records.
    pub fn __len__(&self) -> usize {
        self.inner.len()
    }

    /// Python repr string.
    pub fn __repr__(&self) -> String {
        format!(
            "FeedbackLedger(records={}, clusters={})",
            self.inner.len(),
            self.inner.cluster_count()
        )
    }
}

// ── WeightPolicy ─────────────────────────────────────────────────────────────

/// Bounded weights nudged up on accept and down on reject.
#[pyclass(name = "WeightPolicy")]
pub struct PyWeightPolicy {
    inner: WeightPolicy,
}

#[pymethods]
impl PyWeightPolicy {
    /// Create a policy.
    ///
    /// Args:
    ///     keys:           weight names (default similarity, pattern, structure)
    ///     initial_weight: starting value (default 0.5)
    ///     min_weight:     lower clamp (default 0.1)
    ///     max_weight:     upper clamp (default 0.9)
    ///     learning_rate:  step per judgment (default 0.1)
    #[new]
    #[pyo3(signature = (keys=None, initial_weight=0.5, min_weight=0.1, max_weight=0.9, learning_rate=0.1))]
    pub fn new(
        keys: Option<Vec<String>>,
        initial_weight: f32,
        min_weight: f32,
        max_weight: f32,
        learning_rate: f32,
    ) -> PyResult<Self> {
        let defaults = PolicyConfig::default();
        let config = PolicyConfig {
            keys: keys.unwrap_or(defaults.keys),
            initial_weight,
            min_weight,
            max_weight,
            learning_rate,
        };
        let inner = WeightPolicy::new(config).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Move every weight one step up (True) or down (False).
    pub fn apply_feedback(&mut self, accepted: &Bound<'_, PyAny>) -> PyResult<()> {
        self.inner.apply_feedback(strict_bool(accepted)?);
        Ok(())
    }

    /// Reset and re-apply the ledger's history in order.
    pub fn replay(&mut self, ledger: &PyFeedbackLedger) {
        self.inner.replay(&ledger.inner);
    }

    /// Current weights as a dict.
    pub fn current_weights<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let d = PyDict::new_bound(py);
        for (k, v) in self.inner.current_weights().iter() {
            d.set_item(k, v)?;
        }
        Ok(d)
    }

    /// Python repr string.
    pub fn __repr__(&self) -> String {
        format!("WeightPolicy({:?})", self.inner.current_weights())
    }
}

// ── Module entry point ────────────────────────────────────────────────────────

/// Feedback ledger and weight policy for image cluster review.
#[pymodule]
pub fn imagecluster_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyFeedbackLedger>()?;
    m.add_class::<PyWeightPolicy>()?;
    m.add_function(wrap_pyfunction!(py_cluster_id, m)?)?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add("NEUTRAL_CONFIDENCE", crate::ledger::NEUTRAL_CONFIDENCE)?;
    Ok(())
}
