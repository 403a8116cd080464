//! Category allocation map and the shared renormalization step

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Tolerance used when comparing allocation totals
pub const TOTAL_TOLERANCE: f64 = 1e-6;

/// Mapping from category name to allocated amount
///
/// Categories iterate in name order. The sum of the values is the amount
/// being allocated; every transform that changes individual values
/// renormalizes back to an explicit target so the total is conserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryAllocation(BTreeMap<String, f64>);

impl CategoryAllocation {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, category: &str) -> Option<f64> {
        self.0.get(category).copied()
    }

    /// Amount for a category, zero when absent
    pub fn amount(&self, category: &str) -> f64 {
        self.get(category).unwrap_or(0.0)
    }

    pub fn contains(&self, category: &str) -> bool {
        self.0.contains_key(category)
    }

    pub fn set(&mut self, category: impl Into<String>, amount: f64) {
        self.0.insert(category.into(), amount);
    }

    /// Multiply one category by `factor`. Returns false if the category is absent.
    pub fn scale(&mut self, category: &str, factor: f64) -> bool {
        match self.0.get_mut(category) {
            Some(v) => {
                *v *= factor;
                true
            }
            None => false,
        }
    }

    /// Multiply every category by `factor`
    pub fn scale_all(&mut self, factor: f64) {
        for v in self.0.values_mut() {
            *v *= factor;
        }
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// True when every value is finite and non-negative
    pub fn is_well_formed(&self) -> bool {
        self.0.values().all(|v| v.is_finite() && *v >= 0.0)
    }

    /// Whether the values sum to `target` within a relative tolerance
    pub fn sums_to(&self, target: f64) -> bool {
        let scale = target.abs().max(1.0);
        (self.total() - target).abs() <= TOTAL_TOLERANCE * scale
    }

    /// Rescale every value so the allocation sums to `target`
    ///
    /// Fails with `DegenerateAllocation` when the current total is zero,
    /// negative or not finite.
    pub fn try_renormalize(&self, target: f64) -> Result<Self> {
        let total = self.total();
        if !total.is_finite() || total <= 0.0 {
            return Err(Error::DegenerateAllocation(total));
        }
        let factor = target / total;
        let mut out = self.clone();
        out.scale_all(factor);
        Ok(out)
    }

    /// Like `try_renormalize`, but a degenerate allocation is returned unchanged
    pub fn renormalize(&self, target: f64) -> Self {
        match self.try_renormalize(target) {
            Ok(a) => a,
            Err(e) => {
                debug!(error = %e, "Skipping renormalization");
                self.clone()
            }
        }
    }

    /// Round every value to cents. The total may drift by the rounding error.
    pub fn rounded(&self) -> Self {
        Self(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), (v * 100.0).round() / 100.0))
                .collect(),
        )
    }

    pub fn into_inner(self) -> BTreeMap<String, f64> {
        self.0
    }
}

impl From<BTreeMap<String, f64>> for CategoryAllocation {
    fn from(map: BTreeMap<String, f64>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for CategoryAllocation {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
