//! Search configuration and the per-field boost policy.

use crate::document::{ANCHOR, HEADING, TAG, TEXT, TITLE};
use crate::error::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Weight applied to fields without an explicit boost.
pub const DEFAULT_FIELD_WEIGHT: f32 = 1.0;

/// Field name → score multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoostTable {
    weights: BTreeMap<String, f32>,
}

impl BoostTable {
    pub fn new() -> Self {
        Self { weights: BTreeMap::new() }
    }

    pub fn with(mut self, field: impl Into<String>, weight: f32) -> Self {
        self.weights.insert(field.into(), weight);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, weight: f32) {
        self.weights.insert(field.into(), weight);
    }

    /// Explicit weight for `field`, or [`DEFAULT_FIELD_WEIGHT`].
    pub fn weight(&self, field: &str) -> f32 {
        self.weights.get(field).copied().unwrap_or(DEFAULT_FIELD_WEIGHT)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.weights.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn validate(&self) -> Result<()> {
        for (field, weight) in &self.weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(SearchError::Configuration(format!(
                    "boost for field `{field}` must be a finite number >= 0, got {weight}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for BoostTable {
    fn default() -> Self {
        Self::new()
            .with(TITLE, 5.0)
            .with(HEADING, 3.0)
            .with(TEXT, 1.0)
            .with(TAG, 2.0)
            .with(ANCHOR, 4.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TieBreak {
    #[default]
    #[serde(rename = "insertion-order")]
    InsertionOrder,
}

/// How per-term matches combine into a document match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombineWith {
    /// A document matching any query term is a hit.
    #[default]
    Or,
    /// A document must match every query term.
    And,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchConfig {
    /// Edit-distance budget as a fraction of query term length, in `[0, 1)`.
    pub fuzziness: f32,
    pub prefix: bool,
    pub boosts: BoostTable,
    pub result_limit: usize,
    pub tie_break: TieBreak,
    pub combine_with: CombineWith,
    /// Score multiplier for prefix matches.
    pub prefix_weight: f32,
    /// Score multiplier for fuzzy matches, before the edit-distance discount.
    pub fuzzy_weight: f32,
    /// Hard cap on the fuzzy edit distance.
    pub max_fuzzy: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fuzziness: 0.3,
            prefix: true,
            boosts: BoostTable::default(),
            result_limit: 20,
            tie_break: TieBreak::InsertionOrder,
            combine_with: CombineWith::Or,
            prefix_weight: 0.375,
            fuzzy_weight: 0.45,
            max_fuzzy: 6,
        }
    }
}

impl SearchConfig {
    /// Exact matching only, default boosts.
    pub fn exact() -> Self {
        Self { fuzziness: 0.0, prefix: false, ..Self::default() }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.fuzziness >= 0.0 && self.fuzziness < 1.0) {
            return Err(SearchError::Configuration(format!(
                "fuzziness must be in [0, 1), got {}",
                self.fuzziness
            )));
        }
        if self.result_limit == 0 {
            return Err(SearchError::Configuration("resultLimit must be > 0".into()));
        }
        for (name, w) in [("prefixWeight", self.prefix_weight), ("fuzzyWeight", self.fuzzy_weight)] {
            if !(w > 0.0 && w < 1.0) {
                return Err(SearchError::Configuration(format!("{name} must be in (0, 1), got {w}")));
            }
        }
        if self.fuzziness > 0.0 && self.max_fuzzy == 0 {
            return Err(SearchError::Configuration("maxFuzzy must be > 0 when fuzziness is set".into()));
        }
        self.boosts.validate()
    }

    /// Load a JSON config file and validate it.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: SearchConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }
}
