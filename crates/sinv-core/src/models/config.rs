//! Configuration structures for the detection pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, SinvError};

/// Points awarded per matched profile keyword during the coarse scan.
pub const POINTS_PER_KEYWORD: u32 = 25;

/// Maximum number of coarse candidates returned.
pub const MAX_CANDIDATES: usize = 5;

/// Number of top coarse candidates re-scored by their own parser.
pub const REFINE_TOP_N: usize = 3;

/// Minimum confidence for single-layer detection to select a supplier.
pub const DEFAULT_THRESHOLD: u8 = 60;

/// Main configuration for the sinv pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinvConfig {
    /// Detection and refinement configuration.
    pub detection: DetectionConfig,

    /// Coarse matcher configuration.
    pub matcher: MatcherConfig,

    /// Supplier profile source.
    pub profiles: ProfilesConfig,
}

/// Refinement and single-layer detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum confidence (0 - 100) for single-layer detection.
    pub threshold: u8,

    /// Number of top coarse candidates to refine.
    pub refine_top_n: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            refine_top_n: REFINE_TOP_N,
        }
    }
}

/// Coarse keyword matcher settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Points per matched keyword, capped at 100 in total.
    pub points_per_keyword: u32,

    /// Maximum candidates returned.
    pub max_candidates: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            points_per_keyword: POINTS_PER_KEYWORD,
            max_candidates: MAX_CANDIDATES,
        }
    }
}

/// Where supplier profiles are read from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilesConfig {
    /// JSON file holding an array of supplier profiles.
    pub path: Option<PathBuf>,
}

impl SinvConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| SinvError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| SinvError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
