//! Coarse supplier candidate ranking from declarative keyword profiles.
//!
//! The matcher never touches a parser: it only counts profile keywords in the
//! document, which keeps its cost flat as suppliers are added.

use tracing::debug;

use crate::error::StoreError;
use crate::models::config::MatcherConfig;
use crate::models::supplier::{Candidate, SupplierProfile};
use crate::store::ProfileStore;

/// Rank `profiles` against `text`.
///
/// Profiles with no keyword hits are excluded; confidence is
/// `min(match_count * points_per_keyword, 100)`; ties keep catalog order.
pub fn rank_candidates(
    text: &str,
    profiles: &[SupplierProfile],
    config: &MatcherConfig,
) -> Vec<Candidate> {
    let haystack = text.to_lowercase();

    let mut candidates: Vec<Candidate> = profiles
        .iter()
        .filter_map(|profile| {
            let keywords = profile.keyword_list();
            let matched_keywords: Vec<String> = keywords
                .iter()
                .filter(|k| haystack.contains(k.as_str()))
                .cloned()
                .collect();

            if matched_keywords.is_empty() {
                return None;
            }

            let match_count = matched_keywords.len();
            let points = (match_count as u64).saturating_mul(config.points_per_keyword as u64);
            let confidence = points.min(100) as u8;

            debug!(
                "Candidate {} matched {}/{} keywords ({})",
                profile.name,
                match_count,
                keywords.len(),
                confidence
            );

            Some(Candidate {
                supplier_id: profile.id.clone(),
                supplier_name: profile.name.clone(),
                keywords,
                matched_keywords,
                match_count,
                confidence,
            })
        })
        .collect();

    // sort_by is stable
    candidates.sort_by(|a, b| b.confidence.cmp(&a.confidence));
    candidates.truncate(config.max_candidates);
    candidates
}

/// Coarse matcher backed by a profile store.
pub struct MainSupplierMatcher<S> {
    store: S,
    config: MatcherConfig,
}

impl<S: ProfileStore> MainSupplierMatcher<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: MatcherConfig::default(),
        }
    }

    pub fn with_config(mut self, config: MatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Load active profiles and rank them. Store failures propagate unchanged.
    pub async fn find_candidates(&self, text: &str) -> Result<Vec<Candidate>, StoreError> {
        let profiles = self.store.active_profiles().await?;
        Ok(rank_candidates(text, &profiles, &self.config))
    }
}
