//! Parser registry and the two-layer detection/dispatch pipeline.
//!
//! Detection runs in two layers: a coarse keyword scan over every supplier
//! profile ([`MainSupplierMatcher`]), then a refined check of the top
//! candidates by their own parsers. The winning parser then parses the text.
//!
//! ```text
//! Idle -> CoarseScan -> NoCandidates
//!                    -> RefineTop -> NoResolvableParser
//!                                 -> SelectBest -> Parse -> ParseFailure | Success
//! ```
//!
//! A registry is built once and is read-only afterwards, so it can be shared
//! across concurrent invocations behind an `Arc` without locking.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::matcher::MainSupplierMatcher;
use crate::models::config::DetectionConfig;
use crate::models::result::{DetectionTrail, ParseResult, RefinedScore, SupplierInfo};
use crate::models::supplier::Candidate;
use crate::parser::SupplierParser;
use crate::store::ProfileStore;

/// Stage of one pipeline invocation, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    CoarseScan,
    NoCandidates,
    RefineTop,
    NoResolvableParser,
    SelectBest,
    Parse,
    ParseFailure,
    Success,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::CoarseScan => "coarse_scan",
            Self::NoCandidates => "no_candidates",
            Self::RefineTop => "refine_top",
            Self::NoResolvableParser => "no_resolvable_parser",
            Self::SelectBest => "select_best",
            Self::Parse => "parse",
            Self::ParseFailure => "parse_failure",
            Self::Success => "success",
        };
        f.write_str(name)
    }
}

/// One parser's single-layer detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionScore {
    pub key: String,
    pub supplier_name: String,
    pub confidence: u8,
    pub is_match: bool,
    pub notes: String,
}

/// Outcome of single-layer detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierDetection {
    /// Top score, present only when it reaches the threshold.
    pub selected: Option<DetectionScore>,
    /// Every parser's score, highest first.
    pub scores: Vec<DetectionScore>,
    pub threshold: u8,
    pub notes: String,
}

/// Refinement of the top coarse candidates.
struct Refinement {
    refined: Vec<RefinedScore>,
    skipped: Vec<String>,
    /// Index into `refined` of the winner.
    best: Option<usize>,
}

/// Builder for [`ParserRegistry`].
#[derive(Default)]
pub struct ParserRegistryBuilder {
    parsers: BTreeMap<String, Arc<dyn SupplierParser>>,
    aliases: HashMap<String, String>,
    config: DetectionConfig,
}

impl ParserRegistryBuilder {
    /// Register a parser under its own key. Its supplier name becomes an alias.
    pub fn register(self, parser: Arc<dyn SupplierParser>) -> Self {
        let key = parser.key().to_string();
        let name = parser.supplier_name().to_string();
        self.register_as(&key, parser).alias(&name, &key)
    }

    /// Register a parser under `key`. A duplicate key replaces the earlier parser.
    pub fn register_as(mut self, key: &str, parser: Arc<dyn SupplierParser>) -> Self {
        let key = normalize_key(key);
        if self.parsers.insert(key.clone(), parser).is_some() {
            debug!("Parser {} re-registered, replacing previous", key);
        }
        self
    }

    /// Map a supplier name, as found in profiles, to a parser key.
    pub fn alias(mut self, supplier_name: &str, key: &str) -> Self {
        self.aliases.insert(normalize_key(supplier_name), normalize_key(key));
        self
    }

    pub fn with_config(mut self, config: DetectionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> ParserRegistry {
        ParserRegistry {
            parsers: self.parsers,
            aliases: self.aliases,
            config: self.config,
        }
    }
}

/// Immutable key to parser mapping plus the detection pipeline.
pub struct ParserRegistry {
    parsers: BTreeMap<String, Arc<dyn SupplierParser>>,
    aliases: HashMap<String, String>,
    config: DetectionConfig,
}

impl ParserRegistry {
    pub fn builder() -> ParserRegistryBuilder {
        ParserRegistryBuilder::default()
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// Registered keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.parsers.keys().map(String::as_str)
    }

    /// Look up a parser by key, case-insensitively.
    pub fn get(&self, key: &str) -> Option<&Arc<dyn SupplierParser>> {
        self.parsers.get(&normalize_key(key))
    }

    /// Resolve a supplier name to a registered parser key.
    ///
    /// Tries the alias table, then the name itself as a key, then the name
    /// with non-alphanumeric runs collapsed to `_`.
    pub fn resolve(&self, supplier_name: &str) -> Option<&str> {
        let normalized = normalize_key(supplier_name);

        let key = self
            .aliases
            .get(&normalized)
            .cloned()
            .unwrap_or_else(|| normalized.clone());
        if let Some((key, _)) = self.parsers.get_key_value(&key) {
            return Some(key.as_str());
        }

        self.parsers
            .get_key_value(&slug(&normalized))
            .map(|(key, _)| key.as_str())
    }

    /// Single-layer detection: score every registered parser.
    ///
    /// A supplier is selected only if the best score reaches `threshold`
    /// (the configured default when `None`).
    pub fn detect_supplier(&self, text: &str, threshold: Option<u8>) -> SupplierDetection {
        let threshold = threshold.unwrap_or(self.config.threshold);

        let mut scores: Vec<DetectionScore> = self
            .parsers
            .iter()
            .map(|(key, parser)| {
                let detection = parser.detect_supplier(text);
                DetectionScore {
                    key: key.clone(),
                    supplier_name: parser.supplier_name().to_string(),
                    confidence: detection.confidence,
                    is_match: detection.is_match,
                    notes: detection.notes,
                }
            })
            .collect();
        scores.sort_by(|a, b| b.confidence.cmp(&a.confidence));

        let selected = scores.first().filter(|s| s.confidence >= threshold).cloned();
        let notes = match (&selected, scores.first()) {
            (Some(s), _) => format!("Detected {} ({}%)", s.supplier_name, s.confidence),
            (None, Some(top)) if top.confidence > 0 => format!(
                "No supplier detected: best was {} at {}%, below threshold {}%",
                top.supplier_name, top.confidence, threshold
            ),
            _ => "No supplier detected".to_string(),
        };

        debug!("{}", notes);

        SupplierDetection {
            selected,
            scores,
            threshold,
            notes,
        }
    }

    /// Re-score the top candidates with their own parsers.
    fn refine(&self, text: &str, candidates: &[Candidate]) -> Refinement {
        let mut refined: Vec<RefinedScore> = Vec::new();
        let mut skipped = Vec::new();
        let mut best: Option<usize> = None;

        for candidate in candidates.iter().take(self.config.refine_top_n) {
            let Some(key) = self.resolve(&candidate.supplier_name) else {
                warn!("No parser registered for candidate {}", candidate.supplier_name);
                skipped.push(candidate.supplier_name.clone());
                continue;
            };
            let Some(parser) = self.parsers.get(key) else {
                continue;
            };

            let detection = parser.detect_supplier(text);
            debug!(
                "Refined {}: coarse {} -> {} ({})",
                candidate.supplier_name, candidate.confidence, detection.confidence, detection.notes
            );

            // Strictly greater keeps the coarse order on ties
            if best.is_none_or(|b| detection.confidence > refined[b].confidence) {
                best = Some(refined.len());
            }

            refined.push(RefinedScore {
                supplier_id: candidate.supplier_id.clone(),
                supplier_name: candidate.supplier_name.clone(),
                parser_key: key.to_string(),
                coarse_confidence: candidate.confidence,
                confidence: detection.confidence,
                is_match: detection.is_match,
                notes: detection.notes,
            });
        }

        Refinement {
            refined,
            skipped,
            best,
        }
    }

    /// Run the two-layer pipeline: coarse scan, refine, select, parse.
    ///
    /// Each failed stage ends the attempt with a typed error; there are no
    /// retries. The only await point is the profile store query.
    pub async fn parse_invoice<S: ProfileStore>(
        &self,
        text: &str,
        matcher: &MainSupplierMatcher<S>,
    ) -> Result<ParseResult, PipelineError> {
        debug!("Stage: {}", PipelineStage::Idle);
        if text.trim().is_empty() {
            return Err(PipelineError::Input);
        }

        info!("Detecting supplier for {} characters of text", text.len());

        debug!("Stage: {}", PipelineStage::CoarseScan);
        let candidates = matcher.find_candidates(text).await.map_err(|e| {
            warn!("Profile store query failed: {}", e);
            PipelineError::Upstream(e)
        })?;

        if candidates.is_empty() {
            info!("Stage: {}", PipelineStage::NoCandidates);
            return Err(PipelineError::NoCandidate);
        }

        debug!("Stage: {} ({} candidates)", PipelineStage::RefineTop, candidates.len());
        let Refinement {
            refined,
            skipped,
            best,
        } = self.refine(text, &candidates);

        let Some(best) = best.map(|i| refined[i].clone()) else {
            warn!("Stage: {}", PipelineStage::NoResolvableParser);
            let attempted = candidates
                .into_iter()
                .take(self.config.refine_top_n)
                .collect();
            return Err(PipelineError::NoParser {
                candidates: attempted,
            });
        };

        debug!("Stage: {}", PipelineStage::SelectBest);
        info!(
            "Selected {} via parser {} ({}%)",
            best.supplier_name, best.parser_key, best.confidence
        );

        let Some(parser) = self.parsers.get(&best.parser_key) else {
            return Err(PipelineError::NoParser { candidates });
        };

        debug!("Stage: {}", PipelineStage::Parse);
        let mut result = parser.parse(text);

        if !result.success {
            warn!("Stage: {} ({})", PipelineStage::ParseFailure, result.notes);
            return Err(PipelineError::ParseFailure {
                parser: best.parser_key,
                notes: result.notes,
                candidates,
            });
        }

        result.supplier = SupplierInfo {
            id: best.supplier_id.clone(),
            name: best.supplier_name.clone(),
            confidence: best.confidence,
        };
        result.detection_trail = Some(DetectionTrail {
            candidates,
            refined,
            skipped,
            selected: best.parser_key,
        });

        debug!("Stage: {}", PipelineStage::Success);
        Ok(result)
    }
}

/// Trim and lower-case a key or supplier name.
fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

/// `matthew clark & co.` -> `matthew_clark_co`
fn slug(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::models::supplier::{Detection, SupplierProfile};
    use crate::parser::{build_result, ResultData};
    use crate::store::InMemoryProfileStore;
    use crate::suppliers::{default_registry, pending};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    /// Parser with a fixed detection score.
    struct Fixed {
        key: &'static str,
        name: &'static str,
        confidence: u8,
        succeed: bool,
    }

    impl SupplierParser for Fixed {
        fn key(&self) -> &str {
            self.key
        }

        fn supplier_name(&self) -> &str {
            self.name
        }

        fn detect_supplier(&self, _text: &str) -> Detection {
            Detection::new(self.confidence >= 50, self.confidence, "fixed")
        }

        fn extract(&self, text: &str) -> crate::parser::Result<ParseResult> {
            if !self.succeed {
                return Err(crate::error::ExtractionError::NoData);
            }
            Ok(build_result(
                true,
                ResultData {
                    supplier_name: Some(self.name.to_string()),
                    confidence: Some(self.confidence),
                    raw_text: Some(text.to_string()),
                    parser_used: Some(self.key.to_string()),
                    ..Default::default()
                },
            ))
        }
    }

    fn fixed(key: &'static str, name: &'static str, confidence: u8) -> Arc<dyn SupplierParser> {
        Arc::new(Fixed {
            key,
            name,
            confidence,
            succeed: true,
        })
    }

    fn matcher(profiles: Vec<SupplierProfile>) -> MainSupplierMatcher<InMemoryProfileStore> {
        MainSupplierMatcher::new(InMemoryProfileStore::new(profiles))
    }

    #[test]
    fn test_keys_are_case_insensitive_and_overwrite() {
        let registry = ParserRegistry::builder()
            .register_as("Alpha", fixed("alpha", "Alpha", 10))
            .register_as(" ALPHA ", fixed("alpha", "Alpha Two", 20))
            .build();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("alpha").unwrap().supplier_name(), "Alpha Two");
        assert!(registry.get("ALPHA").is_some());
    }

    #[test]
    fn test_resolve() {
        let registry = ParserRegistry::builder()
            .register(fixed("matthew_clark", "Matthew Clark", 10))
            .register(fixed("booker", "Booker Wholesale", 10))
            .alias("Booker Limited", "booker")
            .build();

        assert_eq!(registry.resolve("Booker Wholesale"), Some("booker"));
        assert_eq!(registry.resolve("BOOKER LIMITED"), Some("booker"));
        assert_eq!(registry.resolve("booker"), Some("booker"));
        assert_eq!(registry.resolve("Matthew Clark"), Some("matthew_clark"));
        assert_eq!(registry.resolve("Matthew-Clark Ltd"), None);
        assert_eq!(registry.resolve("Brakes"), None);
    }

    #[test]
    fn test_single_layer_detection() {
        let registry = ParserRegistry::builder()
            .register(fixed("low", "Low", 30))
            .register(fixed("high", "High", 70))
            .build();

        let detection = registry.detect_supplier("text", None);
        assert_eq!(detection.threshold, 60);
        assert_eq!(detection.selected.as_ref().unwrap().key, "high");
        assert_eq!(
            detection.scores.iter().map(|s| s.confidence).collect::<Vec<_>>(),
            vec![70, 30]
        );
    }

    #[test]
    fn test_single_layer_never_selects_below_threshold() {
        let registry = ParserRegistry::builder()
            .register(fixed("a", "A", 59))
            .register(fixed("b", "B", 40))
            .build();

        for threshold in [60, 80, 100] {
            let detection = registry.detect_supplier("text", Some(threshold));
            assert!(detection.selected.is_none());
            assert!(detection.notes.contains("below threshold"));
        }

        let detection = registry.detect_supplier("text", Some(59));
        assert_eq!(detection.selected.unwrap().key, "a");
    }

    #[tokio::test]
    async fn test_empty_text_is_input_error() {
        let registry = default_registry();
        let err = registry.parse_invoice("  \n ", &matcher(vec![])).await.unwrap_err();
        assert!(matches!(err, PipelineError::Input));
    }

    #[tokio::test]
    async fn test_empty_catalog_is_no_candidate() {
        let registry = default_registry();
        let err = registry
            .parse_invoice("Booker Wholesale invoice", &matcher(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoCandidate));
    }

    #[tokio::test]
    async fn test_unresolved_top_candidates_is_no_parser() {
        let registry = default_registry();
        let profiles = vec![
            SupplierProfile::new("10", "Unknown One", "invoice"),
            SupplierProfile::new("11", "Unknown Two", "invoice,wholesale"),
            SupplierProfile::new("12", "Unknown Three", "invoice,wholesale,booker"),
            SupplierProfile::new("13", "Booker Wholesale", "booker"),
        ];

        let err = registry
            .parse_invoice("Booker Wholesale invoice", &matcher(profiles))
            .await
            .unwrap_err();

        let candidates = match err {
            PipelineError::NoParser { candidates } => candidates,
            other => panic!("expected NoParser, got {other:?}"),
        };
        let names: Vec<&str> = candidates.iter().map(|c| c.supplier_name.as_str()).collect();
        assert_eq!(names, vec!["Unknown Three", "Unknown Two", "Unknown One"]);
    }

    #[tokio::test]
    async fn test_refinement_picks_highest_refined_score() {
        let registry = ParserRegistry::builder()
            .register(fixed("coarse_winner", "Coarse Winner", 20))
            .register(fixed("refined_winner", "Refined Winner", 90))
            .build();
        let profiles = vec![
            SupplierProfile::new("1", "Coarse Winner", "a,b,c"),
            SupplierProfile::new("2", "Unmapped", "a,b"),
            SupplierProfile::new("3", "Refined Winner", "a"),
        ];

        let result = registry.parse_invoice("a b c", &matcher(profiles)).await.unwrap();

        assert!(result.success);
        assert_eq!(result.parser_used, "refined_winner");
        assert_eq!(result.supplier.id, "3");
        assert_eq!(result.supplier.name, "Refined Winner");
        assert_eq!(result.supplier.confidence, 90);

        let trail = result.detection_trail.unwrap();
        assert_eq!(trail.selected, "refined_winner");
        assert_eq!(trail.candidates.len(), 3);
        assert_eq!(trail.skipped, vec!["Unmapped"]);
        assert_eq!(
            trail.refined.iter().map(|r| (r.parser_key.as_str(), r.coarse_confidence, r.confidence)).collect::<Vec<_>>(),
            vec![("coarse_winner", 75, 20), ("refined_winner", 25, 90)]
        );
    }

    #[tokio::test]
    async fn test_only_top_three_are_refined() {
        let registry = ParserRegistry::builder()
            .register(fixed("fourth", "Fourth", 100))
            .build();
        let profiles = vec![
            SupplierProfile::new("1", "First", "a,b,c,d"),
            SupplierProfile::new("2", "Second", "a,b,c"),
            SupplierProfile::new("3", "Third", "a,b"),
            SupplierProfile::new("4", "Fourth", "a"),
        ];

        let err = registry
            .parse_invoice("a b c d", &matcher(profiles))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoParser { ref candidates } if candidates.len() == 3));
    }

    #[tokio::test]
    async fn test_ties_keep_coarse_order() {
        let registry = ParserRegistry::builder()
            .register(fixed("first", "First", 60))
            .register(fixed("second", "Second", 60))
            .build();
        let profiles = vec![
            SupplierProfile::new("2", "Second", "a"),
            SupplierProfile::new("1", "First", "a"),
        ];

        let result = registry.parse_invoice("a", &matcher(profiles)).await.unwrap();
        assert_eq!(result.parser_used, "second");
    }

    #[tokio::test]
    async fn test_parser_failure_is_reported() {
        let registry = ParserRegistry::builder()
            .register(Arc::new(Fixed {
                key: "broken",
                name: "Broken",
                confidence: 80,
                succeed: false,
            }))
            .build();
        let profiles = vec![SupplierProfile::new("1", "Broken", "broken")];

        let err = registry
            .parse_invoice("broken invoice", &matcher(profiles))
            .await
            .unwrap_err();
        let (parser, notes, candidates) = match err {
            PipelineError::ParseFailure {
                parser,
                notes,
                candidates,
            } => (parser, notes, candidates),
            other => panic!("expected ParseFailure, got {other:?}"),
        };
        assert_eq!(parser, "broken");
        assert_eq!(notes, "no invoice data found");
        assert_eq!(candidates.len(), 1);
    }

    struct DownStore;

    #[async_trait]
    impl ProfileStore for DownStore {
        async fn active_profiles(&self) -> Result<Vec<SupplierProfile>, StoreError> {
            Err(StoreError::Unavailable("timeout".to_string()))
        }
    }

    #[tokio::test]
    async fn test_upstream_error_is_not_masked() {
        let registry = default_registry();
        let err = registry
            .parse_invoice("Booker Wholesale", &MainSupplierMatcher::new(DownStore))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Upstream(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_pending_parser_wins_like_any_other() {
        let registry = ParserRegistry::builder()
            .register(Arc::new(pending::booker()))
            .build();
        let profiles = vec![SupplierProfile::new(
            "42",
            "Booker Wholesale",
            "booker,booker wholesale,booker limited",
        )];

        let result = registry
            .parse_invoice("Booker Wholesale invoice", &matcher(profiles))
            .await
            .unwrap();

        assert!(result.success);
        assert!(result.parsed_items.is_empty());
        assert_eq!(result.supplier.id, "42");
        assert_eq!(result.supplier.confidence, 70);
        assert_eq!(result.detection_trail.unwrap().candidates[0].confidence, 50);
    }

    #[test]
    fn test_registry_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ParserRegistry>();
    }
}
