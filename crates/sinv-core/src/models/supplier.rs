//! Supplier profiles, coarse candidates and parser detections.

use serde::{Deserialize, Serialize};

/// A supplier's keyword profile as held by the external profile store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierProfile {
    /// Store identifier.
    pub id: String,

    /// Display name, also used to resolve the parser key.
    pub name: String,

    /// Comma or pipe delimited keyword list.
    #[serde(default)]
    pub keywords: String,

    /// Inactive profiles are not returned by stores.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl SupplierProfile {
    pub fn new(id: impl Into<String>, name: impl Into<String>, keywords: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            keywords: keywords.into(),
            active: true,
        }
    }

    /// Split the keyword field on `,` or `|`, trimmed, lower-cased, empties dropped.
    pub fn keyword_list(&self) -> Vec<String> {
        self.keywords
            .split([',', '|'])
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect()
    }
}

/// A supplier provisionally matched against a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub supplier_id: String,
    pub supplier_name: String,
    /// Every keyword of the profile.
    pub keywords: Vec<String>,
    /// Keywords found in the document.
    pub matched_keywords: Vec<String>,
    pub match_count: usize,
    /// Coarse confidence, 0 - 100.
    pub confidence: u8,
}

/// Output of a parser's keyword classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub is_match: bool,
    /// 0 - 100.
    pub confidence: u8,
    pub notes: String,
}

impl Detection {
    pub fn new(is_match: bool, confidence: u8, notes: impl Into<String>) -> Self {
        Self {
            is_match,
            confidence: confidence.min(100),
            notes: notes.into(),
        }
    }

    /// A detection with no keyword hits.
    pub fn no_match() -> Self {
        Self::new(false, 0, "no supplier keywords found")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_list_splits_on_comma_and_pipe() {
        let profile = SupplierProfile::new("1", "Booker", " Booker, booker wholesale|| BOOKER LIMITED ,");
        assert_eq!(
            profile.keyword_list(),
            vec!["booker", "booker wholesale", "booker limited"]
        );
    }

    #[test]
    fn test_profile_defaults_to_active() {
        let profile: SupplierProfile =
            serde_json::from_str(r#"{"id":"7","name":"Brakes"}"#).unwrap();
        assert!(profile.active);
        assert!(profile.keyword_list().is_empty());
    }

    #[test]
    fn test_detection_confidence_is_capped() {
        assert_eq!(Detection::new(true, 140, "").confidence, 100);
    }
}
