// 🏷️ Keyword Rules - Rules as Data
// Description rewrites and category assignment, first match wins

use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};

/// Keyword tables baked into the binary at build time
const BUILTIN_KEYWORDS: &str = include_str!("../assets/keywords.json");

// ============================================================================
// RULE DEFINITION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    /// Substring to look for (case-sensitive)
    pub keyword: String,

    /// Replacement description or category label
    pub value: String,
}

impl KeywordRule {
    pub fn new(keyword: &str, value: &str) -> Self {
        KeywordRule {
            keyword: keyword.to_string(),
            value: value.to_string(),
        }
    }

    /// Check if the keyword occurs anywhere in the given text
    pub fn matches(&self, text: &str) -> bool {
        text.contains(&self.keyword)
    }
}

// ============================================================================
// KEYWORD MAP
// ============================================================================

/// KeywordMap - the static configuration handed to the normalizer
///
/// Both tables are ordered: the first rule whose keyword matches wins.
/// There is no priority field and no longest-match resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordMap {
    #[serde(default)]
    pub descriptions: Vec<KeywordRule>,

    #[serde(default)]
    pub categories: Vec<KeywordRule>,

    #[serde(default)]
    pub allowed_categories: Vec<String>,
}

impl KeywordMap {
    /// Tables shipped with the tool
    pub fn builtin() -> Result<Self> {
        KeywordMap::from_json(BUILTIN_KEYWORDS).context("Failed to parse built-in keyword tables")
    }

    /// Build a map from its JSON form
    pub fn from_json(json: &str) -> Result<Self> {
        let map: KeywordMap = serde_json::from_str(json).context("Failed to parse keyword JSON")?;
        Ok(map)
    }

    pub fn is_allowed(&self, category: &str) -> bool {
        self.allowed_categories.iter().any(|c| c == category)
    }

    /// Replacement description for the first matching keyword
    pub fn description_for(&self, text: &str) -> Option<&str> {
        self.descriptions
            .iter()
            .find(|rule| rule.matches(text))
            .map(|rule| rule.value.as_str())
    }

    /// Category for the first matching keyword whose label is allowed.
    ///
    /// A match that maps outside the allow-list does not stop the scan.
    pub fn category_for(&self, text: &str) -> Option<&str> {
        self.categories
            .iter()
            .filter(|rule| rule.matches(text))
            .map(|rule| rule.value.as_str())
            .find(|category| self.is_allowed(category))
    }

    /// Get number of rules loaded
    pub fn rule_count(&self) -> usize {
        self.descriptions.len() + self.categories.len()
    }
}

// ============================================================================
// TESTS
// ============================================================================
