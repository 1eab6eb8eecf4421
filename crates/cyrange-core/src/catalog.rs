//! Training catalog: training types, scenarios and their levels.
//!
//! Each level points at two descriptor files in the local database: the
//! learning content published to the content collaborator and the range
//! template sent to the range collaborator.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Catalog error.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed training catalog: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// A training type offered to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingType {
    pub name: String,
    pub category: String,
}

/// One difficulty level of a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub name: String,
    /// Learning content descriptor file.
    #[serde(default)]
    pub content: Option<String>,
    /// Range template file.
    #[serde(default, alias = "specification")]
    pub range: Option<String>,
    /// Follow-up scenario driven by the range collaborator.
    #[serde(default)]
    pub progression: Option<String>,
}

/// A training scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub levels: Vec<Level>,
}

/// Public view of a scenario: names only, no database file names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub name: String,
    pub levels: Vec<LevelSummary>,
}

/// Public view of a level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub name: String,
}

/// Training catalog for one language.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingCatalog {
    #[serde(default)]
    pub types: Vec<TrainingType>,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

impl TrainingCatalog {
    /// Parse a catalog document.
    ///
    /// # Errors
    /// Returns error if the YAML is malformed.
    pub fn from_yaml(text: &str) -> Result<Self, CatalogError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load a catalog from disk.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::from_yaml(&text)
    }

    /// Find a level. The last matching entry wins when names repeat.
    #[must_use]
    pub fn level(&self, scenario: &str, level: &str) -> Option<&Level> {
        self.scenarios
            .iter()
            .filter(|s| s.name == scenario)
            .flat_map(|s| s.levels.iter())
            .filter(|l| l.name == level)
            .last()
    }

    /// Content descriptor file for a scenario level.
    #[must_use]
    pub fn content_file(&self, scenario: &str, level: &str) -> Option<&str> {
        self.level(scenario, level)?.content.as_deref()
    }

    /// Range template file for a scenario level.
    #[must_use]
    pub fn range_file(&self, scenario: &str, level: &str) -> Option<&str> {
        self.level(scenario, level)?.range.as_deref()
    }

    /// Progression scenario for a scenario level, if any.
    #[must_use]
    pub fn progression_scenario(&self, scenario: &str, level: &str) -> Option<&str> {
        self.level(scenario, level)?.progression.as_deref()
    }

    /// Scenario and level names as shown to users.
    #[must_use]
    pub fn scenario_summaries(&self) -> Vec<ScenarioSummary> {
        self.scenarios
            .iter()
            .map(|s| ScenarioSummary {
                name: s.name.clone(),
                levels: s
                    .levels
                    .iter()
                    .map(|l| LevelSummary {
                        name: l.name.clone(),
                    })
                    .collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r"
types:
  - name: Scenario-Based Training
    category: Attack
scenarios:
  - name: Incident Response
    levels:
      - name: Level 1 (Easy)
        content: IR-level1-content.yml
        range: IR-level1-range.yml
      - name: Level 2 (Medium)
        content: IR-level2-content.yml
        specification: IR-level2-range.yml
        progression: ir-escalation
  - name: Forensics
    levels:
      - name: Level 1 (Easy)
        range: FR-level1-range.yml
";

    #[test]
    fn test_lookup() {
        let catalog = TrainingCatalog::from_yaml(CATALOG).unwrap();
        assert_eq!(
            catalog.content_file("Incident Response", "Level 1 (Easy)"),
            Some("IR-level1-content.yml")
        );
        assert_eq!(
            catalog.range_file("Incident Response", "Level 2 (Medium)"),
            Some("IR-level2-range.yml")
        );
        assert_eq!(
            catalog.progression_scenario("Incident Response", "Level 2 (Medium)"),
            Some("ir-escalation")
        );
        assert_eq!(catalog.content_file("Forensics", "Level 1 (Easy)"), None);
        assert_eq!(catalog.range_file("Forensics", "Level 1 (Easy)"), Some("FR-level1-range.yml"));
        assert_eq!(catalog.range_file("Unknown", "Level 1 (Easy)"), None);
        assert_eq!(catalog.range_file("Forensics", "Level 9"), None);
    }

    #[test]
    fn test_summaries_hide_file_names() {
        let catalog = TrainingCatalog::from_yaml(CATALOG).unwrap();
        let summary = serde_json::to_string(&catalog.scenario_summaries()).unwrap();
        assert!(summary.contains("Incident Response"));
        assert!(summary.contains("Level 2 (Medium)"));
        assert!(!summary.contains(".yml"));
        assert_eq!(catalog.types[0].category, "Attack");
    }
}
