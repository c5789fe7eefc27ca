use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use splitter_planner::Budget;
use splitter_syntax::Language;
use std::path::Path;

/// Settings for a splitting run, optionally read from a TOML file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SplitterConfig {
    /// Maximum lines per output file
    pub budget: usize,

    /// Descend into subdirectories of directory inputs
    pub recursive: bool,

    /// File extensions collected from directory inputs, without the dot
    pub extensions: Vec<String>,

    /// Glob patterns excluded from directory inputs
    pub exclude: Vec<String>,

    /// Files processed concurrently
    pub jobs: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            budget: Budget::DEFAULT_LINES,
            recursive: false,
            extensions: Language::CSharp
                .extensions()
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            exclude: Vec::new(),
            jobs: default_jobs(),
        }
    }
}

fn default_jobs() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

impl SplitterConfig {
    /// Load from a TOML file; missing keys take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.budget == 0 {
            bail!("budget must be a positive number of lines");
        }
        if self.jobs == 0 {
            bail!("jobs must be at least 1");
        }
        if self.extensions.iter().all(|ext| ext.trim().is_empty()) {
            bail!("at least one file extension is required");
        }
        Ok(())
    }

    pub fn budget(&self) -> Result<Budget> {
        Budget::new(self.budget).context("Invalid budget")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = SplitterConfig::from_toml("budget = 800\nexclude = [\"**/Generated/**\"]\n")
            .unwrap();
        assert_eq!(config.budget, 800);
        assert_eq!(config.exclude, vec!["**/Generated/**"]);
        assert_eq!(config.extensions, vec!["cs"]);
        assert!(!config.recursive);
        assert!(config.jobs >= 1);
    }

    #[test]
    fn test_zero_budget_is_rejected() {
        let err = SplitterConfig::from_toml("budget = 0").unwrap_err();
        assert!(err.to_string().contains("budget"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(SplitterConfig::from_toml("budgte = 10").is_err());
    }

    #[test]
    fn test_empty_extensions_are_rejected() {
        assert!(SplitterConfig::from_toml("extensions = []").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("splitter.toml");
        std::fs::write(&path, "budget = 120\nrecursive = true\njobs = 2\n").unwrap();

        let config = SplitterConfig::load(&path).unwrap();
        assert_eq!(config.budget().unwrap().lines(), 120);
        assert!(config.recursive);
        assert_eq!(config.jobs, 2);
    }
}
