use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ambiguity::AmbiguityConfig;
use crate::categorize::CategoryRules;
use crate::extract::BankSignature;

/// Everything the extraction pipeline can be tuned with. Loaded once and passed
/// down by reference; nothing reads configuration from globals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    pub(crate) extract: ExtractSection,
    pub(crate) ambiguity: AmbiguityConfig,
    pub(crate) categories: CategoryRules,
    pub(crate) batch: BatchSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ExtractSection {
    /// Read `58193` as `581.93` when a statement drops the decimal point.
    pub(crate) decimal_insertion: bool,
    /// Keep the source line on every transaction for audit.
    pub(crate) keep_raw_line: bool,
    /// Bank detection phrases, tried in order. Empty uses the built-in list.
    pub(crate) signatures: Vec<BankSignature>,
}

impl Default for ExtractSection {
    fn default() -> Self {
        Self {
            decimal_insertion: true,
            keep_raw_line: true,
            signatures: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct BatchSection {
    pub(crate) workers: usize,
}

impl Default for BatchSection {
    fn default() -> Self {
        Self { workers: 4 }
    }
}

pub(crate) fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "cardledger", "cardledger")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))
}

pub(crate) fn config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

pub(crate) fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        log::debug!("no config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

pub(crate) fn save_config(cfg: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::categorize::Categorizer;
    use crate::extract::Bank;
    use crate::models::Category;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(cfg.extract.decimal_insertion);
        assert_eq!(cfg.batch.workers, 4);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.extract.decimal_insertion = false;
        cfg.batch.workers = 2;
        save_config(&cfg, &path).unwrap();
        assert_eq!(load_config(&path).unwrap(), cfg);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[extract]\ndecimal_insertion = false\n").unwrap();
        let cfg = load_config(&path).unwrap();
        assert!(!cfg.extract.decimal_insertion);
        assert!(cfg.extract.keep_raw_line);
        assert_eq!(cfg.ambiguity, AmbiguityConfig::default());
        assert_eq!(Categorizer::new(&cfg.categories).categorize("swiggy order"), Category::Food);
    }

    #[test]
    fn test_custom_category_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[[categories.rules]]\ncategory = \"Health\"\nkeywords = [\"gym\"]\n",
        )
        .unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.categories.rules.len(), 1);
        let categorizer = Categorizer::new(&cfg.categories);
        assert_eq!(categorizer.categorize("CULT GYM"), Category::Health);
        assert_eq!(categorizer.categorize("SWIGGY"), Category::Other);
    }

    #[test]
    fn test_bank_signatures_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[[extract.signatures]]\nbank = \"kotak\"\nphrases = [\"811 Card\"]\n",
        )
        .unwrap();
        let cfg = load_config(&path).unwrap();
        assert!(cfg.extract.decimal_insertion);
        assert_eq!(cfg.extract.signatures.len(), 1);
        assert_eq!(cfg.extract.signatures[0].bank, Bank::Kotak);
        assert_eq!(cfg.extract.signatures[0].phrases, vec!["811 Card".to_string()]);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[extract\n").unwrap();
        assert!(load_config(&path).is_err());
    }
}
