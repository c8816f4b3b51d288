use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::Deserialize;

use crate::reconcile::{FragmentationThresholds, ReconcileOptions, DEFAULT_MAX_UNWRAP_PASSES};

pub const CONFIG_FILENAME: &str = "markup-reconciler.toml";
pub const CONFIG_ENV: &str = "MARKUP_RECONCILER_CONFIG";
pub const CONFIG_VERSION: u32 = 1;

const DEFAULT_CONFIG_TOML: &str = include_str!("../config/markup-reconciler.toml");

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub reconcile: ReconcileSection,
    #[serde(default)]
    pub site: SiteSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct ReconcileSection {
    #[serde(default)]
    pub min_element_ratio: Option<f64>,
    #[serde(default)]
    pub min_critical_ratio: Option<f64>,
    #[serde(default)]
    pub max_unwrap_passes: Option<usize>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct SiteSection {
    #[serde(default)]
    pub default_language: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct LoggingSection {
    #[serde(default)]
    pub level: Option<String>,
}

impl AppConfig {
    pub fn reconcile_options(&self) -> ReconcileOptions {
        let defaults = FragmentationThresholds::default();
        ReconcileOptions {
            thresholds: FragmentationThresholds {
                min_element_ratio: self
                    .reconcile
                    .min_element_ratio
                    .unwrap_or(defaults.min_element_ratio),
                min_critical_ratio: self
                    .reconcile
                    .min_critical_ratio
                    .unwrap_or(defaults.min_critical_ratio),
            },
            max_unwrap_passes: self
                .reconcile
                .max_unwrap_passes
                .unwrap_or(DEFAULT_MAX_UNWRAP_PASSES),
        }
    }

    pub fn default_language(&self) -> &str {
        self.site
            .default_language
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("en")
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .level
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("info")
    }

    fn validate(&self) -> anyhow::Result<()> {
        if let Some(v) = self.version {
            if v != CONFIG_VERSION {
                return Err(anyhow!(
                    "unsupported config version {v} (expected {CONFIG_VERSION})"
                ));
            }
        }
        for (name, value) in [
            ("min_element_ratio", self.reconcile.min_element_ratio),
            ("min_critical_ratio", self.reconcile.min_critical_ratio),
        ] {
            if let Some(r) = value {
                if !(r > 0.0 && r <= 1.0) {
                    return Err(anyhow!("reconcile.{name} must be in (0, 1], got {r}"));
                }
            }
        }
        if self.reconcile.max_unwrap_passes == Some(0) {
            return Err(anyhow!("reconcile.max_unwrap_passes must be at least 1"));
        }
        Ok(())
    }
}

pub fn find_file_upwards(start_dir: &Path, filename: &str, max_levels: usize) -> Option<PathBuf> {
    let mut dir = start_dir;
    for _ in 0..=max_levels {
        let candidate = dir.join(filename);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
    None
}

/// Searches from the current directory, then `workdir`, then the executable's directory.
pub fn find_default_config(workdir: &Path) -> Option<PathBuf> {
    if let Ok(cwd) = std::env::current_dir() {
        if let Some(p) = find_file_upwards(&cwd, CONFIG_FILENAME, 8) {
            return Some(p);
        }
    }
    if let Some(p) = find_file_upwards(workdir, CONFIG_FILENAME, 8) {
        return Some(p);
    }
    let exe = std::env::current_exe().ok()?;
    find_file_upwards(exe.parent()?, CONFIG_FILENAME, 10)
}

pub fn parse_config(text: &str) -> anyhow::Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(text).context("parse config toml")?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    parse_config(&text).with_context(|| format!("load config: {}", path.display()))
}

/// Explicit path, then `$MARKUP_RECONCILER_CONFIG`, then the upward search. No file
/// found means built-in defaults. Returns the config and the file it came from.
pub fn resolve_config(
    explicit: Option<&Path>,
    workdir: &Path,
) -> anyhow::Result<(AppConfig, Option<PathBuf>)> {
    if let Some(p) = explicit {
        return Ok((load_config(p)?, Some(p.to_path_buf())));
    }
    let found = std::env::var(CONFIG_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| find_default_config(workdir));
    match found {
        Some(p) if p.exists() => Ok((load_config(&p)?, Some(p))),
        _ => Ok((AppConfig::default(), None)),
    }
}

pub fn init_default_config(dir: &Path, force: bool) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create config dir: {}", dir.display()))?;
    let cfg_path = dir.join(CONFIG_FILENAME);
    if cfg_path.exists() && !force {
        return Ok(cfg_path);
    }
    std::fs::write(&cfg_path, DEFAULT_CONFIG_TOML)
        .with_context(|| format!("write config: {}", cfg_path.display()))?;
    Ok(cfg_path)
}

#[cfg(test)]
mod tests {
    use super::{find_file_upwards, init_default_config, load_config, parse_config, AppConfig};
    use crate::reconcile::ReconcileOptions;

    #[test]
    fn bundled_default_matches_built_in_defaults() {
        let cfg = parse_config(super::DEFAULT_CONFIG_TOML).expect("parse bundled config");
        assert_eq!(cfg.reconcile_options(), ReconcileOptions::default());
        assert_eq!(cfg.default_language(), "en");
        assert_eq!(cfg.log_level(), "info");
        assert!(cfg.site.languages.is_empty());

        let empty = AppConfig::default();
        assert_eq!(empty.reconcile_options(), ReconcileOptions::default());
    }

    #[test]
    fn reads_overrides() {
        let cfg = parse_config(
            r#"
version = 1
[reconcile]
min_element_ratio = 0.3
max_unwrap_passes = 8
[site]
default_language = "de"
languages = ["de", "fr"]
[logging]
level = "debug"
"#,
        )
        .expect("parse config");
        let opts = cfg.reconcile_options();
        assert_eq!(opts.thresholds.min_element_ratio, 0.3);
        assert_eq!(opts.thresholds.min_critical_ratio, 0.6);
        assert_eq!(opts.max_unwrap_passes, 8);
        assert_eq!(cfg.default_language(), "de");
        assert_eq!(cfg.site.languages, vec!["de", "fr"]);
        assert_eq!(cfg.log_level(), "debug");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse_config("version = 2").is_err());
        assert!(parse_config("[reconcile]\nmin_critical_ratio = 0.0").is_err());
        assert!(parse_config("[reconcile]\nmin_element_ratio = 1.5").is_err());
        assert!(parse_config("[reconcile]\nmax_unwrap_passes = 0").is_err());
        assert!(parse_config("[reconcile]\nmin_element_ratio = \"high\"").is_err());
    }

    #[test]
    fn init_writes_once_and_is_found_upwards() {
        let dir = std::env::temp_dir().join(format!("markup-reconciler-cfg-{}", std::process::id()));
        let nested = dir.join("a").join("b");
        std::fs::create_dir_all(&nested).expect("create nested dir");

        let path = init_default_config(&dir, false).expect("init config");
        std::fs::write(&path, "version = 1\n[site]\ndefault_language = \"fr\"\n").expect("edit");
        init_default_config(&dir, false).expect("init again");
        assert_eq!(load_config(&path).expect("load").default_language(), "fr");
        init_default_config(&dir, true).expect("force init");
        assert_eq!(load_config(&path).expect("load").default_language(), "en");

        assert_eq!(find_file_upwards(&nested, super::CONFIG_FILENAME, 2), Some(path.clone()));
        assert_eq!(find_file_upwards(&nested, super::CONFIG_FILENAME, 1), None);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
