//! Subcommands and the loading helpers they share.

pub mod batch;
pub mod candidates;
pub mod config;
pub mod detect;
pub mod parse;

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use sinv_core::models::config::SinvConfig;
use sinv_core::suppliers::default_registry_builder;
use sinv_core::{JsonProfileStore, MainSupplierMatcher, ParserRegistry};

/// Load the config file given with `--config`, or the defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<SinvConfig> {
    match config_path {
        Some(path) => SinvConfig::from_file(Path::new(path))
            .with_context(|| format!("Failed to load config from {}", path)),
        None => Ok(SinvConfig::default()),
    }
}

/// Read invoice text extracted from a PDF.
pub fn read_text(path: &Path) -> anyhow::Result<String> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Build the profile matcher from `--profiles` or `profiles.path`.
pub fn profile_matcher(
    profiles: Option<&PathBuf>,
    config: &SinvConfig,
) -> anyhow::Result<MainSupplierMatcher<JsonProfileStore>> {
    let path = profiles.or(config.profiles.path.as_ref()).ok_or_else(|| {
        anyhow::anyhow!("No supplier profiles configured. Pass --profiles or set profiles.path.")
    })?;

    debug!("Using supplier profiles from {}", path.display());

    Ok(MainSupplierMatcher::new(JsonProfileStore::new(path)).with_config(config.matcher.clone()))
}

/// Registry of the built-in parsers with the configured detection settings.
pub fn registry(config: &SinvConfig) -> ParserRegistry {
    default_registry_builder()
        .with_config(config.detection.clone())
        .build()
}
