pub mod calibration;
pub mod config;
pub mod convert;
pub mod init;
pub mod plan;
pub mod run;

use anyhow::Context;
use armctl_core::config::{ArmConfig, WarnLevel};
use armctl_core::instruction::JsonFileSource;
use std::path::{Path, PathBuf};

pub(crate) fn load_config(root: &Path) -> anyhow::Result<ArmConfig> {
    ArmConfig::load(root)
        .with_context(|| format!("failed to load {}", ArmConfig::path(root).display()))
}

/// Refuses to move anything while the configuration has errors.
pub(crate) fn ensure_valid(config: &ArmConfig) -> anyhow::Result<()> {
    let errors: Vec<String> = config
        .validate()
        .into_iter()
        .filter(|w| w.level == WarnLevel::Error)
        .map(|w| w.message)
        .collect();
    if !errors.is_empty() {
        anyhow::bail!("invalid configuration: {}", errors.join("; "));
    }
    Ok(())
}

pub(crate) fn instruction_source(
    root: &Path,
    config: &ArmConfig,
    file: Option<PathBuf>,
) -> JsonFileSource {
    JsonFileSource::new(file.unwrap_or_else(|| config.instructions_path(root)))
}
