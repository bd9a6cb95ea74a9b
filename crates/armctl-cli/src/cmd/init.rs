use crate::output::print_json;
use anyhow::Context;
use armctl_core::config::ArmConfig;
use armctl_core::instruction::sample_instructions;
use armctl_core::io::write_if_missing;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config_path = ArmConfig::path(root);
    let config = ArmConfig::default();
    let yaml = config.to_yaml().context("failed to encode default config")?;
    let wrote_config = write_if_missing(&config_path, yaml.as_bytes())
        .with_context(|| format!("failed to write {}", config_path.display()))?;

    let instructions_path = config.instructions_path(root);
    let sample = sample_instructions()
        .to_json()
        .context("failed to encode sample instructions")?;
    let wrote_instructions = write_if_missing(&instructions_path, sample.as_bytes())
        .with_context(|| format!("failed to write {}", instructions_path.display()))?;

    if json {
        print_json(&serde_json::json!({
            "root": root.display().to_string(),
            "config_written": wrote_config,
            "instructions_written": wrote_instructions,
        }))?;
        return Ok(());
    }

    for (path, written) in [
        (&config_path, wrote_config),
        (&instructions_path, wrote_instructions),
    ] {
        let verb = if written { "created" } else { "kept existing" };
        println!("{verb}: {}", path.display());
    }
    println!("Next: armctl plan");
    Ok(())
}
