use crate::output::{degrees, print_json};
use anyhow::Context;
use armctl_core::joint::JointId;
use std::path::Path;

pub fn run(
    root: &Path,
    joint: JointId,
    angle: f64,
    inverse: bool,
    json: bool,
) -> anyhow::Result<()> {
    let config = super::load_config(root)?;
    let calibration = config
        .calibration_model()
        .context("failed to build calibration model")?;

    let (actual, input) = if inverse {
        (calibration.to_external(joint, angle)?, angle)
    } else {
        (angle, calibration.to_native(joint, angle)?)
    };

    if json {
        print_json(&serde_json::json!({
            "joint": joint,
            "actual": actual,
            "input": input,
        }))?;
    } else {
        println!(
            "{joint} ({}): actual {} = input {}",
            joint.role(),
            degrees(actual),
            degrees(input)
        );
    }
    Ok(())
}
