use crate::output::{degrees, print_json, print_table};
use anyhow::Context;
use armctl_core::instruction::InstructionSource;
use armctl_core::joint::JointId;
use armctl_core::sequencer::plan;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct PlanRow<'a> {
    instruction: &'a str,
    seconds: f64,
    joint: JointId,
    actual: f64,
    input: f64,
    in_range: bool,
}

pub fn run(root: &Path, file: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(root)?;
    super::ensure_valid(&config)?;
    let calibration = config
        .calibration_model()
        .context("failed to build calibration model")?;
    let source = super::instruction_source(root, &config, file);
    let instructions = source
        .load()
        .with_context(|| format!("failed to load {}", source.describe()))?;
    let steps = plan(&calibration, &instructions)?;

    let joints = &config.joints;
    let rows: Vec<PlanRow> = steps
        .iter()
        .flat_map(|step| {
            step.targets.iter().map(move |(joint, target)| PlanRow {
                instruction: &step.name,
                seconds: step.seconds,
                joint: *joint,
                actual: target.actual,
                input: target.native,
                in_range: joints
                    .get(joint)
                    .is_some_and(|c| c.range.contains(target.native)),
            })
        })
        .collect();

    if json {
        print_json(&rows)?;
        return Ok(());
    }

    if steps.is_empty() {
        println!("No instructions in {}.", source.describe());
        return Ok(());
    }

    let table = rows
        .iter()
        .map(|r| {
            vec![
                r.instruction.to_string(),
                degrees(r.seconds),
                r.joint.to_string(),
                degrees(r.actual),
                degrees(r.input),
                if r.in_range { String::new() } else { "OUT OF RANGE".to_string() },
            ]
        })
        .collect();
    print_table(&["INSTRUCTION", "SECONDS", "JOINT", "ACTUAL", "INPUT", ""], table);

    let blocked = rows.iter().filter(|r| !r.in_range).count();
    if blocked > 0 {
        println!(
            "\n{blocked} target(s) fall outside the servo range; `armctl run` will stop there."
        );
    }
    Ok(())
}
