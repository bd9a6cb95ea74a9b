use crate::output::{degrees, print_json, print_table};
use anyhow::Context;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct CalibrationRow {
    joint: String,
    role: &'static str,
    channel: u8,
    anchors: [armctl_core::calibration::AnchorPair; 2],
    slope: f64,
    intercept: f64,
}

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(root)?;
    let calibration = config
        .calibration_model()
        .context("failed to build calibration model")?;

    let rows: Vec<CalibrationRow> = calibration
        .iter()
        .map(|(joint, entry)| CalibrationRow {
            joint: joint.to_string(),
            role: joint.role(),
            channel: config.joints.get(&joint).map_or(0, |c| c.channel),
            anchors: entry.anchors(),
            slope: entry.slope(),
            intercept: entry.intercept(),
        })
        .collect();

    if json {
        print_json(&rows)?;
        return Ok(());
    }

    if rows.is_empty() {
        println!("No joints configured.");
        return Ok(());
    }

    let anchor = |a: &armctl_core::calibration::AnchorPair| {
        format!("{} -> {}", degrees(a.actual), degrees(a.input))
    };
    let table = rows
        .iter()
        .map(|r| {
            vec![
                r.joint.clone(),
                r.role.to_string(),
                r.channel.to_string(),
                anchor(&r.anchors[0]),
                anchor(&r.anchors[1]),
                format!("{:.4}", r.slope),
                degrees(r.intercept),
            ]
        })
        .collect();
    print_table(
        &["JOINT", "ROLE", "CHANNEL", "ANCHOR LO", "ANCHOR HI", "SLOPE", "INTERCEPT"],
        table,
    );
    Ok(())
}
