//! Pose instructions and where they come from.
//!
//! On disk an instruction list is a JSON document:
//!
//! ```json
//! { "instructions": [
//!     { "name": "wave", "configuration": { "S3": 0 }, "seconds": 1 }
//! ] }
//! ```

use crate::error::LoadError;
use crate::joint::JointId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File name looked up in the project root when no path is given.
pub const DEFAULT_INSTRUCTIONS_FILE: &str = "armInstructions.json";

/// Longest transition an instruction may ask for, in seconds.
pub const MAX_INSTRUCTION_SECONDS: f64 = 3600.0;

// ---------------------------------------------------------------------------
// Instruction
// ---------------------------------------------------------------------------

/// A named target pose. Joints missing from `configuration` keep their angle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub name: String,
    /// Target actual angle per joint, in degrees.
    pub configuration: BTreeMap<JointId, f64>,
    /// Nominal transition time.
    pub seconds: f64,
}

impl Instruction {
    pub fn new(name: impl Into<String>, seconds: f64) -> Self {
        Self {
            name: name.into(),
            configuration: BTreeMap::new(),
            seconds,
        }
    }

    pub fn with_target(mut self, joint: JointId, actual: f64) -> Self {
        self.configuration.insert(joint, actual);
        self
    }

    pub fn joints(&self) -> impl Iterator<Item = JointId> + '_ {
        self.configuration.keys().copied()
    }

    fn check(&self) -> Result<(), LoadError> {
        let invalid = |reason: String| LoadError::Invalid {
            instruction: self.name.clone(),
            reason,
        };
        if !(0.0..=MAX_INSTRUCTION_SECONDS).contains(&self.seconds) {
            return Err(invalid(format!(
                "seconds must be between 0 and {MAX_INSTRUCTION_SECONDS}, got {}",
                self.seconds
            )));
        }
        for (joint, angle) in &self.configuration {
            if !angle.is_finite() {
                return Err(invalid(format!("target for {joint} is not a finite number")));
            }
        }
        Ok(())
    }
}

/// Top-level shape of an instruction file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstructionList {
    pub instructions: Vec<Instruction>,
}

impl InstructionList {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// Parses and checks a JSON document. `origin` names the data in errors.
    pub fn from_json(data: &str, origin: &str) -> Result<Self, LoadError> {
        let list: InstructionList =
            serde_json::from_str(data).map_err(|source| LoadError::Parse {
                origin: origin.to_string(),
                source,
            })?;
        list.check()?;
        Ok(list)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn check(&self) -> Result<(), LoadError> {
        self.instructions.iter().try_for_each(Instruction::check)
    }
}

// ---------------------------------------------------------------------------
// InstructionSource
// ---------------------------------------------------------------------------

/// Supplies the ordered instruction list for one run.
pub trait InstructionSource {
    fn load(&self) -> Result<Vec<Instruction>, LoadError>;

    /// Human-readable origin, for logs.
    fn describe(&self) -> String;
}

impl InstructionSource for InstructionList {
    fn load(&self) -> Result<Vec<Instruction>, LoadError> {
        self.check()?;
        Ok(self.instructions.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory instructions", self.instructions.len())
    }
}

/// Reads instructions from a JSON file each time `load` is called.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl InstructionSource for JsonFileSource {
    fn load(&self) -> Result<Vec<Instruction>, LoadError> {
        let data = std::fs::read_to_string(&self.path).map_err(|source| LoadError::Read {
            path: self.path.clone(),
            source,
        })?;
        let list = InstructionList::from_json(&data, &self.path.display().to_string())?;
        Ok(list.instructions)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Instruction file written by `armctl init`.
pub fn sample_instructions() -> InstructionList {
    InstructionList::new(vec![
        Instruction::new("home", 1.0)
            .with_target(JointId::S0, 0.0)
            .with_target(JointId::S1, 25.0)
            .with_target(JointId::S2, -70.0)
            .with_target(JointId::S3, 0.0)
            .with_target(JointId::S5, 0.0),
        Instruction::new("reach", 2.0)
            .with_target(JointId::S1, 50.0)
            .with_target(JointId::S2, -50.0),
        Instruction::new("grab", 0.5).with_target(JointId::S5, 180.0),
        Instruction::new("turn", 2.0).with_target(JointId::S0, -45.0),
        Instruction::new("wave", 1.0).with_target(JointId::S3, 60.0),
        Instruction::new("release", 0.5).with_target(JointId::S5, 0.0),
    ])
}
