use crate::calibration::{
    default_anchors, AnchorPair, CalibrationEntry, CalibrationModel, GRIPPER_OPEN,
};
use crate::error::{ArmError, Result};
use crate::instruction::DEFAULT_INSTRUCTIONS_FILE;
use crate::joint::JointId;
use crate::registry::{Actuator, JointRegistry, ServoRange, SimulatedServo};
use crate::sequencer::TimingConfig;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "arm.yaml";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// BoardConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// PWM channels available on the servo board.
    #[serde(default = "default_channels")]
    pub channels: u8,
}

fn default_channels() -> u8 {
    16
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            channels: default_channels(),
        }
    }
}

// ---------------------------------------------------------------------------
// JointConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointConfig {
    pub channel: u8,
    #[serde(default)]
    pub range: ServoRange,
    /// Native angle the servo is assumed to hold at startup.
    #[serde(default = "default_home")]
    pub home: f64,
    pub calibration: [AnchorPair; 2],
}

fn default_home() -> f64 {
    90.0
}

impl JointConfig {
    pub fn stock(joint: JointId) -> Self {
        Self {
            channel: joint.default_channel(),
            range: ServoRange::default(),
            home: if joint == JointId::S5 {
                GRIPPER_OPEN
            } else {
                default_home()
            },
            calibration: default_anchors(joint),
        }
    }
}

fn default_joints() -> BTreeMap<JointId, JointConfig> {
    JointId::all()
        .iter()
        .map(|j| (*j, JointConfig::stock(*j)))
        .collect()
}

fn default_instructions() -> String {
    DEFAULT_INSTRUCTIONS_FILE.to_string()
}

// ---------------------------------------------------------------------------
// ArmConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmConfig {
    /// Instruction file, relative to the project root.
    #[serde(default = "default_instructions")]
    pub instructions: String,
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default = "default_joints")]
    pub joints: BTreeMap<JointId, JointConfig>,
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            instructions: default_instructions(),
            board: BoardConfig::default(),
            timing: TimingConfig::default(),
            joints: default_joints(),
        }
    }
}

impl ArmConfig {
    pub fn path(root: &Path) -> PathBuf {
        root.join(CONFIG_FILE)
    }

    /// Reads `arm.yaml` under `root`; the stock rig is assumed when it is absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: ArmConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let data = self.to_yaml()?;
        crate::io::atomic_write(&Self::path(root), data.as_bytes())
    }

    pub fn instructions_path(&self, root: &Path) -> PathBuf {
        root.join(&self.instructions)
    }

    pub fn calibration_model(&self) -> Result<CalibrationModel> {
        CalibrationModel::from_anchors(self.joints.iter().map(|(j, c)| (*j, c.calibration)))
            .map_err(|(joint, e)| ArmError::InvalidConfig(format!("joint {joint}: {e}")))
    }

    /// One simulated servo per configured joint, parked at its home angle.
    pub fn simulated_registry(&self) -> JointRegistry {
        let actuators: BTreeMap<JointId, Box<dyn Actuator>> = self
            .joints
            .iter()
            .map(|(joint, c)| {
                let servo: Box<dyn Actuator> =
                    Box::new(SimulatedServo::new(c.channel, c.range, c.home));
                (*joint, servo)
            })
            .collect();
        JointRegistry::new(actuators)
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut error = |message: String| {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message,
            })
        };

        for problem in self.timing.problems() {
            error(problem);
        }

        let mut by_channel: HashMap<u8, JointId> = HashMap::new();
        for (joint, c) in &self.joints {
            if c.channel >= self.board.channels {
                error(format!(
                    "joint {joint} uses channel {} but the board has {} channels",
                    c.channel, self.board.channels
                ));
            }
            if let Some(other) = by_channel.insert(c.channel, *joint) {
                error(format!(
                    "joints {other} and {joint} share channel {}",
                    c.channel
                ));
            }
            if c.range.min >= c.range.max {
                error(format!(
                    "joint {joint} has an empty range {}..={}",
                    c.range.min, c.range.max
                ));
            }
            if let Err(e) = CalibrationEntry::from_pairs(&c.calibration) {
                error(format!("joint {joint}: {e}"));
            }
        }

        for (joint, c) in &self.joints {
            if !c.range.contains(c.home) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "joint {joint} home {} is outside its range {}..={}",
                        c.home, c.range.min, c.range.max
                    ),
                });
            }
            for anchor in &c.calibration {
                if !c.range.contains(anchor.input) {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!(
                            "joint {joint} calibration input {} is outside its range {}..={}",
                            anchor.input, c.range.min, c.range.max
                        ),
                    });
                }
            }
        }

        if self.joints.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "no joints configured".to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
