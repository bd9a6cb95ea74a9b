use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// JointId
// ---------------------------------------------------------------------------

/// One controllable degree of freedom of the arm.
///
/// The set is fixed by the hardware: there is no `S4`, the gripper servo sits
/// on its own channel further down the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JointId {
    S0,
    S1,
    S2,
    S3,
    S5,
}

impl JointId {
    pub fn all() -> &'static [JointId] {
        &[
            JointId::S0,
            JointId::S1,
            JointId::S2,
            JointId::S3,
            JointId::S5,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JointId::S0 => "S0",
            JointId::S1 => "S1",
            JointId::S2 => "S2",
            JointId::S3 => "S3",
            JointId::S5 => "S5",
        }
    }

    pub fn role(self) -> &'static str {
        match self {
            JointId::S0 => "turntable",
            JointId::S1 => "shoulder",
            JointId::S2 => "elbow",
            JointId::S3 => "wrist",
            JointId::S5 => "gripper",
        }
    }

    /// PWM channel the joint is wired to on the stock board.
    pub fn default_channel(self) -> u8 {
        match self {
            JointId::S0 => 0,
            JointId::S1 => 1,
            JointId::S2 => 2,
            JointId::S3 => 3,
            JointId::S5 => 8,
        }
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JointId {
    type Err = crate::error::ArmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "S0" => Ok(JointId::S0),
            "S1" => Ok(JointId::S1),
            "S2" => Ok(JointId::S2),
            "S3" => Ok(JointId::S3),
            "S5" => Ok(JointId::S5),
            _ => Err(crate::error::ArmError::UnknownJointName(s.to_string())),
        }
    }
}
