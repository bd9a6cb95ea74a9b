use crate::joint::JointId;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to obtain an instruction list. Always raised before any motion.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read instruction file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed instruction data in {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid instruction '{instruction}': {reason}")]
    Invalid { instruction: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    #[error("no calibration entry for joint {0}")]
    UnknownJoint(JointId),

    #[error("degenerate calibration anchors: both have actual angle {actual}")]
    DegenerateAnchors { actual: f64 },

    #[error("calibration anchor is not a finite number")]
    NonFiniteAnchor,

    #[error("calibration for joint {0} maps every angle to the same input; it cannot be inverted")]
    FlatTransform(JointId),
}

/// Rejection reported by an actuator driver.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct ActuatorFault(pub String);

impl ActuatorFault {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum JointError {
    #[error("joint {0} is not registered")]
    UnknownJoint(JointId),

    #[error("actuator fault on joint {joint}: {fault}")]
    ActuatorFault {
        joint: JointId,
        #[source]
        fault: ActuatorFault,
    },
}

/// Raised by a delay when the operator asks the run to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cancelled by operator")]
pub struct Cancelled;

#[derive(Debug, Error)]
pub enum ArmError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    #[error(transparent)]
    Joint(#[from] JointError),

    #[error("instruction '{name}' failed")]
    Instruction {
        name: String,
        #[source]
        source: Box<ArmError>,
    },

    #[error("unknown joint name '{0}': expected one of S0, S1, S2, S3, S5")]
    UnknownJointName(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ArmError {
    /// Wraps `self` with the name of the instruction being executed.
    pub fn in_instruction(self, name: &str) -> Self {
        ArmError::Instruction {
            name: name.to_string(),
            source: Box::new(self),
        }
    }

    /// True when the error, or the error it wraps, came from the instruction source.
    pub fn is_load(&self) -> bool {
        match self {
            ArmError::Load(_) => true,
            ArmError::Instruction { source, .. } => source.is_load(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ArmError>;
