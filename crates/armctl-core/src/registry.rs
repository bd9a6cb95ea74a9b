//! Actuator boundary and the fixed joint → actuator table.

use crate::error::{ActuatorFault, JointError};
use crate::joint::JointId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Actuator
// ---------------------------------------------------------------------------

/// Driver for one servo channel. Angles are in native (input) degrees.
pub trait Actuator {
    /// Last angle the servo was commanded to.
    fn angle(&self) -> Result<f64, ActuatorFault>;

    fn set_angle(&mut self, angle: f64) -> Result<(), ActuatorFault>;
}

/// Inclusive actuation range of a servo, in native degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServoRange {
    pub min: f64,
    pub max: f64,
}

impl ServoRange {
    pub fn contains(&self, angle: f64) -> bool {
        angle >= self.min && angle <= self.max
    }
}

impl Default for ServoRange {
    fn default() -> Self {
        Self { min: 0.0, max: 180.0 }
    }
}

// ---------------------------------------------------------------------------
// SimulatedServo
// ---------------------------------------------------------------------------

/// In-memory hobby servo. Refuses commands outside its actuation range the
/// way a PWM servo driver does, and otherwise just remembers the angle.
#[derive(Debug, Clone)]
pub struct SimulatedServo {
    channel: u8,
    range: ServoRange,
    angle: f64,
}

impl SimulatedServo {
    pub fn new(channel: u8, range: ServoRange, initial: f64) -> Self {
        Self {
            channel,
            range,
            angle: initial,
        }
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }
}

impl Actuator for SimulatedServo {
    fn angle(&self) -> Result<f64, ActuatorFault> {
        Ok(self.angle)
    }

    fn set_angle(&mut self, angle: f64) -> Result<(), ActuatorFault> {
        if !angle.is_finite() {
            return Err(ActuatorFault::new(format!(
                "channel {}: angle {angle} is not a number",
                self.channel
            )));
        }
        if !self.range.contains(angle) {
            return Err(ActuatorFault::new(format!(
                "channel {}: angle {angle:.2} outside actuation range {}..={}",
                self.channel, self.range.min, self.range.max
            )));
        }
        self.angle = angle;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JointRegistry
// ---------------------------------------------------------------------------

/// The arm's joints, each bound to its actuator. The set is fixed at construction.
pub struct JointRegistry {
    actuators: BTreeMap<JointId, Box<dyn Actuator>>,
}

impl JointRegistry {
    pub fn new(actuators: BTreeMap<JointId, Box<dyn Actuator>>) -> Self {
        Self { actuators }
    }

    pub fn contains(&self, joint: JointId) -> bool {
        self.actuators.contains_key(&joint)
    }

    pub fn joints(&self) -> impl Iterator<Item = JointId> + '_ {
        self.actuators.keys().copied()
    }

    pub fn get_native_angle(&self, joint: JointId) -> Result<f64, JointError> {
        let actuator = self
            .actuators
            .get(&joint)
            .ok_or(JointError::UnknownJoint(joint))?;
        actuator
            .angle()
            .map_err(|fault| JointError::ActuatorFault { joint, fault })
    }

    pub fn set_native_angle(&mut self, joint: JointId, angle: f64) -> Result<(), JointError> {
        let actuator = self
            .actuators
            .get_mut(&joint)
            .ok_or(JointError::UnknownJoint(joint))?;
        actuator
            .set_angle(angle)
            .map_err(|fault| JointError::ActuatorFault { joint, fault })
    }

    /// Last known angle of every joint whose driver can report one.
    pub fn snapshot(&self) -> BTreeMap<JointId, f64> {
        self.actuators
            .iter()
            .filter_map(|(joint, a)| a.angle().ok().map(|angle| (*joint, angle)))
            .collect()
    }
}
