//! Ordered execution of pose instructions.
//!
//! A run moves through `Idle → Loading → Running → Completed`. Load and
//! preflight failures end in `Failed` before any actuator is touched; a fault
//! while running ends in `Failed` with the arm left where it was last
//! commanded. Cancellation is observed only between steps and ends in
//! `Interrupted`.
//!
//! Each instruction:
//! 1. reads the current angle of every joint it names and resolves the target
//!    through the calibration model;
//! 2. walks `divisions - 1` intermediate steps, sleeping
//!    `seconds / divisions * step_sleep_ratio` after each;
//! 3. commands every joint exactly onto its target;
//! 4. waits the fixed settle delay.

use crate::calibration::CalibrationModel;
use crate::delay::{CancelToken, Delay};
use crate::error::{ArmError, CalibrationError, Cancelled, JointError, Result};
use crate::instruction::{Instruction, InstructionSource};
use crate::joint::JointId;
use crate::registry::JointRegistry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

// ---------------------------------------------------------------------------
// TimingConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Pause after every instruction, independent of its duration.
    #[serde(default = "default_settle_seconds")]
    pub settle_seconds: f64,
    /// Number of slices a transition is split into. 1 jumps straight to the target.
    #[serde(default = "default_divisions")]
    pub divisions: u32,
    /// Fraction of each slice's nominal time actually slept.
    #[serde(default = "default_step_sleep_ratio")]
    pub step_sleep_ratio: f64,
}

fn default_settle_seconds() -> f64 {
    2.0
}

fn default_divisions() -> u32 {
    1
}

fn default_step_sleep_ratio() -> f64 {
    0.5
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settle_seconds: default_settle_seconds(),
            divisions: default_divisions(),
            step_sleep_ratio: default_step_sleep_ratio(),
        }
    }
}

/// Longest settle delay accepted, in seconds.
pub const MAX_SETTLE_SECONDS: f64 = 3600.0;

impl TimingConfig {
    /// Problems that would make the timing unusable, one message each.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.divisions == 0 {
            problems.push("timing.divisions must be at least 1".to_string());
        }
        if !(0.0..=MAX_SETTLE_SECONDS).contains(&self.settle_seconds) {
            problems.push(format!(
                "timing.settle_seconds must be between 0 and {MAX_SETTLE_SECONDS}, got {}",
                self.settle_seconds
            ));
        }
        if !(0.0..=1.0).contains(&self.step_sleep_ratio) {
            problems.push(format!(
                "timing.step_sleep_ratio must be between 0 and 1, got {}",
                self.step_sleep_ratio
            ));
        }
        problems
    }

    pub fn check(&self) -> Result<()> {
        match self.problems().first() {
            Some(problem) => Err(ArmError::InvalidConfig(problem.clone())),
            None => Ok(()),
        }
    }

    pub fn settle(&self) -> Result<Duration> {
        secs("settle delay", self.settle_seconds)
    }

    /// Sleep between two intermediate steps of an instruction lasting `seconds`.
    pub fn step_sleep(&self, seconds: f64) -> Result<Duration> {
        let slice = seconds / f64::from(self.divisions.max(1)) * self.step_sleep_ratio;
        secs("step sleep", slice)
    }
}

fn secs(what: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|e| ArmError::InvalidConfig(format!("{what} of {value} seconds: {e}")))
}

// ---------------------------------------------------------------------------
// State and report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequencerState {
    Idle,
    Loading,
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl fmt::Display for SequencerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SequencerState::Idle => "idle",
            SequencerState::Loading => "loading",
            SequencerState::Running => "running",
            SequencerState::Completed => "completed",
            SequencerState::Interrupted => "interrupted",
            SequencerState::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Interrupted,
}

/// Summary of a run that was not stopped by a fault.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub instructions_total: usize,
    /// Instructions whose final commands were all issued.
    pub instructions_executed: usize,
    pub commands_issued: usize,
    /// Instruction in progress when the run was interrupted.
    pub interrupted_during: Option<String>,
    /// The stop came during the settle delay of `interrupted_during`, whose
    /// commands were all issued and which counts as executed.
    pub interrupted_while_settling: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub final_angles: BTreeMap<JointId, f64>,
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedTarget {
    pub actual: f64,
    pub native: f64,
}

/// An instruction with every joint target resolved to native angles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedStep {
    pub name: String,
    pub seconds: f64,
    pub targets: BTreeMap<JointId, PlannedTarget>,
}

/// Resolves every instruction through `calibration` without touching any actuator.
pub fn plan(
    calibration: &CalibrationModel,
    instructions: &[Instruction],
) -> Result<Vec<PlannedStep>> {
    instructions
        .iter()
        .map(|instruction| {
            let targets = instruction
                .configuration
                .iter()
                .map(|(joint, actual)| {
                    let native = calibration.to_native(*joint, *actual)?;
                    Ok((*joint, PlannedTarget { actual: *actual, native }))
                })
                .collect::<std::result::Result<BTreeMap<_, _>, CalibrationError>>()
                .map_err(|e| ArmError::from(e).in_instruction(&instruction.name))?;
            Ok(PlannedStep {
                name: instruction.name.clone(),
                seconds: instruction.seconds,
                targets,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Sequencer
// ---------------------------------------------------------------------------

/// Why an instruction stopped early.
enum Halt {
    Cancelled { settling: bool },
    Fault(ArmError),
}

impl From<Cancelled> for Halt {
    fn from(_: Cancelled) -> Self {
        Halt::Cancelled { settling: false }
    }
}

impl From<ArmError> for Halt {
    fn from(e: ArmError) -> Self {
        Halt::Fault(e)
    }
}

impl From<JointError> for Halt {
    fn from(e: JointError) -> Self {
        Halt::Fault(e.into())
    }
}

impl From<CalibrationError> for Halt {
    fn from(e: CalibrationError) -> Self {
        Halt::Fault(e.into())
    }
}

struct JointMove {
    joint: JointId,
    start: f64,
    target: f64,
    increment: f64,
}

pub struct Sequencer<'a, D: Delay> {
    calibration: &'a CalibrationModel,
    registry: &'a mut JointRegistry,
    delay: D,
    cancel: CancelToken,
    timing: TimingConfig,
    state: SequencerState,
    executed: usize,
    commands_issued: usize,
}

impl<'a, D: Delay> Sequencer<'a, D> {
    pub fn new(
        calibration: &'a CalibrationModel,
        registry: &'a mut JointRegistry,
        delay: D,
    ) -> Self {
        Self {
            calibration,
            registry,
            delay,
            cancel: CancelToken::new(),
            timing: TimingConfig::default(),
            state: SequencerState::Idle,
            executed: 0,
            commands_issued: 0,
        }
    }

    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Loads the full instruction list from `source` and executes it in order.
    pub fn run(&mut self, source: &dyn InstructionSource) -> Result<RunReport> {
        let started_at = Utc::now();
        self.executed = 0;
        self.commands_issued = 0;

        self.state = SequencerState::Loading;
        tracing::info!(source = %source.describe(), "loading instructions");
        let instructions = match source.load() {
            Ok(list) => list,
            Err(e) => {
                self.state = SequencerState::Failed;
                return Err(e.into());
            }
        };
        if let Err(e) = self.preflight(&instructions) {
            self.state = SequencerState::Failed;
            return Err(e);
        }

        self.state = SequencerState::Running;
        tracing::info!(count = instructions.len(), "starting sequence");
        let mut interrupted_during = None;
        let mut interrupted_while_settling = false;
        for instruction in &instructions {
            match self.execute(instruction) {
                Ok(()) => {}
                Err(Halt::Cancelled { settling }) => {
                    tracing::warn!(
                        instruction = %instruction.name,
                        settling,
                        "sequence cancelled by operator"
                    );
                    interrupted_during = Some(instruction.name.clone());
                    interrupted_while_settling = settling;
                    break;
                }
                Err(Halt::Fault(e)) => {
                    self.state = SequencerState::Failed;
                    tracing::error!(
                        instruction = %instruction.name,
                        error = %e,
                        "instruction failed"
                    );
                    return Err(e.in_instruction(&instruction.name));
                }
            }
        }

        let outcome = if interrupted_during.is_some() {
            self.state = SequencerState::Interrupted;
            RunOutcome::Interrupted
        } else {
            self.state = SequencerState::Completed;
            tracing::info!(executed = self.executed, "sequence complete");
            RunOutcome::Completed
        };
        Ok(RunReport {
            outcome,
            instructions_total: instructions.len(),
            instructions_executed: self.executed,
            commands_issued: self.commands_issued,
            interrupted_during,
            interrupted_while_settling,
            started_at,
            finished_at: Utc::now(),
            final_angles: self.registry.snapshot(),
        })
    }

    /// Rejects the whole list before any motion if the timing is unusable or a
    /// joint lacks calibration or an actuator.
    fn preflight(&self, instructions: &[Instruction]) -> Result<()> {
        self.timing.check()?;
        self.timing.settle()?;
        plan(self.calibration, instructions)?;
        for instruction in instructions {
            self.timing
                .step_sleep(instruction.seconds)
                .map_err(|e| e.in_instruction(&instruction.name))?;
            if let Some(joint) = instruction.joints().find(|j| !self.registry.contains(*j)) {
                return Err(ArmError::from(JointError::UnknownJoint(joint))
                    .in_instruction(&instruction.name));
            }
        }
        Ok(())
    }

    fn execute(&mut self, instruction: &Instruction) -> std::result::Result<(), Halt> {
        self.cancel.check()?;
        tracing::info!(instruction = %instruction.name, "executing");

        let divisions = self.timing.divisions.max(1);
        let mut moves = Vec::with_capacity(instruction.configuration.len());
        for (&joint, &actual) in &instruction.configuration {
            let start = self.registry.get_native_angle(joint)?;
            let target = self.calibration.to_native(joint, actual)?;
            tracing::info!(
                joint = %joint,
                degrees = actual,
                seconds = instruction.seconds,
                input = target,
                "moving joint"
            );
            moves.push(JointMove {
                joint,
                start,
                target,
                increment: (target - start) / f64::from(divisions),
            });
        }

        let step_sleep = self.timing.step_sleep(instruction.seconds)?;
        for step in 1..divisions {
            self.cancel.check()?;
            for m in &moves {
                self.command(m.joint, m.start + m.increment * f64::from(step))?;
            }
            self.delay.sleep(step_sleep, &self.cancel)?;
        }

        self.cancel.check()?;
        for m in &moves {
            self.command(m.joint, m.target)?;
        }
        self.executed += 1;

        let settle = self.timing.settle()?;
        tracing::debug!(seconds = settle.as_secs_f64(), "settling");
        self.delay
            .sleep(settle, &self.cancel)
            .map_err(|_| Halt::Cancelled { settling: true })?;
        Ok(())
    }

    fn command(&mut self, joint: JointId, angle: f64) -> std::result::Result<(), JointError> {
        tracing::trace!(joint = %joint, angle, "set angle");
        self.registry.set_native_angle(joint, angle)?;
        self.commands_issued += 1;
        Ok(())
    }
}
