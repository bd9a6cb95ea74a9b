pub mod calibration;
pub mod config;
pub mod delay;
pub mod error;
pub mod instruction;
pub mod io;
pub mod joint;
pub mod registry;
pub mod sequencer;

pub use error::{ArmError, Result};
