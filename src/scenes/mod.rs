// src/scenes/mod.rs

//! The two stock geometries, parameterized by their configs.

pub mod control_volume;
pub mod domain;

use crate::PipelineError;

fn require(condition: bool, message: impl FnOnce() -> String) -> Result<(), PipelineError> {
    if condition {
        Ok(())
    } else {
        Err(PipelineError::Config(message()))
    }
}
