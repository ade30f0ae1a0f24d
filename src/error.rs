//! Error types
use tch::TchError;
use thiserror::Error;

/// Error from the dialogue-policy crate.
#[derive(Error, Debug)]
pub enum DialearnError {
    #[error("error building policy")]
    BuildPolicy(#[from] BuildPolicyError),
    #[error("checkpoint error")]
    Checkpoint(#[from] CheckpointError),
}

/// Error constructing a policy.
#[derive(Error, Debug)]
pub enum BuildPolicyError {
    #[error("error building optimizer")]
    Optimizer(#[from] TchError),
}

/// Error saving or restoring network parameters.
///
/// A missing checkpoint file on load is not an error; loads from nonexistent
/// paths are no-ops.
#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error(transparent)]
    Tch(#[from] TchError),
}
