//! Reinforcement-learning training for task-oriented dialogue policies.
//!
//! A dialogue policy selects a system dialogue act (an intent plus a set of
//! slots) from an encoded dialogue state. This crate provides the numeric
//! bridge between structured acts/states and tensors ([`encoding`]), a
//! convolutional policy network over encoded states ([`torch`]), an episodic
//! REINFORCE trainer driven by complete dialogues ([`reinforce`]), and a
//! general actor-critic rollout engine with generalized advantage estimation
//! ([`rollout`]).
#![warn(clippy::cast_lossless)]
#![warn(clippy::cast_possible_truncation)]
#![warn(clippy::doc_markdown)]
#![warn(clippy::explicit_iter_loop)]
#![warn(clippy::needless_pass_by_value)]
#![warn(clippy::redundant_closure_for_method_calls)]
#![warn(clippy::use_self)]
pub mod acts;
pub mod domain;
pub mod encoding;
mod error;
pub mod logging;
pub mod policy;
pub mod reinforce;
pub mod rollout;
pub mod state;
pub mod torch;

pub use acts::{DialogueAct, DialogueActItem, Operator};
pub use domain::{Domain, Ontology};
pub use error::{BuildPolicyError, CheckpointError, DialearnError};
pub use policy::{ActorMode, Dialogue, Policy, RandomWarmup, Turn, WarmupPolicy};
pub use reinforce::{ReinforceConfig, ReinforcePolicy};
pub use rollout::{A2c, A2cConfig, AgentStep, AgentStepper, EnvStep, EnvStepper};
pub use state::{CanonicalState, StateFields};
