//! Generic actor-critic rollout training
//!
//! Structurally independent of the dialogue-specific components: any
//! environment/agent pair satisfying the stepper contracts can be trained.
//! Steps carry batched tensors shaped `(num_envs, ..)` so several parallel
//! environment instances may advance in lockstep; their trajectories are
//! separated again by the env-major flattening in [`gae`].
mod a2c;
mod buffer;
pub mod gae;

pub use a2c::{A2c, A2cConfig, ActorCritic, Experience};
pub use buffer::ExperienceBuffer;
pub use gae::{flatten_time_env, generalized_advantage_estimation};

use tch::Tensor;

/// Result of one environment step.
#[derive(Debug)]
pub struct EnvStep {
    /// Observation of the post-step state, shape `[NUM_ENVS, ..]`.
    pub observation: Tensor,
    /// Reward for the step, shape `[NUM_ENVS]`.
    pub reward: Tensor,
    /// Episode-end flags (0 or 1), shape `[NUM_ENVS]`.
    pub done: Tensor,
}

/// Result of one agent step.
#[derive(Debug)]
pub struct AgentStep {
    /// Chosen action indices, shape `[NUM_ENVS]`.
    pub action: Tensor,
    /// State-value estimates, shape `[NUM_ENVS]`.
    pub value: Tensor,
}

/// A combined environment/agent step stored in the experience buffer.
#[derive(Debug)]
pub struct Transition {
    pub env: EnvStep,
    pub agent: AgentStep,
}

// Buffer entries are only ever replaced wholesale, never mutated in place,
// so shallow tensor copies are safe to share.
impl Clone for EnvStep {
    fn clone(&self) -> Self {
        Self {
            observation: self.observation.shallow_clone(),
            reward: self.reward.shallow_clone(),
            done: self.done.shallow_clone(),
        }
    }
}

impl Clone for AgentStep {
    fn clone(&self) -> Self {
        Self {
            action: self.action.shallow_clone(),
            value: self.value.shallow_clone(),
        }
    }
}

impl Clone for Transition {
    fn clone(&self) -> Self {
        Self {
            env: self.env.clone(),
            agent: self.agent.clone(),
        }
    }
}

/// An environment driven by agent actions.
pub trait EnvStepper {
    /// Apply the most recent agent action and observe the result.
    fn step(&mut self, agent_step: &AgentStep) -> EnvStep;

    /// Reset to an initial state and observe it.
    fn reset(&mut self) -> EnvStep;
}

/// An agent driven by environment observations.
pub trait AgentStepper {
    /// Choose an action and estimate the state value for an observation.
    fn step(&mut self, env_step: &EnvStep) -> AgentStep;
}
