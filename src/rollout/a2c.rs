//! Advantage actor-critic over gathered rollouts
use super::buffer::ExperienceBuffer;
use super::gae::{flatten_time_env, generalized_advantage_estimation};
use super::{AgentStepper, EnvStepper, Transition};
use crate::logging::{Event, Logger};
use crate::torch::distributions::Categorical;
use crate::torch::optimizers::{BaseOptimizer, OnceOptimizer};
use serde::{Deserialize, Serialize};
use tch::{COptimizer, Kind, Reduction, Tensor};

/// Configuration for the [`A2c`] engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct A2cConfig {
    /// Weight of the entropy bonus in the combined loss.
    pub entropy_coef: f64,
    /// Weight of the value regression loss in the combined loss.
    pub value_loss_coef: f64,
    /// Gradient norm clipping threshold.
    pub max_grad_norm: f64,
    /// Rollout horizon per training iteration.
    pub num_rollout_steps: usize,
    /// Discount factor on future rewards.
    pub discount: f64,
    /// Advantage interpolation factor between one-step residuals (=0) and
    /// full returns (=1).
    pub gae_lambda: f64,
}

impl Default for A2cConfig {
    fn default() -> Self {
        Self {
            entropy_coef: 0.01,
            value_loss_coef: 0.5,
            max_grad_norm: 0.5,
            num_rollout_steps: 4,
            discount: 0.99,
            gae_lambda: 0.95,
        }
    }
}

/// The differentiable view of an agent used for loss computation.
pub trait ActorCritic {
    /// Action distribution and state-value estimates for a flat batch of
    /// observations.
    fn dist_value(&self, observations: &Tensor) -> (Categorical, Tensor);
}

/// A gathered rollout with derived advantages and return targets, flattened
/// env-major to a single batch dimension.
#[derive(Debug)]
pub struct Experience {
    pub observations: Tensor,
    pub actions: Tensor,
    pub advantages: Tensor,
    pub returns: Tensor,
}

/// Actor-critic trainer over an environment/agent stepper pair.
///
/// Each iteration gathers `num_rollout_steps` transitions into the rolling
/// experience buffer, estimates advantages with GAE, and takes one gradient
/// step on the combined policy/entropy/value loss.
pub struct A2c<E, A> {
    env: E,
    agent: A,
    buffer: ExperienceBuffer,
    optimizer: COptimizer,
    config: A2cConfig,
}

impl<E, A> A2c<E, A>
where
    E: EnvStepper,
    A: AgentStepper + ActorCritic,
{
    /// Set up the engine: reset the environment and pre-fill the buffer with
    /// the initial transition.
    pub fn new(mut env: E, mut agent: A, optimizer: COptimizer, config: A2cConfig) -> Self {
        let env_step = env.reset();
        let agent_step = agent.step(&env_step);
        let buffer = ExperienceBuffer::prefilled(
            config.num_rollout_steps + 1,
            Transition {
                env: env_step,
                agent: agent_step,
            },
        );
        Self {
            env,
            agent,
            buffer,
            optimizer,
            config,
        }
    }

    #[must_use]
    pub fn agent(&self) -> &A {
        &self.agent
    }

    #[must_use]
    pub fn buffer(&self) -> &ExperienceBuffer {
        &self.buffer
    }

    /// Gather one rollout and compute advantages and return targets.
    ///
    /// After this call the buffer holds the bootstrap entry plus
    /// `num_rollout_steps` fresh transitions and is aligned for the next
    /// iteration. Advantages and returns are derived here and not persisted.
    #[allow(clippy::cast_possible_truncation)]
    pub fn collect(&mut self) -> Experience {
        self.buffer.last_becomes_first();
        for _ in 0..self.config.num_rollout_steps {
            let previous = self.buffer.last_written().agent.clone();
            let env_step = self.env.step(&previous);
            let agent_step = self.agent.step(&env_step);
            self.buffer.store(Transition {
                env: env_step,
                agent: agent_step,
            });
        }
        assert_eq!(self.buffer.last_written_idx(), self.config.num_rollout_steps);

        let stacked = |field: &dyn Fn(&Transition) -> Tensor| {
            let rows: Vec<Tensor> = self.buffer.iter().map(field).collect();
            Tensor::stack(&rows, 0)
        };
        let rewards = stacked(&|t| t.env.reward.shallow_clone());
        let dones = stacked(&|t| t.env.done.shallow_clone());
        let values = stacked(&|t| t.agent.value.shallow_clone());
        let observations = stacked(&|t| t.env.observation.shallow_clone());
        let actions = stacked(&|t| t.agent.action.shallow_clone());

        let advantages = generalized_advantage_estimation(
            &rewards,
            &values,
            &dones,
            self.config.num_rollout_steps,
            self.config.discount,
            self.config.gae_lambda,
        );
        let steps = self.config.num_rollout_steps as i64;
        let returns = values.narrow(0, 0, steps) + &advantages;

        Experience {
            observations: flatten_time_env(&observations.narrow(0, 0, steps)),
            actions: flatten_time_env(&actions.narrow(0, 0, steps)),
            advantages: flatten_time_env(&advantages),
            returns: flatten_time_env(&returns),
        }
    }

    /// Combined loss over an experience batch:
    /// `policy_loss - entropy_coef * entropy + value_loss_coef * value_loss`.
    pub fn loss(&self, experience: &Experience) -> Tensor {
        let (dist, value) = self.agent.dist_value(&experience.observations);
        let entropy = dist.entropy().mean(Kind::Float);
        let log_probs = dist.log_probs(&experience.actions);
        let policy_loss = -(log_probs * &experience.advantages).mean(Kind::Float);
        let value_loss = value.mse_loss(&experience.returns, Reduction::Mean);
        policy_loss - entropy * self.config.entropy_coef
            + value_loss * self.config.value_loss_coef
    }

    /// One training iteration: gather, estimate advantages, update.
    ///
    /// # Returns
    /// The loss value before the update step.
    pub fn update(&mut self, logger: &mut dyn Logger) -> f64 {
        let experience = self.collect();
        let loss = self.loss(&experience);
        let loss_value = loss.double_value(&[]);

        BaseOptimizer::zero_grad(&mut self.optimizer);
        loss.backward();
        self.optimizer
            .clip_grad_norm(self.config.max_grad_norm)
            .expect("gradient clipping failed");
        self.optimizer.step_once().expect("optimizer step failed");

        logger.log(Event::Epoch, "loss", loss_value.into()).unwrap();
        logger
            .log(
                Event::Epoch,
                "advantage",
                f64::from(&experience.advantages.mean(Kind::Float)).into(),
            )
            .unwrap();
        logger.done(Event::Epoch);
        loss_value
    }
}
