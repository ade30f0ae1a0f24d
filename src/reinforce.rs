//! Episodic REINFORCE training for dialogue policies
use crate::acts::DialogueAct;
use crate::domain::Domain;
use crate::encoding::{ActCodec, StateEncoder};
use crate::error::{BuildPolicyError, CheckpointError};
use crate::logging::{Event, Logger};
use crate::policy::{ActorMode, Dialogue, Policy, Turn, WarmupPolicy};
use crate::state::CanonicalState;
use crate::torch::network::{PolicyNetConfig, PolicyNetwork};
use crate::torch::optimizers::{AdamConfig, Optimizer, OptimizerBuilder};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tch::{nn, COptimizer, Device, Kind, Tensor};

/// Configuration for [`ReinforcePolicy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReinforceConfig {
    /// Discount factor on future rewards.
    pub discount: f64,
    /// Initial exploration rate.
    pub epsilon: f64,
    /// Multiplicative exploration decay per training call.
    pub epsilon_decay: f64,
    /// Exploration rate floor.
    pub epsilon_min: f64,
    /// Maximum encoded state length.
    pub max_state_tokens: usize,
    pub network: PolicyNetConfig,
    pub optimizer: AdamConfig,
}

impl Default for ReinforceConfig {
    fn default() -> Self {
        Self {
            discount: 0.99,
            epsilon: 0.95,
            epsilon_decay: 0.995,
            epsilon_min: 0.05,
            max_state_tokens: 80,
            network: PolicyNetConfig::default(),
            optimizer: AdamConfig::default(),
        }
    }
}

/// Discounted return at each step: `R_t = r_t + discount * R_{t+1}`,
/// accumulated backward from the end of the episode.
#[must_use]
pub fn discounted_returns(rewards: &[f64], discount: f64) -> Vec<f64> {
    let mut returns = vec![0.0; rewards.len()];
    let mut acc = 0.0;
    for (i, &reward) in rewards.iter().enumerate().rev() {
        acc = reward + discount * acc;
        returns[i] = acc;
    }
    returns
}

/// Dialogue policy trained with episodic REINFORCE.
///
/// Action selection is epsilon-greedy during training: with probability
/// epsilon the warmup policy chooses, otherwise the network samples. Returns
/// are computed per dialogue and each turn contributes
/// `-log_prob * return` to the batch loss; one optimizer step per `train`
/// call, after which epsilon decays toward its floor.
pub struct ReinforcePolicy<W> {
    act_codec: ActCodec,
    state_encoder: StateEncoder,
    network: PolicyNetwork,
    vs: nn::VarStore,
    optimizer: COptimizer,
    warmup: W,
    mode: ActorMode,
    epsilon: f64,
    epsilon_decay: f64,
    epsilon_min: f64,
    discount: f64,
    device: Device,
    rng: StdRng,
    losses: Vec<f64>,
}

impl<W> ReinforcePolicy<W> {
    /// Build a policy for a domain.
    ///
    /// All encoders are fit here, once, over the full domain vocabulary.
    pub fn new(
        domain: &Domain,
        warmup: W,
        config: &ReinforceConfig,
        device: Device,
        seed: u64,
    ) -> Result<Self, BuildPolicyError> {
        let act_codec = ActCodec::new(domain);
        let state_encoder = StateEncoder::new(domain, config.max_state_tokens);

        let vs = nn::VarStore::new(device);
        #[allow(clippy::cast_possible_truncation)]
        let network = config.network.build(
            &vs.root(),
            state_encoder.vocabulary().len() as i64,
            act_codec.num_intents() as i64,
            act_codec.num_slots() as i64,
        );
        let optimizer = config.optimizer.build_optimizer(&vs)?;

        Ok(Self {
            act_codec,
            state_encoder,
            network,
            vs,
            optimizer,
            warmup,
            mode: ActorMode::Training,
            epsilon: config.epsilon,
            epsilon_decay: config.epsilon_decay,
            epsilon_min: config.epsilon_min,
            discount: config.discount,
            device,
            rng: StdRng::seed_from_u64(seed),
            losses: Vec::new(),
        })
    }

    pub fn set_mode(&mut self, mode: ActorMode) {
        self.mode = mode;
    }

    #[must_use]
    pub const fn mode(&self) -> ActorMode {
        self.mode
    }

    /// Current exploration rate.
    #[must_use]
    pub const fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Mean batch loss of every training call so far, in call order.
    #[must_use]
    pub fn losses(&self) -> &[f64] {
        &self.losses
    }

    #[must_use]
    pub fn network(&self) -> &PolicyNetwork {
        &self.network
    }

    #[must_use]
    pub fn state_encoder(&self) -> &StateEncoder {
        &self.state_encoder
    }

    #[must_use]
    pub fn act_codec(&self) -> &ActCodec {
        &self.act_codec
    }

    /// Per-turn losses `-log_prob * return` for one dialogue.
    fn dialogue_losses<S: CanonicalState>(&self, dialogue: &[Turn<S>]) -> Vec<Tensor> {
        let mut log_probs = Vec::with_capacity(dialogue.len());
        for turn in dialogue {
            let ids = self.state_encoder.encode(&turn.state);
            let input = self.network.input(&ids, self.device);
            let action = self.act_codec.encode_acts(&turn.action);
            log_probs.push(self.network.log_probs(&input, &action));
        }
        let rewards: Vec<f64> = dialogue.iter().map(|t| t.reward).collect();
        discounted_returns(&rewards, self.discount)
            .into_iter()
            .zip(log_probs)
            .map(|(ret, log_prob)| -log_prob * ret)
            .collect()
    }
}

/// Log a value with the epoch event.
fn epoch_log_scalar<L, V>(logger: &mut L, name: &str, value: V)
where
    L: Logger + ?Sized,
    V: Into<f64>,
{
    logger.log(Event::Epoch, name, value.into().into()).unwrap();
}

impl<S, W> Policy<S> for ReinforcePolicy<W>
where
    S: CanonicalState,
    W: WarmupPolicy<S>,
{
    fn next_action(&mut self, state: &S) -> Vec<DialogueAct> {
        if self.mode == ActorMode::Training && self.rng.gen::<f64>() < self.epsilon {
            return self.warmup.next_action(state);
        }
        let ids = self.state_encoder.encode(state);
        let input = self.network.input(&ids, self.device);
        let (action, _) = tch::no_grad(|| self.network.step(&input));
        self.act_codec.decode(&action)
    }

    fn train(&mut self, batch: &[Dialogue<S>], logger: &mut dyn Logger) {
        let mut turn_losses = Vec::new();
        for dialogue in batch {
            turn_losses.extend(self.dialogue_losses(dialogue));
        }
        let num_turns = turn_losses.len();

        if !turn_losses.is_empty() {
            let loss_fn = || Tensor::stack(&turn_losses, 0).mean(Kind::Float);
            let loss = self
                .optimizer
                .backward_step(&loss_fn)
                .expect("policy gradient step failed");
            let loss_value = f64::from(&loss);
            self.losses.push(loss_value);
            epoch_log_scalar(logger, "loss", loss_value);
        }
        #[allow(clippy::cast_precision_loss)]
        {
            epoch_log_scalar(logger, "batch_num_dialogues", batch.len() as f64);
            epoch_log_scalar(logger, "batch_num_turns", num_turns as f64);
        }
        epoch_log_scalar(logger, "epsilon", self.epsilon);
        logger.done(Event::Epoch);

        // Decay exploration toward the floor.
        self.epsilon = (self.epsilon * self.epsilon_decay).max(self.epsilon_min);
    }

    fn save(&self, path: &Path) -> Result<(), CheckpointError> {
        self.vs.save(path)?;
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<(), CheckpointError> {
        if !path.is_file() {
            return Ok(());
        }
        self.vs.load(path)?;
        Ok(())
    }
}
