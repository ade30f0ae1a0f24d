//! Policy interface to the dialogue-management orchestrator
use crate::acts::DialogueAct;
use crate::domain::{random_system_act, Domain};
use crate::error::CheckpointError;
use crate::logging::Logger;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;

/// Whether a policy is exploring or exploiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorMode {
    /// Learning mode: the policy may explore and expects `train` calls.
    Training,
    /// Evaluation mode: always act from the trained network.
    Release,
}

/// One turn of a recorded dialogue.
#[derive(Debug, Clone)]
pub struct Turn<S> {
    /// Dialogue state at the start of the turn.
    pub state: S,
    /// System act(s) taken at this turn.
    pub action: Vec<DialogueAct>,
    /// Reward received for the turn.
    pub reward: f64,
}

/// A complete recorded dialogue, in turn order.
pub type Dialogue<S> = Vec<Turn<S>>;

/// Bootstrap policy consulted during the exploration branch of training.
pub trait WarmupPolicy<S> {
    fn next_action(&mut self, state: &S) -> Vec<DialogueAct>;
}

/// The contract a trainable dialogue policy presents to the orchestrator.
///
/// `save`/`load` persist network parameters only; optimizer state, the
/// vocabulary, and the exploration schedule are rebuilt from configuration,
/// so a checkpoint does not resume a training session exactly.
pub trait Policy<S> {
    /// Select the system act(s) for a state.
    fn next_action(&mut self, state: &S) -> Vec<DialogueAct>;

    /// Update parameters from a batch of complete dialogues.
    fn train(&mut self, batch: &[Dialogue<S>], logger: &mut dyn Logger);

    /// Save network parameters.
    fn save(&self, path: &Path) -> Result<(), CheckpointError>;

    /// Restore network parameters. Loading from a missing path is a no-op.
    fn load(&mut self, path: &Path) -> Result<(), CheckpointError>;
}

/// Warmup policy that samples uniformly random parametrized system acts.
#[derive(Debug, Clone)]
pub struct RandomWarmup {
    domain: Domain,
    rng: StdRng,
}

impl RandomWarmup {
    #[must_use]
    pub fn new(domain: Domain, seed: u64) -> Self {
        Self {
            domain,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<S> WarmupPolicy<S> for RandomWarmup {
    fn next_action(&mut self, _state: &S) -> Vec<DialogueAct> {
        random_system_act(&self.domain, &mut self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testing::TestOntology;

    #[test]
    fn random_warmup_ignores_the_state() {
        let domain = Domain::from_ontology(&TestOntology);
        let mut warmup = RandomWarmup::new(domain.clone(), 3);
        let acts = WarmupPolicy::<()>::next_action(&mut warmup, &());
        assert_eq!(acts.len(), 1);
        assert!(domain.is_parametrized(&acts[0].intent));
    }
}
