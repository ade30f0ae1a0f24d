//! Convolutional dialogue policy network
use super::distributions::{Bernoulli, Categorical};
use crate::encoding::{EncodedAct, PAD_ID};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tch::nn::Module;
use tch::{nn, Device, Kind, Tensor};

/// Configuration for the [`PolicyNetwork`] module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyNetConfig {
    /// Token embedding width.
    pub embed_dim: i64,
    /// Convolution channel width.
    pub hidden_dim: i64,
    /// Sequences are right-padded to at least this many tokens.
    ///
    /// 17 is the shortest input the four width-3 kernels with two stride-2
    /// stages accept.
    pub min_seq_len: i64,
}

impl Default for PolicyNetConfig {
    fn default() -> Self {
        Self {
            embed_dim: 32,
            hidden_dim: 64,
            min_seq_len: 17,
        }
    }
}

impl PolicyNetConfig {
    pub fn build(
        &self,
        vs: &nn::Path,
        vocab_size: i64,
        num_intents: i64,
        num_slots: i64,
    ) -> PolicyNetwork {
        PolicyNetwork::new(vs, vocab_size, num_intents, num_slots, self)
    }
}

/// Policy network: state token sequence to action distribution parameters.
///
/// An embedding feeds a 1-D convolution stack with two stride-2 downsampling
/// stages; global max-pooling over the sequence dimension yields a fixed-size
/// feature vector read by two independent heads. Intents are mutually
/// exclusive (softmax); slots are not (per-slot sigmoid).
#[derive(Debug)]
pub struct PolicyNetwork {
    embedding: nn::Embedding,
    convs: Vec<nn::Conv1D>,
    intent_head: nn::Linear,
    slot_head: nn::Linear,
    min_seq_len: i64,
}

impl PolicyNetwork {
    pub fn new(
        vs: &nn::Path,
        vocab_size: i64,
        num_intents: i64,
        num_slots: i64,
        config: &PolicyNetConfig,
    ) -> Self {
        let embedding = nn::embedding(
            vs / "embedding",
            vocab_size,
            config.embed_dim,
            Default::default(),
        );
        let conv = |name: &str, in_dim, stride| {
            nn::conv1d(
                vs / name,
                in_dim,
                config.hidden_dim,
                3,
                nn::ConvConfig {
                    stride,
                    ..Default::default()
                },
            )
        };
        let convs = vec![
            conv("conv_0", config.embed_dim, 1),
            conv("conv_1", config.hidden_dim, 2),
            conv("conv_2", config.hidden_dim, 2),
            conv("conv_3", config.hidden_dim, 1),
        ];
        let intent_head = nn::linear(
            vs / "intent_head",
            config.hidden_dim,
            num_intents,
            Default::default(),
        );
        let slot_head = nn::linear(
            vs / "slot_head",
            config.hidden_dim,
            num_slots,
            Default::default(),
        );
        Self {
            embedding,
            convs,
            intent_head,
            slot_head,
            min_seq_len: config.min_seq_len,
        }
    }

    /// Batch-of-one input tensor for a token-id sequence, right-padded to the
    /// minimum length the convolution stack accepts.
    #[must_use]
    pub fn input(&self, token_ids: &[i64], device: Device) -> Tensor {
        let mut padded = token_ids.to_vec();
        let min_len = usize::try_from(self.min_seq_len).expect("negative minimum length");
        if padded.len() < min_len {
            padded.resize(min_len, PAD_ID);
        }
        Tensor::of_slice(&padded).unsqueeze(0).to_device(device)
    }

    /// Distribution parameters for a batch of token sequences.
    ///
    /// # Returns
    /// * intent probabilities, shape `[BATCH, NUM_INTENTS]`, rows sum to 1.
    /// * slot inclusion probabilities, shape `[BATCH, NUM_SLOTS]`, each
    ///   independently in `[0, 1]`.
    pub fn forward(&self, tokens: &Tensor) -> (Tensor, Tensor) {
        let embedded = self.embedding.forward(tokens).transpose(2, 1);
        let mut hidden = embedded;
        for conv in &self.convs {
            hidden = conv.forward(&hidden).elu();
        }
        let features = hidden.amax(&[-1], false);
        let intent_probs = self.intent_head.forward(&features).softmax(-1, Kind::Float);
        let slot_probs = self.slot_head.forward(&features).sigmoid();
        (intent_probs, slot_probs)
    }

    /// Sample an action and its log-probability under the current parameters.
    ///
    /// The joint log-probability is the intent log-probability plus the sum
    /// of slot log-probabilities; intent and slot choices are conditionally
    /// independent by construction.
    pub fn step(&self, tokens: &Tensor) -> (EncodedAct, Tensor) {
        let (intent_dist, slot_dist) = self.distributions(tokens);
        let intent = intent_dist.sample();
        let slots = slot_dist.sample();
        let log_prob = self.joint_log_prob(&intent_dist, &slot_dist, &intent, &slots);
        let action = EncodedAct {
            intent: i64::from(&intent),
            slots: Array1::from_vec(Vec::<f32>::from(&slots.squeeze_dim(0))),
        };
        (action, log_prob)
    }

    /// Log-probability of an externally fixed action.
    ///
    /// Used to score actions taken under a previous version of the policy.
    pub fn log_probs(&self, tokens: &Tensor, action: &EncodedAct) -> Tensor {
        let (intent_dist, slot_dist) = self.distributions(tokens);
        let device = tokens.device();
        let intent = Tensor::of_slice(&[action.intent]).to_device(device);
        let slots = Tensor::of_slice(action.slots.as_slice().expect("contiguous slot vector"))
            .unsqueeze(0)
            .to_device(device);
        self.joint_log_prob(&intent_dist, &slot_dist, &intent, &slots)
    }

    fn distributions(&self, tokens: &Tensor) -> (Categorical, Bernoulli) {
        let (intent_probs, slot_probs) = self.forward(tokens);
        (
            Categorical::from_probs(&intent_probs),
            Bernoulli::from_probs(slot_probs),
        )
    }

    fn joint_log_prob(
        &self,
        intent_dist: &Categorical,
        slot_dist: &Bernoulli,
        intent: &Tensor,
        slots: &Tensor,
    ) -> Tensor {
        intent_dist.log_probs(intent).sum(Kind::Float)
            + slot_dist.log_probs(slots).sum(Kind::Float)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    const VOCAB: i64 = 50;
    const INTENTS: i64 = 5;
    const SLOTS: i64 = 4;

    #[fixture]
    fn network() -> (nn::VarStore, PolicyNetwork) {
        let vs = nn::VarStore::new(Device::Cpu);
        let network = PolicyNetConfig::default().build(&vs.root(), VOCAB, INTENTS, SLOTS);
        (vs, network)
    }

    #[rstest]
    fn forward_output_validity(network: (nn::VarStore, PolicyNetwork)) {
        let (_vs, network) = network;
        let input = network.input(&[2, 3, 5, 7, 11, 13], Device::Cpu);
        let (intent_probs, slot_probs) = network.forward(&input);
        assert_eq!(intent_probs.size(), [1, INTENTS]);
        assert_eq!(slot_probs.size(), [1, SLOTS]);

        let total = f32::from(&intent_probs.sum(Kind::Float));
        assert!((total - 1.0).abs() < 1e-5);

        let slot_values = Vec::<f32>::from(&slot_probs.squeeze_dim(0));
        assert!(slot_values.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[rstest]
    fn empty_sequence_is_padded(network: (nn::VarStore, PolicyNetwork)) {
        let (_vs, network) = network;
        let input = network.input(&[], Device::Cpu);
        assert_eq!(input.size(), [1, 17]);
        let (intent_probs, _) = network.forward(&input);
        assert_eq!(intent_probs.size(), [1, INTENTS]);
    }

    #[rstest]
    fn step_log_prob_matches_rescoring(network: (nn::VarStore, PolicyNetwork)) {
        let (_vs, network) = network;
        let input = network.input(&[4, 8, 15, 16, 23, 42], Device::Cpu);
        let (action, log_prob) = network.step(&input);
        let rescored = network.log_probs(&input, &action);
        assert!(log_prob.allclose(&rescored, 1e-5, 1e-8, false));
        assert!((0..INTENTS).contains(&action.intent));
    }

    #[rstest]
    fn long_sequences_are_not_padded(network: (nn::VarStore, PolicyNetwork)) {
        let (_vs, network) = network;
        let ids: Vec<i64> = (0..30).collect();
        assert_eq!(network.input(&ids, Device::Cpu).size(), [1, 30]);
    }
}
