//! Generalized advantage estimation
//!
//! # Reference
//! High-Dimensional Continuous Control Using Generalized Advantage
//! Estimation. ICLR 2016.
//! by John Schulman, Philipp Moritz, Sergey Levine, Michael I. Jordan,
//! Pieter Abbeel <https://arxiv.org/pdf/1506.02438.pdf>
use tch::{Kind, Tensor};

/// Advantages for a gathered rollout.
///
/// Inputs are time-major with one leading bootstrap row: shape
/// `[num_rollout_steps + 1, NUM_ENVS]`. Iterating backward from the last
/// gathered step, the one-step TD residual is
/// `delta_i = r_{i+1} + discount * v_{i+1} * (1 - done_{i+1}) - v_i`
/// and the advantage
/// `a_i = delta_i + discount * lambda * a_{i+1} * (1 - done_{i+1})`,
/// with the advantage past the horizon taken as 0.
///
/// # Panics
/// If `values` does not hold `1 + num_rollout_steps` rows.
#[allow(clippy::cast_possible_truncation)]
pub fn generalized_advantage_estimation(
    rewards: &Tensor,
    values: &Tensor,
    dones: &Tensor,
    num_rollout_steps: usize,
    discount: f64,
    gae_lambda: f64,
) -> Tensor {
    assert_eq!(
        values.size()[0],
        1 + num_rollout_steps as i64,
        "values must hold one bootstrap row plus one row per rollout step"
    );
    let num_envs = rewards.size()[1];
    let advantages = Tensor::zeros(
        &[num_rollout_steps as i64, num_envs],
        (Kind::Float, rewards.device()),
    );
    let mut next_advantage = Tensor::zeros(&[num_envs], (Kind::Float, rewards.device()));

    for i in (0..num_rollout_steps as i64).rev() {
        let not_done = Tensor::from(1.0) - dones.get(i + 1).to_kind(Kind::Float);
        let residual =
            rewards.get(i + 1) + values.get(i + 1) * &not_done * discount - values.get(i);
        let advantage = residual + &next_advantage * &not_done * (discount * gae_lambda);
        advantages.get(i).copy_(&advantage);
        next_advantage = advantage;
    }
    advantages
}

/// Flatten a time-major `[TIME, NUM_ENVS, ..]` tensor to env-major
/// `[TIME * NUM_ENVS, ..]`.
///
/// Each environment's own trajectory stays contiguous: for
/// `[[a, b], [c, d]]` the result is `[a, c, b, d]`.
#[must_use]
pub fn flatten_time_env(tensor: &Tensor) -> Tensor {
    let size = tensor.size();
    let mut flat_size = vec![size[0] * size[1]];
    flat_size.extend_from_slice(&size[2..]);
    tensor.transpose(0, 1).reshape(&flat_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_step_rollout_reduces_to_the_td_error() {
        // done all zero, one rollout step: a_0 = r_1 + discount * v_1 - v_0
        let discount = 0.9;
        let rewards = Tensor::of_slice(&[0.0_f32, 2.0]).reshape(&[2, 1]);
        let values = Tensor::of_slice(&[1.0_f32, 3.0]).reshape(&[2, 1]);
        let dones = Tensor::of_slice(&[0_i64, 0]).reshape(&[2, 1]);

        let advantages =
            generalized_advantage_estimation(&rewards, &values, &dones, 1, discount, 0.95);

        assert_eq!(advantages.size(), [1, 1]);
        let expected = 2.0 + discount * 3.0 - 1.0;
        assert!((advantages.double_value(&[0, 0]) - expected).abs() < 1e-6);
    }

    #[test]
    fn terminal_steps_cut_the_recursion() {
        let discount = 0.9;
        let gae_lambda = 0.95;
        let rewards = Tensor::of_slice(&[0.0_f32, 1.0, 2.0]).reshape(&[3, 1]);
        let values = Tensor::of_slice(&[0.5_f32, 1.5, 2.5]).reshape(&[3, 1]);
        let dones = Tensor::of_slice(&[0_i64, 1, 0]).reshape(&[3, 1]);

        let advantages =
            generalized_advantage_estimation(&rewards, &values, &dones, 2, discount, gae_lambda);

        // Step 1 is unaffected by the done flag at step 1 (masks apply to i+1).
        let a_1 = 2.0 + discount * 2.5 - 1.5;
        assert!((advantages.double_value(&[1, 0]) - a_1).abs() < 1e-6);
        // Step 0 sees done_1 = 1: both the bootstrap value and the
        // accumulated advantage are masked out.
        let a_0 = 1.0 - 0.5;
        assert!((advantages.double_value(&[0, 0]) - a_0).abs() < 1e-6);
    }

    #[test]
    #[should_panic(expected = "bootstrap row")]
    fn value_shape_mismatch_is_a_contract_violation() {
        let rewards = Tensor::of_slice(&[0.0_f32, 1.0]).reshape(&[2, 1]);
        let values = Tensor::of_slice(&[0.0_f32, 1.0]).reshape(&[2, 1]);
        let dones = Tensor::of_slice(&[0_i64, 0]).reshape(&[2, 1]);
        let _ = generalized_advantage_estimation(&rewards, &values, &dones, 2, 0.99, 0.95);
    }

    #[test]
    fn flatten_keeps_trajectories_contiguous() {
        // [[a, b], [c, d]] -> [a, c, b, d]
        let tensor = Tensor::of_slice(&[1.0_f32, 2.0, 3.0, 4.0]).reshape(&[2, 2]);
        let flat = flatten_time_env(&tensor);
        assert_eq!(Vec::<f32>::from(&flat), [1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn flatten_preserves_trailing_dimensions() {
        let tensor = Tensor::arange(12_i64, (Kind::Float, tch::Device::Cpu)).reshape(&[2, 3, 2]);
        let flat = flatten_time_env(&tensor);
        assert_eq!(flat.size(), [6, 2]);
        // First two rows are env 0's two timesteps.
        assert_eq!(Vec::<f32>::from(&flat.get(0)), [0.0, 1.0]);
        assert_eq!(Vec::<f32>::from(&flat.get(1)), [6.0, 7.0]);
    }
}
