//! Torch optimizer wrappers and configuration
use serde::{Deserialize, Serialize};
use std::convert::{TryFrom, TryInto};
use tch::{nn::VarStore, COptimizer, TchError, Tensor};
use thiserror::Error;

/// Base optimizer interface
pub trait BaseOptimizer {
    /// Zero out the gradients of all optimized tensors
    fn zero_grad(&mut self);
}

/// Optimizer that minimizes a loss function.
pub trait Optimizer: BaseOptimizer {
    /// Perform a loss minimization step using the gradient of a loss function.
    ///
    /// Obtains gradients by backpropagating the result of `loss_fn`,
    /// which is evaluated once.
    ///
    /// # Returns
    /// The value of `loss_fn` on success.
    fn backward_step(
        &mut self,
        loss_fn: &dyn Fn() -> Tensor,
    ) -> Result<Tensor, OptimizerStepError>;
}

/// Optimizer that minimizes a loss tensor using a single gradient evaluation
/// per step.
pub trait OnceOptimizer: BaseOptimizer {
    /// Perform a parameter update from the gradients currently stored on the
    /// parameter tensors.
    fn step_once(&self) -> Result<(), OptimizerStepError>;

    /// Zero gradients, backpropagate `loss`, and perform an update step.
    fn backward_step_once(&mut self, loss: &Tensor) -> Result<(), OptimizerStepError>;
}

impl<T: OnceOptimizer> Optimizer for T {
    fn backward_step(
        &mut self,
        loss_fn: &dyn Fn() -> Tensor,
    ) -> Result<Tensor, OptimizerStepError> {
        let loss = loss_fn();
        self.backward_step_once(&loss)?;
        Ok(loss)
    }
}

impl BaseOptimizer for COptimizer {
    fn zero_grad(&mut self) {
        COptimizer::zero_grad(self).expect("failed to zero gradients");
    }
}

impl OnceOptimizer for COptimizer {
    fn step_once(&self) -> Result<(), OptimizerStepError> {
        COptimizer::step(self).expect("optimizer step failed");
        Ok(())
    }

    fn backward_step_once(&mut self, loss: &Tensor) -> Result<(), OptimizerStepError> {
        let loss_value = loss.double_value(&[]);
        if !loss_value.is_finite() {
            // COptimizer would propagate the non-finite gradients into the
            // parameters; refuse the step instead.
            return Err(OptimizerStepError::NonFiniteLoss { loss: loss_value });
        }
        BaseOptimizer::zero_grad(self);
        loss.backward();
        self.step_once()
    }
}

/// Build an optimizer over the trainable variables of a [`VarStore`].
pub trait OptimizerBuilder<O> {
    type Error;

    fn build_optimizer(&self, vs: &VarStore) -> Result<O, Self::Error>;
}

impl<T> OptimizerBuilder<COptimizer> for T
where
    for<'a> &'a T: TryInto<COptimizer, Error = TchError>,
{
    type Error = TchError;

    fn build_optimizer(&self, vs: &VarStore) -> Result<COptimizer, TchError> {
        let mut optimizer: COptimizer = self.try_into()?;
        for tensor in vs.trainable_variables() {
            optimizer.add_parameters(&tensor, 0)?;
        }
        Ok(optimizer)
    }
}

/// Configuration for the SGD optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SgdConfig {
    /// Learning rate
    pub learning_rate: f64,
    /// Momentum
    pub momentum: f64,
    /// Weight decay (L2 penalty)
    pub weight_decay: f64,
    /// Dampening for momentum
    pub dampening: f64,
    /// Enables Nesterov momentum
    pub nesterov: bool,
}

impl Default for SgdConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-2,
            momentum: 0.0,
            weight_decay: 0.0,
            dampening: 0.0,
            nesterov: false,
        }
    }
}

impl TryFrom<&SgdConfig> for COptimizer {
    type Error = TchError;
    fn try_from(config: &SgdConfig) -> Result<Self, Self::Error> {
        Self::sgd(
            config.learning_rate,
            config.momentum,
            config.dampening,
            config.weight_decay,
            config.nesterov,
        )
    }
}

/// Configuration for the Adam optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdamConfig {
    /// Learning rate
    pub learning_rate: f64,
    /// Coefficient for the running average of the gradient
    pub beta1: f64,
    /// Coefficient for the running average of the square of the gradient
    pub beta2: f64,
    /// Weight decay (L2 penalty)
    pub weight_decay: f64,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-2,
            beta1: 0.9,
            beta2: 0.999,
            weight_decay: 0.0,
        }
    }
}

impl TryFrom<&AdamConfig> for COptimizer {
    type Error = TchError;
    fn try_from(config: &AdamConfig) -> Result<Self, Self::Error> {
        Self::adam(
            config.learning_rate,
            config.beta1,
            config.beta2,
            config.weight_decay,
        )
    }
}

/// Error performing an optimization step.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum OptimizerStepError {
    #[error("loss is not finite: {loss}")]
    NonFiniteLoss { loss: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{nn, Device, Kind};

    fn optimize_quadratic<C>(config: &C) -> f64
    where
        C: OptimizerBuilder<COptimizer, Error = TchError>,
    {
        let vs = VarStore::new(Device::Cpu);
        let x = vs.root().var("x", &[1], nn::Init::Const(2.0));
        let mut optimizer = config.build_optimizer(&vs).unwrap();
        for _ in 0..200 {
            let loss_fn = || (&x * &x).sum(Kind::Float);
            optimizer.backward_step(&loss_fn).unwrap();
        }
        f64::from(&x.abs().sum(Kind::Float))
    }

    #[test]
    fn adam_minimizes_a_quadratic() {
        assert!(optimize_quadratic(&AdamConfig::default()) < 0.1);
    }

    #[test]
    fn sgd_minimizes_a_quadratic() {
        let config = SgdConfig {
            learning_rate: 0.1,
            ..SgdConfig::default()
        };
        assert!(optimize_quadratic(&config) < 0.1);
    }

    #[test]
    fn non_finite_loss_is_rejected() {
        let vs = VarStore::new(Device::Cpu);
        let x = vs.root().var("x", &[1], nn::Init::Const(2.0));
        let mut optimizer = AdamConfig::default().build_optimizer(&vs).unwrap();
        let loss_fn = || (&x * f64::NAN).sum(Kind::Float);
        assert!(matches!(
            optimizer.backward_step(&loss_fn),
            Err(OptimizerStepError::NonFiniteLoss { .. })
        ));
    }
}
