//! Tensor-backed network components
pub mod distributions;
pub mod network;
pub mod optimizers;

pub use network::{PolicyNetConfig, PolicyNetwork};
pub use optimizers::{
    AdamConfig, BaseOptimizer, OnceOptimizer, Optimizer, OptimizerBuilder, SgdConfig,
};
