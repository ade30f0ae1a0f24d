//! Probability distributions over tensors
use once_cell::sync::OnceCell;
use tch::{Kind, Reduction, Tensor};

/// Clamp float values to be >= the smallest finite float value.
fn clamp_float_min(x: &Tensor) -> Result<Tensor, Kind> {
    match x.kind() {
        Kind::Float => Ok(x.clamp_min(f64::from(f32::MIN))),
        Kind::Double => Ok(x.clamp_min(f64::MIN)),
        kind => Err(kind),
    }
}

/// Categorical distribution(s) over a final event dimension.
#[derive(Debug)]
pub struct Categorical {
    /// Log probability of each event.
    ///
    /// A float tensor of shape `[BATCH_SHAPE.., NUM_EVENTS]`.
    log_probs: Tensor,
}

impl Categorical {
    /// Initialize from normalized probabilities.
    ///
    /// Zero probabilities are clamped to the smallest finite log value so
    /// that entropies stay finite.
    #[must_use]
    pub fn from_probs(probs: &Tensor) -> Self {
        Self {
            log_probs: clamp_float_min(&probs.log())
                .map_err(|kind| format!("probabilities must be f32 or f64, not {:?}", kind))
                .unwrap(),
        }
    }

    /// Sample event indices; an i64 tensor of shape `[BATCH_SHAPE..]`.
    #[must_use]
    pub fn sample(&self) -> Tensor {
        self.log_probs.exp().multinomial(1, true).squeeze_dim(-1)
    }

    /// Log probabilities of the given event indices.
    #[must_use]
    pub fn log_probs(&self, elements: &Tensor) -> Tensor {
        self.log_probs
            .gather(-1, &elements.unsqueeze(-1), false)
            .squeeze_dim(-1)
    }

    #[must_use]
    pub fn entropy(&self) -> Tensor {
        -(&self.log_probs * self.log_probs.exp()).sum_dim_intlist(&[-1], false, Kind::Float)
    }
}

/// Independent Bernoulli distribution(s).
pub struct Bernoulli {
    /// Success probabilities; a float tensor of shape `[BATCH_SHAPE..]`.
    probs: Tensor,
    /// Cached clamped probabilities for log computations.
    clamped: OnceCell<Tensor>,
}

impl Bernoulli {
    /// Initialize from probabilities in `[0, 1]`.
    #[must_use]
    pub fn from_probs(probs: Tensor) -> Self {
        Self {
            probs,
            clamped: OnceCell::new(),
        }
    }

    fn clamped(&self) -> &Tensor {
        self.clamped
            .get_or_init(|| self.probs.clamp(f64::from(f32::MIN_POSITIVE), 1.0))
    }

    /// Sample; a float tensor of zeros and ones with the batch shape.
    #[must_use]
    pub fn sample(&self) -> Tensor {
        self.probs.bernoulli()
    }

    /// Per-element log probabilities of the given 0/1 elements.
    #[must_use]
    pub fn log_probs(&self, elements: &Tensor) -> Tensor {
        let log_probs = -self.clamped().binary_cross_entropy::<&Tensor>(
            &elements.to_kind(self.probs.kind()),
            None,
            Reduction::None,
        );
        clamp_float_min(&log_probs)
            .map_err(|kind| format!("probabilities must be f32 or f64, not {:?}", kind))
            .unwrap()
    }

    /// Per-element entropies.
    #[must_use]
    pub fn entropy(&self) -> Tensor {
        self.clamped()
            .binary_cross_entropy::<&Tensor>(&self.probs, None, Reduction::None)
    }
}
